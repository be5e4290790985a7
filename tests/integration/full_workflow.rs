//! Integration test: full continuity workflow.
//!
//! Tests the complete lifecycle: record activity → establish baseline →
//! reinforce with matching behavior → detect divergent behavior, with the
//! recent-activity feed feeding the engine the way a hosting service would.

use actor_continuity::storage::{ActivitySource, HistoryLog, StateStore};
use actor_continuity::{
    ActivityEvent, ContinuityEngine, ContinuityLabel, EngineConfig, InMemoryActivityLog,
    InMemoryHistoryLog, InMemoryStateStore,
};

/// 2023-11-14T22:00:00Z — hour aligned so every batch stays inside one hour.
const T0: f64 = 1_699_999_200.0;
const SPACING: f64 = 30.0;

const ENTITIES: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN"];
const ACTIONS: [&str; 3] = ["view", "search", "analyze"];

type Engine = ContinuityEngine<InMemoryStateStore, InMemoryHistoryLog>;

fn engine(window: usize) -> Engine {
    ContinuityEngine::new(
        EngineConfig::default().with_max_events(window),
        InMemoryStateStore::new(),
        InMemoryHistoryLog::new(),
    )
    .unwrap()
}

/// Record `count` homogeneous events starting at sequence number `from`.
fn track_normal(log: &InMemoryActivityLog, subject: &str, from: usize, count: usize) {
    for i in from..from + count {
        log.record(
            subject,
            ActivityEvent::on_entity(
                T0 + i as f64 * SPACING,
                ACTIONS[i % ACTIONS.len()],
                ENTITIES[i % ENTITIES.len()],
            ),
        )
        .unwrap();
    }
}

/// Record `count` events on never-seen entities and actions.
fn track_novel(log: &InMemoryActivityLog, subject: &str, from: usize, count: usize) {
    let entities = ["UNUSUAL1", "UNUSUAL2", "UNUSUAL3"];
    let actions = ["export_data", "delete"];
    for (k, i) in (from..from + count).enumerate() {
        log.record(
            subject,
            ActivityEvent::on_entity(
                T0 + i as f64 * SPACING,
                actions[k % actions.len()],
                entities[k % entities.len()],
            ),
        )
        .unwrap();
    }
}

/// With a 50-event window each evaluation sees exactly the latest batch,
/// so the two homogeneous batches produce identical feature vectors and
/// the second distance is zero. With the default 100-event window the
/// second evaluation sees a different mix against a zero-variance baseline;
/// see `default_window_second_observation_is_epsilon_dominated`.
#[test]
fn baseline_reinforcement_then_divergence() {
    let subject = "test_user_continuity_001";
    let engine = engine(50);
    let activity = InMemoryActivityLog::new();

    // ── 1. Baseline establishment ────────────────────────────────────────────
    track_normal(&activity, subject, 0, 50);
    let first = engine
        .evaluate_recent(subject, &activity, T0 + 1_500.0)
        .unwrap();

    assert!(matches!(
        first.state,
        ContinuityLabel::Learning | ContinuityLabel::Stable
    ));
    assert!((0.0..=1.0).contains(&first.score));
    assert_eq!(first.sample_count, 1);

    // ── 2. Consistent behavior ───────────────────────────────────────────────
    track_normal(&activity, subject, 50, 50);
    let second = engine
        .evaluate_recent(subject, &activity, T0 + 3_000.0)
        .unwrap();

    assert!(second.confidence > first.confidence);
    assert!(second.sample_count > first.sample_count);
    assert!((0.0..=1.0).contains(&second.score));

    // ── 3. Divergent behavior ────────────────────────────────────────────────
    track_novel(&activity, subject, 100, 20);
    let third = engine
        .evaluate_recent(subject, &activity, T0 + 3_600.0)
        .unwrap();

    assert!(
        third.distance > second.distance,
        "distance should increase: {} -> {}",
        second.distance,
        third.distance
    );
    assert!(third.score < second.score);
    assert_eq!(third.sample_count, 3);

    // ── Audit trail ──────────────────────────────────────────────────────────
    let rows = engine.history().list(subject).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].distance, third.distance);
    assert_eq!(rows[2].state, third.state);
    assert!(rows.iter().all(|r| r.subject_id == subject));
}

#[test]
fn sustained_matching_behavior_becomes_stable_then_diverges() {
    let subject = "steady";
    let engine = engine(100);
    let activity = InMemoryActivityLog::new();
    track_normal(&activity, subject, 0, 60);

    let mut now = T0 + 2_000.0;
    let mut last = None;
    for _ in 0..12 {
        last = Some(engine.evaluate_recent(subject, &activity, now).unwrap());
        now += 60.0;
    }
    let steady = last.unwrap();
    assert_eq!(steady.sample_count, 12);
    assert_eq!(steady.distance, 0.0);
    assert_eq!(steady.state, ContinuityLabel::Stable);

    // Takeover: the most recent window is dominated by novel behavior.
    track_novel(&activity, subject, 60, 40);
    let takeover = engine.evaluate_recent(subject, &activity, now).unwrap();
    assert!(takeover.distance > 1.0);
    assert_eq!(takeover.state, ContinuityLabel::Diverging);
    assert!(takeover.confidence > steady.confidence);
}

#[test]
fn short_feed_is_neutral_and_leaves_no_trace() {
    let engine = engine(100);
    let activity = InMemoryActivityLog::new();
    activity
        .record("newcomer", ActivityEvent::new(T0, "login", None))
        .unwrap();

    let result = engine
        .evaluate_recent("newcomer", &activity, T0 + 10.0)
        .unwrap();
    assert_eq!(result.score, 1.0);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.state, ContinuityLabel::Learning);
    assert_eq!(result.distance, 0.0);
    assert_eq!(result.sample_count, 1);

    assert!(engine.states().load("newcomer").unwrap().is_none());
    assert!(engine.history().list("newcomer").unwrap().is_empty());
}

#[test]
fn elapsed_time_lowers_identical_observation() {
    let events = {
        let log = InMemoryActivityLog::new();
        track_normal(&log, "s", 0, 40);
        log.recent("s", 100).unwrap()
    };

    let immediate = engine(100);
    immediate.evaluate("s", &events, T0).unwrap();
    let immediate = immediate.evaluate("s", &events, T0).unwrap();

    let delayed = engine(100);
    delayed.evaluate("s", &events, T0).unwrap();
    let delayed = delayed.evaluate("s", &events, T0 + 30.0 * 86_400.0).unwrap();

    assert!(immediate.score >= delayed.score);
    assert_eq!(immediate.score, 1.0);
}

#[test]
fn subjects_do_not_share_baselines() {
    let engine = engine(100);
    let activity = InMemoryActivityLog::new();
    track_normal(&activity, "alice", 0, 30);
    track_novel(&activity, "bob", 0, 30);

    engine.evaluate_recent("alice", &activity, T0 + 900.0).unwrap();
    engine.evaluate_recent("bob", &activity, T0 + 900.0).unwrap();

    let alice = engine.states().load("alice").unwrap().unwrap().state;
    let bob = engine.states().load("bob").unwrap().unwrap().state;
    assert_ne!(alice.baseline_vector, bob.baseline_vector);
    assert_eq!(alice.sample_count, 1);
    assert_eq!(bob.sample_count, 1);
}

#[test]
fn default_window_second_observation_is_epsilon_dominated() {
    let subject = "default_window";
    let engine = ContinuityEngine::new(
        EngineConfig::default(),
        InMemoryStateStore::new(),
        InMemoryHistoryLog::new(),
    )
    .unwrap();
    let activity = InMemoryActivityLog::new();

    track_normal(&activity, subject, 0, 50);
    let first = engine
        .evaluate_recent(subject, &activity, T0 + 1_500.0)
        .unwrap();
    assert_eq!(first.distance, 0.0);

    // 100 events now in the window: a different vector than the 50-event
    // baseline, measured with zero variance, so ε sets the scale.
    track_normal(&activity, subject, 50, 50);
    let second = engine
        .evaluate_recent(subject, &activity, T0 + 3_000.0)
        .unwrap();
    assert!(second.distance > 1.0e5, "distance {}", second.distance);

    // Once variance exists, the novel tail is large but finite in σ units.
    track_novel(&activity, subject, 100, 20);
    let third = engine
        .evaluate_recent(subject, &activity, T0 + 3_600.0)
        .unwrap();
    assert!(third.distance > 1.0);
    assert!(third.distance < second.distance);

    for result in [first, second, third] {
        assert_eq!(result.state, ContinuityLabel::Learning);
        assert!((0.0..=1.0).contains(&result.score));
    }
}
