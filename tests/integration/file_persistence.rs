//! Integration test: file-backed stores across restarts.
//!
//! Verifies that the persisted M2 accumulator lets a restarted engine
//! continue exactly where an uninterrupted one would be.

use actor_continuity::storage::{HistoryLog, StateStore};
use actor_continuity::{
    ActivityEvent, ContinuityEngine, EngineConfig, FileActivityLog, FileHistoryLog,
    FileStateStore, InMemoryHistoryLog, InMemoryStateStore,
};

const T0: f64 = 1_699_999_200.0;

fn batch(seed: usize) -> Vec<ActivityEvent> {
    let actions = ["view", "search", "analyze", "buy"];
    let entities = ["a", "b", "c", "d", "e", "f"];
    (0..40)
        .map(|i| {
            let k = i * (seed + 1) + seed;
            ActivityEvent::on_entity(
                T0 + seed as f64 * 7_200.0 + i as f64 * (20.0 + seed as f64),
                actions[k % actions.len()],
                entities[(k / 2) % entities.len()],
            )
        })
        .collect()
}

fn file_engine(root: &std::path::Path) -> ContinuityEngine<FileStateStore, FileHistoryLog> {
    ContinuityEngine::new(
        EngineConfig::default(),
        FileStateStore::new(root.join("state")).unwrap(),
        FileHistoryLog::new(root.join("history")).unwrap(),
    )
    .unwrap()
}

#[test]
fn restart_resumes_bit_identical_baseline() {
    let dir = tempfile::tempdir().unwrap();

    let reference = ContinuityEngine::new(
        EngineConfig::default(),
        InMemoryStateStore::new(),
        InMemoryHistoryLog::new(),
    )
    .unwrap();

    let mut expected = Vec::new();
    for seed in 0..6 {
        let now = T0 + seed as f64 * 7_200.0 + 3_000.0;
        expected.push(reference.evaluate("alice", &batch(seed), now).unwrap());
    }

    // Three evaluations, restart, three more.
    let mut actual = Vec::new();
    {
        let engine = file_engine(dir.path());
        for seed in 0..3 {
            let now = T0 + seed as f64 * 7_200.0 + 3_000.0;
            actual.push(engine.evaluate("alice", &batch(seed), now).unwrap());
        }
    }
    {
        let engine = file_engine(dir.path());
        for seed in 3..6 {
            let now = T0 + seed as f64 * 7_200.0 + 3_000.0;
            actual.push(engine.evaluate("alice", &batch(seed), now).unwrap());
        }

        let on_disk = engine.states().load("alice").unwrap().unwrap();
        let in_memory = reference.states().load("alice").unwrap().unwrap();
        assert_eq!(on_disk.state, in_memory.state);
        assert_eq!(on_disk.revision, 6);
        assert_eq!(engine.history().list("alice").unwrap().len(), 6);
    }

    assert_eq!(actual, expected);
}

#[test]
fn activity_log_drives_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(dir.path());
    let activity = FileActivityLog::new(dir.path().join("activity")).unwrap();

    for event in batch(1) {
        activity.record("bob", &event).unwrap();
    }

    let result = engine
        .evaluate_recent("bob", &activity, T0 + 10_000.0)
        .unwrap();
    assert_eq!(result.sample_count, 1);

    let direct = ContinuityEngine::new(
        EngineConfig::default(),
        InMemoryStateStore::new(),
        InMemoryHistoryLog::new(),
    )
    .unwrap()
    .evaluate("bob", &batch(1), T0 + 10_000.0)
    .unwrap();
    assert_eq!(result, direct);

    let state = engine.states().load("bob").unwrap().unwrap().state;
    assert_eq!(state.last_seen_at, T0 + 10_000.0);
}

#[test]
fn state_file_with_foreign_shape_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(dir.path());
    engine.evaluate("carol", &batch(0), T0 + 3_000.0).unwrap();

    // Simulate a feature-set schema change: an extra dimension on disk.
    let path = dir.path().join("state").join("carol.json");
    let mut value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    value["state"]["baseline_vector"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!(0.0));
    value["state"]["baseline_variance_accumulator"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!(0.0));
    std::fs::write(&path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();

    let err = engine
        .evaluate("carol", &batch(1), T0 + 12_000.0)
        .unwrap_err();
    assert!(err.to_string().contains("Dimension mismatch"));
    assert_eq!(engine.history().list("carol").unwrap().len(), 1);
}
