//! Continuity engine — per-subject evaluation and persistence.
//!
//! [`evaluate_state`] is the pure core: features, distance against the
//! pre-update baseline, Welford update, decay, score, confidence and label,
//! all applied to an in-memory [`InvariantState`]. [`ContinuityEngine`]
//! wraps it with one state read, one revision-checked state write, and one
//! history append per call.

use std::borrow::Cow;

use crate::config::EngineConfig;
use crate::error::{ContinuityError, Result};
use crate::features::{extract_features, ActivityEvent, Feature, FeatureExtractor};
use crate::stats::{self, clamp_unit};
use crate::storage::{validate_subject_id, ActivitySource, HistoryLog, StateStore};

use super::classify::classify;
use super::types::*;

// ---------------------------------------------------------------------------
// Pure core
// ---------------------------------------------------------------------------

/// Evaluate `events` against `state`, updating it in place.
///
/// The window is the most recent `max_events` of `events` by timestamp,
/// whatever order they arrive in. With fewer than two events in it the
/// state is left untouched and the neutral result is returned. A stored
/// baseline of the wrong dimension, or a non-finite timestamp or `now`,
/// fails before anything is modified.
pub fn evaluate_state(
    config: &EngineConfig,
    state: &mut InvariantState,
    events: &[ActivityEvent],
    now: f64,
) -> Result<Evaluation> {
    let extractor = FeatureExtractor::new(config.session_gap_secs, config.max_events);
    let sorted = chronological(events);
    let window = extractor.window(&sorted);

    if window.len() < 2 {
        return Ok(Evaluation {
            result: ContinuityResult::insufficient(window.len()),
            decay_factor: 1.0,
            features: None,
        });
    }

    if !now.is_finite() {
        return Err(ContinuityError::InvalidEvent(format!(
            "evaluation time {now} is not finite"
        )));
    }
    if let Some(bad) = window.iter().find(|e| !e.timestamp.is_finite()) {
        return Err(ContinuityError::InvalidEvent(format!(
            "{} event at non-finite timestamp {}",
            bad.action, bad.timestamp
        )));
    }

    let mut baseline = state.baseline()?;
    let x = extract_features(window, config.session_gap_secs);
    if let Some(i) = x.iter().position(|v| !v.is_finite()) {
        return Err(ContinuityError::InvalidEvent(format!(
            "feature {} is {} for this window",
            Feature::ALL[i].as_tag(),
            x[i]
        )));
    }

    let distance = if baseline.count() > 0 {
        stats::distance(
            &x,
            baseline.mean(),
            &baseline.variance(),
            config.distance_epsilon,
        )
    } else {
        0.0
    };

    baseline.update(&x);

    let delta_t = (now - state.last_seen_at).max(0.0);
    let decay_factor = stats::temporal_decay(delta_t, config.decay_rate);
    let score = stats::continuity_score(distance, delta_t, config.decay_rate);
    let confidence = stats::confidence(baseline.count(), config.confidence_k);
    let label = classify(score, baseline.count(), &config.thresholds);

    state.store_baseline(&baseline);
    state.continuity_score = clamp_unit(score);
    state.continuity_confidence = clamp_unit(confidence);
    state.last_seen_at = now;

    Ok(Evaluation {
        result: ContinuityResult {
            score: state.continuity_score,
            confidence: state.continuity_confidence,
            state: label,
            sample_count: baseline.count(),
            distance,
        },
        decay_factor,
        features: Some(x),
    })
}

/// Borrow the window when already ordered, otherwise sort a copy.
fn chronological(events: &[ActivityEvent]) -> Cow<'_, [ActivityEvent]> {
    if events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
        Cow::Borrowed(events)
    } else {
        log::debug!("activity window out of order; sorting {} events", events.len());
        let mut sorted = events.to_vec();
        sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Cow::Owned(sorted)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Orchestrates evaluations over a state store and a history log.
///
/// The engine does not serialize concurrent calls for the same subject.
/// A racing write is rejected by the store's revision check and surfaces
/// as `ConcurrentModification`; wrap calls in
/// [`SubjectLocks`](crate::storage::SubjectLocks) to avoid it.
pub struct ContinuityEngine<S, H> {
    config: EngineConfig,
    states: S,
    history: H,
}

impl<S: StateStore, H: HistoryLog> ContinuityEngine<S, H> {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig, states: S, history: H) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            states,
            history,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn states(&self) -> &S {
        &self.states
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Evaluate `events` (oldest first) for `subject_id` at wall-clock `now`.
    pub fn evaluate(
        &self,
        subject_id: &str,
        events: &[ActivityEvent],
        now: f64,
    ) -> Result<ContinuityResult> {
        validate_subject_id(subject_id)?;

        let (mut state, revision) = match self.states.load(subject_id)? {
            Some(stored) => {
                if stored.state.subject_id != subject_id {
                    return Err(ContinuityError::CorruptState {
                        subject_id: subject_id.to_string(),
                        reason: format!("store returned state for {:?}", stored.state.subject_id),
                    });
                }
                (stored.state, Some(stored.revision))
            }
            None => (InvariantState::new(subject_id, now), None),
        };

        let evaluation = evaluate_state(&self.config, &mut state, events, now)?;

        if !evaluation.baseline_updated() {
            log::debug!(
                "subject {subject_id}: {} event(s) is too few to measure; baseline unchanged",
                events.len()
            );
            return Ok(evaluation.result);
        }

        if revision.is_none() {
            log::info!("subject {subject_id}: creating behavioral baseline");
        }

        if let Err(e) = self.states.save(&state, revision) {
            if matches!(e, ContinuityError::ConcurrentModification { .. }) {
                log::warn!("subject {subject_id}: state write rejected: {e}");
            }
            return Err(e);
        }

        self.history
            .append(&ContinuityHistory::record(subject_id, now, &evaluation))?;

        let result = evaluation.result;
        log::debug!(
            "subject {subject_id}: score={:.4} confidence={:.4} distance={:.4} n={} state={}",
            result.score,
            result.confidence,
            result.distance,
            result.sample_count,
            result.state
        );
        Ok(result)
    }

    /// Fetch the most recent `max_events` from `source` and evaluate them.
    pub fn evaluate_recent<A: ActivitySource + ?Sized>(
        &self,
        subject_id: &str,
        source: &A,
        now: f64,
    ) -> Result<ContinuityResult> {
        validate_subject_id(subject_id)?;
        let events = source.recent(subject_id, self.config.max_events)?;
        self.evaluate(subject_id, &events, now)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
