//! Data structures for behavioral continuity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ContinuityError, Result};
use crate::features::{FeatureVector, FEATURE_DIM};
use crate::stats::Baseline;

// ---------------------------------------------------------------------------
// Invariant State
// ---------------------------------------------------------------------------

/// Durable per-subject baseline and last continuity reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantState {
    pub subject_id: String,
    pub created_at: f64,
    pub last_seen_at: f64,

    /// Running mean (μ).
    pub baseline_vector: Vec<f64>,
    /// Welford M2 accumulator. Variance is `M2 / n`.
    pub baseline_variance_accumulator: Vec<f64>,
    pub sample_count: u64,

    pub continuity_score: f64,
    pub continuity_confidence: f64,

    // Reserved; carried through storage but never computed here.
    #[serde(default)]
    pub divergence_accumulated: f64,
    #[serde(default)]
    pub divergence_velocity: f64,
    #[serde(default)]
    pub divergence_mode: Option<DivergenceMode>,
}

impl InvariantState {
    /// Fresh state for a subject seen for the first time at `now`.
    pub fn new(subject_id: impl Into<String>, now: f64) -> Self {
        Self {
            subject_id: subject_id.into(),
            created_at: now,
            last_seen_at: now,
            baseline_vector: vec![0.0; FEATURE_DIM],
            baseline_variance_accumulator: vec![0.0; FEATURE_DIM],
            sample_count: 0,
            continuity_score: 1.0,
            continuity_confidence: 0.0,
            divergence_accumulated: 0.0,
            divergence_velocity: 0.0,
            divergence_mode: None,
        }
    }

    /// Rebuild the working baseline, checking the persisted shape.
    pub fn baseline(&self) -> Result<Baseline> {
        if let Some(bad) = self
            .baseline_variance_accumulator
            .iter()
            .find(|m| !(m.is_finite() && **m >= 0.0))
        {
            return Err(ContinuityError::CorruptState {
                subject_id: self.subject_id.clone(),
                reason: format!("M2 component {bad} is negative or non-finite"),
            });
        }
        if self.baseline_vector.iter().any(|m| !m.is_finite()) {
            return Err(ContinuityError::CorruptState {
                subject_id: self.subject_id.clone(),
                reason: "baseline mean contains a non-finite component".into(),
            });
        }
        Baseline::from_parts(
            &self.baseline_vector,
            &self.baseline_variance_accumulator,
            self.sample_count,
        )
    }

    /// Write a baseline back into the persisted fields.
    pub fn store_baseline(&mut self, baseline: &Baseline) {
        self.baseline_vector = baseline.mean().to_vec();
        self.baseline_variance_accumulator = baseline.m2().to_vec();
        self.sample_count = baseline.count();
    }

    /// Per-feature variance derived from M2.
    pub fn variance(&self) -> Result<FeatureVector> {
        Ok(self.baseline()?.variance())
    }
}

/// Divergence classification slot. Not populated by the evaluation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceMode {
    Shock,
    Creep,
    Fracture,
}

// ---------------------------------------------------------------------------
// Classification label
// ---------------------------------------------------------------------------

/// Discrete continuity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContinuityLabel {
    Learning,
    Stable,
    Drifting,
    Diverging,
}

impl ContinuityLabel {
    /// Return a stable string tag.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::Learning => "learning",
            Self::Stable => "stable",
            Self::Drifting => "drifting",
            Self::Diverging => "diverging",
        }
    }
}

impl std::fmt::Display for ContinuityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Outcome of a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityResult {
    pub score: f64,
    pub confidence: f64,
    pub state: ContinuityLabel,
    pub sample_count: u64,
    pub distance: f64,
}

impl ContinuityResult {
    /// Neutral result for a window too short to measure.
    pub fn insufficient(event_count: usize) -> Self {
        Self {
            score: 1.0,
            confidence: 0.0,
            state: ContinuityLabel::Learning,
            sample_count: event_count as u64,
            distance: 0.0,
        }
    }
}

/// Full output of the pure evaluation core.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: ContinuityResult,
    /// Decay factor applied to this measurement.
    pub decay_factor: f64,
    /// Extracted features; `None` when the window was too short.
    pub features: Option<FeatureVector>,
}

impl Evaluation {
    /// Whether the baseline absorbed a new observation.
    pub fn baseline_updated(&self) -> bool {
        self.features.is_some()
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Unique identifier for a history row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryId(pub String);

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write-once audit record of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityHistory {
    pub id: HistoryId,
    pub subject_id: String,
    pub measured_at: f64,
    pub continuity_score: f64,
    pub confidence: f64,
    pub distance: f64,
    pub decay_factor: f64,
    pub sample_count: u64,
    pub state: ContinuityLabel,
}

impl ContinuityHistory {
    /// Build the audit row for an evaluation of `subject_id` at `measured_at`.
    pub fn record(subject_id: &str, measured_at: f64, evaluation: &Evaluation) -> Self {
        let result = &evaluation.result;

        let id_input = format!(
            "hist:{}:{}:{}",
            subject_id,
            result.sample_count,
            measured_at.to_bits()
        );
        let id_hash = Sha256::digest(id_input.as_bytes());
        let id_encoded = bs58::encode(&id_hash[..16]).into_string();

        Self {
            id: HistoryId(format!("chist_{id_encoded}")),
            subject_id: subject_id.to_string(),
            measured_at,
            continuity_score: result.score,
            confidence: result.confidence,
            distance: result.distance,
            decay_factor: evaluation.decay_factor,
            sample_count: result.sample_count,
            state: result.state,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
