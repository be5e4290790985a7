//! Engine configuration.
//!
//! Every tunable constant of the continuity pipeline lives in
//! [`EngineConfig`]. Defaults reproduce the reference behavior exactly;
//! a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ContinuityError, Result};

/// Default temporal decay rate (λ, per second). Half-life ≈ 1.9 hours.
pub const DEFAULT_DECAY_RATE: f64 = 0.0001;

/// Samples needed for ~63% confidence.
pub const DEFAULT_CONFIDENCE_K: f64 = 50.0;

/// Variance floor used by the distance scorer.
pub const DEFAULT_DISTANCE_EPSILON: f64 = 1e-6;

/// Inactivity gap (seconds) that splits two sessions.
pub const DEFAULT_SESSION_GAP_SECS: f64 = 1800.0;

/// Most recent events considered per evaluation.
pub const DEFAULT_MAX_EVENTS: usize = 100;

// ---------------------------------------------------------------------------
// Decay profiles
// ---------------------------------------------------------------------------

/// Named decay tiers keyed by how often a subject is expected to be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayProfile {
    /// λ = 0.0001 (half-life ≈ 1.9 hours).
    DailyActive,
    /// λ = 0.001 (half-life ≈ 11.6 minutes).
    WeeklyActive,
    /// λ = 0.01 (half-life ≈ 69 seconds).
    MonthlyActive,
}

impl DecayProfile {
    /// Decay rate λ for this profile.
    pub fn decay_rate(self) -> f64 {
        match self {
            Self::DailyActive => 0.0001,
            Self::WeeklyActive => 0.001,
            Self::MonthlyActive => 0.01,
        }
    }

    /// Return a stable string tag.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::DailyActive => "daily_active",
            Self::WeeklyActive => "weekly_active",
            Self::MonthlyActive => "monthly_active",
        }
    }

    /// Parse a profile from its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "daily_active" | "daily" => Some(Self::DailyActive),
            "weekly_active" | "weekly" => Some(Self::WeeklyActive),
            "monthly_active" | "monthly" => Some(Self::MonthlyActive),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification thresholds
// ---------------------------------------------------------------------------

/// Cut-offs for the discrete state classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Below this many samples the subject is always `learning`.
    pub min_samples: u64,
    /// Scores strictly above this are `stable`.
    pub stable_above: f64,
    /// Scores strictly above this (and not stable) are `drifting`.
    pub drifting_above: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            min_samples: 10,
            stable_above: 0.8,
            drifting_above: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Tunable parameters of the continuity pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Temporal decay rate λ (per second).
    pub decay_rate: f64,
    /// Confidence stabilization constant k.
    pub confidence_k: f64,
    /// Variance floor ε for the distance scorer.
    pub distance_epsilon: f64,
    /// Inactivity gap that closes a session.
    pub session_gap_secs: f64,
    /// Cap on the number of most recent events fed to the extractor.
    pub max_events: usize,
    pub thresholds: ClassifierThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decay_rate: DEFAULT_DECAY_RATE,
            confidence_k: DEFAULT_CONFIDENCE_K,
            distance_epsilon: DEFAULT_DISTANCE_EPSILON,
            session_gap_secs: DEFAULT_SESSION_GAP_SECS,
            max_events: DEFAULT_MAX_EVENTS,
            thresholds: ClassifierThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Replace the decay rate with the one of a named profile.
    pub fn with_profile(mut self, profile: DecayProfile) -> Self {
        self.decay_rate = profile.decay_rate();
        self
    }

    pub fn with_decay_rate(mut self, decay_rate: f64) -> Self {
        self.decay_rate = decay_rate;
        self
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Check every parameter is in its admissible range.
    pub fn validate(&self) -> Result<()> {
        if !(self.decay_rate.is_finite() && self.decay_rate >= 0.0) {
            return Err(ContinuityError::InvalidConfig(format!(
                "decay_rate must be finite and >= 0, got {}",
                self.decay_rate
            )));
        }
        if !(self.confidence_k.is_finite() && self.confidence_k > 0.0) {
            return Err(ContinuityError::InvalidConfig(format!(
                "confidence_k must be finite and > 0, got {}",
                self.confidence_k
            )));
        }
        if !(self.distance_epsilon.is_finite() && self.distance_epsilon > 0.0) {
            return Err(ContinuityError::InvalidConfig(format!(
                "distance_epsilon must be finite and > 0, got {}",
                self.distance_epsilon
            )));
        }
        if !(self.session_gap_secs.is_finite() && self.session_gap_secs >= 0.0) {
            return Err(ContinuityError::InvalidConfig(format!(
                "session_gap_secs must be finite and >= 0, got {}",
                self.session_gap_secs
            )));
        }
        if self.max_events < 2 {
            return Err(ContinuityError::InvalidConfig(format!(
                "max_events must be >= 2, got {}",
                self.max_events
            )));
        }
        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.stable_above) || !(0.0..=1.0).contains(&t.drifting_above) {
            return Err(ContinuityError::InvalidConfig(
                "classifier thresholds must lie in [0, 1]".into(),
            ));
        }
        if t.drifting_above > t.stable_above {
            return Err(ContinuityError::InvalidConfig(format!(
                "drifting_above ({}) must not exceed stable_above ({})",
                t.drifting_above, t.stable_above
            )));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            ContinuityError::InvalidFileFormat(format!(
                "failed to parse config {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
