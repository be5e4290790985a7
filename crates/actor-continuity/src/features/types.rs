//! Data structures for behavioral feature extraction.

use serde::{Deserialize, Serialize};

/// Dimensionality of the behavioral feature vector.
pub const FEATURE_DIM: usize = 10;

/// Fixed-length behavioral feature vector.
pub type FeatureVector = [f64; FEATURE_DIM];

// ---------------------------------------------------------------------------
// Activity Event
// ---------------------------------------------------------------------------

/// A single raw activity event attributed to a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Seconds since Unix epoch.
    pub timestamp: f64,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl ActivityEvent {
    pub fn new(timestamp: f64, action: impl Into<String>, entity_id: Option<String>) -> Self {
        Self {
            timestamp,
            action: action.into(),
            entity_id,
        }
    }

    /// Event touching a specific entity.
    pub fn on_entity(timestamp: f64, action: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(timestamp, action, Some(entity.into()))
    }

    /// Entity id, treating an empty string as absent.
    pub fn entity(&self) -> Option<&str> {
        self.entity_id.as_deref().filter(|e| !e.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Feature index
// ---------------------------------------------------------------------------

/// Position of each feature in the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    SessionDuration = 0,
    SessionGap = 1,
    ActionRate = 2,
    HourEntropy = 3,
    ActionEntropy = 4,
    PrimaryActionShare = 5,
    BigramStability = 6,
    EntityGini = 7,
    EntityChurnComplement = 8,
    EntityRevisitRate = 9,
}

impl Feature {
    /// All features in vector order.
    pub const ALL: [Feature; FEATURE_DIM] = [
        Self::SessionDuration,
        Self::SessionGap,
        Self::ActionRate,
        Self::HourEntropy,
        Self::ActionEntropy,
        Self::PrimaryActionShare,
        Self::BigramStability,
        Self::EntityGini,
        Self::EntityChurnComplement,
        Self::EntityRevisitRate,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Return a stable string tag.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::SessionDuration => "session_duration",
            Self::SessionGap => "session_gap",
            Self::ActionRate => "action_rate",
            Self::HourEntropy => "hour_entropy",
            Self::ActionEntropy => "action_entropy",
            Self::PrimaryActionShare => "primary_action_share",
            Self::BigramStability => "bigram_stability",
            Self::EntityGini => "entity_gini",
            Self::EntityChurnComplement => "entity_churn_complement",
            Self::EntityRevisitRate => "entity_revisit_rate",
        }
    }
}
