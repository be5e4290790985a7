//! Actor Continuity — behavioral continuity scoring for account subjects.
//!
//! Tracks an online baseline of each subject's behavioral features and
//! scores how consistent the latest activity is with it: variance-normalized
//! distance, temporal decay, sample-count confidence, and a discrete
//! learning / stable / drifting / diverging label. Used as an
//! account-takeover signal.

pub mod config;
pub mod continuity;
pub mod error;
pub mod features;
pub mod stats;
pub mod storage;
pub mod time;

// Re-export primary types
pub use config::{ClassifierThresholds, DecayProfile, EngineConfig};
pub use error::{ContinuityError, Result};
pub use features::{ActivityEvent, Feature, FeatureExtractor, FeatureVector, FEATURE_DIM};

// Re-export continuity types
pub use continuity::{
    evaluate_state, ContinuityEngine, ContinuityHistory, ContinuityLabel, ContinuityResult,
    DivergenceMode, Evaluation, HistoryId, InvariantState,
};

// Re-export storage types
pub use storage::{
    ActivitySource, FileActivityLog, FileHistoryLog, FileStateStore, HistoryLog,
    InMemoryActivityLog, InMemoryHistoryLog, InMemoryStateStore, StateStore, StoredState,
    SubjectLocks,
};
