//! Behavioral continuity — per-subject state, evaluation, and audit history.
//!
//! The continuity module provides:
//! - Durable per-subject state (`InvariantState`) holding the Welford baseline
//! - The pure evaluation core (`evaluate_state`)
//! - The orchestrating `ContinuityEngine` (load, evaluate, save, append history)
//! - Discrete state classification (learning / stable / drifting / diverging)

pub mod classify;
pub mod engine;
pub mod types;

pub use types::{
    ContinuityHistory, ContinuityLabel, ContinuityResult, DivergenceMode, Evaluation, HistoryId,
    InvariantState,
};

pub use classify::classify;
pub use engine::{evaluate_state, ContinuityEngine};
