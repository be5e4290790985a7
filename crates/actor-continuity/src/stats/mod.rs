//! Pure statistical core — baselines, distance, decay, confidence.
//!
//! Nothing in this module touches storage or the clock.

pub mod baseline;
pub mod confidence;
pub mod decay;
pub mod distance;

pub use baseline::{variance_from_m2, Baseline};
pub use confidence::confidence;
pub use decay::{clamp_unit, continuity_score, half_life, temporal_decay};
pub use distance::distance;
