//! Sample-count confidence.

use super::decay::clamp_unit;

/// `1 − e^(−n/k)`: 0 with no samples, ~0.632 at `n = k`, asymptotic to 1.
pub fn confidence(sample_count: u64, k: f64) -> f64 {
    clamp_unit(1.0 - (-(sample_count as f64) / k).exp())
}
