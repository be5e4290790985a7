//! Discrete state classification.

use crate::config::ClassifierThresholds;

use super::types::ContinuityLabel;

/// Map `(score, sample_count)` to a label.
///
/// Too few samples always yields `Learning`, whatever the score.
pub fn classify(
    score: f64,
    sample_count: u64,
    thresholds: &ClassifierThresholds,
) -> ContinuityLabel {
    if sample_count < thresholds.min_samples {
        ContinuityLabel::Learning
    } else if score > thresholds.stable_above {
        ContinuityLabel::Stable
    } else if score > thresholds.drifting_above {
        ContinuityLabel::Drifting
    } else {
        ContinuityLabel::Diverging
    }
}
