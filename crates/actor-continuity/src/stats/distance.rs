//! Variance-normalized distance.
//!
//! A diagonal-covariance analogue of the Mahalanobis distance: dimensions
//! with historically wide spread contribute less per unit of deviation.

use crate::features::FeatureVector;

/// `sqrt(Σ (xᵢ − μᵢ)² / (σᵢ² + ε))`.
///
/// `epsilon` keeps dimensions with no observed spread finite.
pub fn distance(
    x: &FeatureVector,
    mean: &FeatureVector,
    variance: &FeatureVector,
    epsilon: f64,
) -> f64 {
    x.iter()
        .zip(mean.iter())
        .zip(variance.iter())
        .map(|((xi, mi), vi)| (xi - mi).powi(2) / (vi + epsilon))
        .sum::<f64>()
        .sqrt()
}
