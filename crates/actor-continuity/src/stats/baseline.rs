//! Online baseline tracking (Welford's algorithm).

use crate::error::{ContinuityError, Result};
use crate::features::{FeatureVector, FEATURE_DIM};

/// Running per-dimension mean and sum of squared deviations (M2).
///
/// Variance is always derived from M2 on read; it is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    mean: FeatureVector,
    m2: FeatureVector,
    count: u64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self::new()
    }
}

impl Baseline {
    /// Empty baseline: zero mean, zero M2, no samples.
    pub fn new() -> Self {
        Self {
            mean: [0.0; FEATURE_DIM],
            m2: [0.0; FEATURE_DIM],
            count: 0,
        }
    }

    /// Rebuild a baseline from its persisted parts.
    ///
    /// Fails with `DimensionMismatch` rather than truncating or padding.
    pub fn from_parts(mean: &[f64], m2: &[f64], count: u64) -> Result<Self> {
        Ok(Self {
            mean: to_vector("baseline_vector", mean)?,
            m2: to_vector("baseline_variance_accumulator", m2)?,
            count,
        })
    }

    /// Fold a new observation into the baseline.
    pub fn update(&mut self, x: &FeatureVector) {
        self.count += 1;
        let n = self.count as f64;
        for i in 0..FEATURE_DIM {
            let delta = x[i] - self.mean[i];
            self.mean[i] += delta / n;
            let delta2 = x[i] - self.mean[i];
            self.m2[i] += delta * delta2;
        }
    }

    pub fn mean(&self) -> &FeatureVector {
        &self.mean
    }

    pub fn m2(&self) -> &FeatureVector {
        &self.m2
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Population variance `M2 / n`; zero while fewer than two samples exist.
    pub fn variance(&self) -> FeatureVector {
        variance_from_m2(&self.m2, self.count)
    }
}

/// Convert an M2 accumulator to population variance.
pub fn variance_from_m2(m2: &FeatureVector, count: u64) -> FeatureVector {
    if count < 2 {
        return [0.0; FEATURE_DIM];
    }
    let n = count as f64;
    let mut variance = [0.0; FEATURE_DIM];
    for (v, m) in variance.iter_mut().zip(m2.iter()) {
        *v = m / n;
    }
    variance
}

fn to_vector(field: &'static str, values: &[f64]) -> Result<FeatureVector> {
    <FeatureVector>::try_from(values).map_err(|_| ContinuityError::DimensionMismatch {
        field,
        expected: FEATURE_DIM,
        actual: values.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
