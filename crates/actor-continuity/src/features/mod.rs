//! Behavioral feature extraction.
//!
//! Converts a chronological window of raw activity into a fixed
//! 10-dimensional vector. Extraction is a pure function of its input.

pub mod extract;
pub mod types;

pub use types::{ActivityEvent, Feature, FeatureVector, FEATURE_DIM};

pub use extract::{extract_features, split_sessions, FeatureExtractor};
