//! Feature extraction — raw activity window to a 10-dimensional vector.
//!
//! Three feature groups:
//! - 0–3 temporal: session duration, session gap, action rate, hour-of-day entropy
//! - 4–6 action: type entropy, primary share, bigram stability
//! - 7–9 entity: Gini focus, churn complement, revisit rate

use std::collections::{HashMap, HashSet};

use crate::config::{DEFAULT_MAX_EVENTS, DEFAULT_SESSION_GAP_SECS};

use super::types::{ActivityEvent, Feature, FeatureVector, FEATURE_DIM};

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Windowed feature extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureExtractor {
    pub session_gap_secs: f64,
    pub max_events: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            session_gap_secs: DEFAULT_SESSION_GAP_SECS,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl FeatureExtractor {
    pub fn new(session_gap_secs: f64, max_events: usize) -> Self {
        Self {
            session_gap_secs,
            max_events,
        }
    }

    /// The most recent `max_events` of a chronological window.
    pub fn window<'a>(&self, events: &'a [ActivityEvent]) -> &'a [ActivityEvent] {
        let start = events.len().saturating_sub(self.max_events);
        &events[start..]
    }

    /// Extract features from the most recent `max_events` of `events`.
    pub fn extract(&self, events: &[ActivityEvent]) -> FeatureVector {
        extract_features(self.window(events), self.session_gap_secs)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the behavioral feature vector from a chronological event window.
///
/// Fewer than two events yield the zero vector.
pub fn extract_features(events: &[ActivityEvent], session_gap_secs: f64) -> FeatureVector {
    let mut features = [0.0; FEATURE_DIM];

    if events.len() < 2 {
        return features;
    }

    temporal_features(events, session_gap_secs, &mut features);
    action_features(events, &mut features);
    entity_features(events, &mut features);

    features
}

fn temporal_features(events: &[ActivityEvent], session_gap_secs: f64, out: &mut FeatureVector) {
    let sessions = split_sessions(events, session_gap_secs);

    let total_duration: f64 = sessions
        .iter()
        .map(|s| s[s.len() - 1].timestamp - s[0].timestamp)
        .sum();
    out[Feature::SessionDuration.index()] = total_duration / sessions.len() as f64;

    if sessions.len() > 1 {
        let gaps: f64 = sessions
            .windows(2)
            .map(|pair| pair[1][0].timestamp - pair[0][0].timestamp)
            .sum();
        out[Feature::SessionGap.index()] = gaps / (sessions.len() - 1) as f64;
    }

    let span = events[events.len() - 1].timestamp - events[0].timestamp;
    if span > 0.0 {
        out[Feature::ActionRate.index()] = events.len() as f64 / (span / 60.0);
    }

    let mut hours = [0usize; 24];
    for hour in events.iter().filter_map(|e| crate::time::hour_of_day(e.timestamp)) {
        hours[hour as usize] += 1;
    }
    let mut hour_counts: Vec<usize> = hours.into_iter().filter(|&c| c > 0).collect();
    if hour_counts.len() > 1 {
        out[Feature::HourEntropy.index()] = shannon_entropy(&mut hour_counts) / 24f64.log2();
    }
}

fn action_features(events: &[ActivityEvent], out: &mut FeatureVector) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.action.as_str()).or_default() += 1;
    }

    let mut action_counts: Vec<usize> = counts.into_values().collect();
    if action_counts.len() > 1 {
        let max_entropy = (action_counts.len() as f64).log2();
        out[Feature::ActionEntropy.index()] = shannon_entropy(&mut action_counts) / max_entropy;
    }

    let most_common = action_counts.iter().copied().max().unwrap_or(0);
    out[Feature::PrimaryActionShare.index()] = most_common as f64 / events.len() as f64;

    let pairs = events.len() - 1;
    let distinct: HashSet<(&str, &str)> = events
        .windows(2)
        .map(|w| (w[0].action.as_str(), w[1].action.as_str()))
        .collect();
    out[Feature::BigramStability.index()] = 1.0 - distinct.len() as f64 / pairs as f64;
}

fn entity_features(events: &[ActivityEvent], out: &mut FeatureVector) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for entity in events.iter().filter_map(ActivityEvent::entity) {
        *counts.entry(entity).or_default() += 1;
        total += 1;
    }

    if total == 0 {
        return;
    }

    let mut entity_counts: Vec<usize> = counts.into_values().collect();
    entity_counts.sort_unstable();

    out[Feature::EntityGini.index()] = gini(&entity_counts);
    out[Feature::EntityChurnComplement.index()] =
        1.0 - entity_counts.len() as f64 / total as f64;

    let revisited = entity_counts.iter().filter(|&&c| c > 1).count();
    out[Feature::EntityRevisitRate.index()] = revisited as f64 / entity_counts.len() as f64;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split a chronological window into sessions.
///
/// A new session starts whenever the gap to the previous event is strictly
/// greater than `gap_threshold_secs`.
pub fn split_sessions(events: &[ActivityEvent], gap_threshold_secs: f64) -> Vec<&[ActivityEvent]> {
    if events.is_empty() {
        return Vec::new();
    }

    let mut sessions = Vec::new();
    let mut start = 0;
    for i in 1..events.len() {
        if events[i].timestamp - events[i - 1].timestamp > gap_threshold_secs {
            sessions.push(&events[start..i]);
            start = i;
        }
    }
    sessions.push(&events[start..]);
    sessions
}

/// Shannon entropy (bits) of a count histogram.
///
/// Counts are sorted first so equal multisets sum in the same order.
fn shannon_entropy(counts: &mut [usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts.sort_unstable();
    let total = total as f64;
    -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Gini coefficient of ascending-sorted counts. 0 = uniform.
fn gini(sorted_counts: &[usize]) -> f64 {
    let n = sorted_counts.len();
    let sum: usize = sorted_counts.iter().sum();
    if n == 0 || sum == 0 {
        return 0.0;
    }
    let weighted: usize = sorted_counts
        .iter()
        .enumerate()
        .map(|(i, &c)| (i + 1) * c)
        .sum();
    let n = n as f64;
    let g = (2.0 * weighted as f64) / (n * sum as f64) - (n + 1.0) / n;
    g.max(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
