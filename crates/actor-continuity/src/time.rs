//! Time utilities for the continuity engine.
//!
//! All timestamps are Unix epoch seconds (f64), matching the activity feed.

use chrono::Timelike;

/// Return the current time as seconds since Unix epoch.
pub fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn to_datetime(secs: f64) -> Option<chrono::DateTime<chrono::Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    chrono::DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

/// UTC hour of day (0–23) for a timestamp, or `None` if out of range.
pub fn hour_of_day(secs: f64) -> Option<u32> {
    to_datetime(secs).map(|dt| dt.hour())
}

/// Convert seconds to an RFC 3339 string.
pub fn secs_to_rfc3339(secs: f64) -> String {
    to_datetime(secs)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .to_rfc3339()
}
