//! Persistence boundary — state store, history log, activity feed.
//!
//! The engine talks to its collaborators through three traits:
//!
//! - [`StateStore`] — get-by-key and revision-checked upsert of
//!   [`InvariantState`]. A write carrying a stale revision is rejected with
//!   `ConcurrentModification`, so lost updates surface as errors.
//! - [`HistoryLog`] — append-only sink for [`ContinuityHistory`] rows.
//! - [`ActivitySource`] — chronological recent-activity feed per subject.
//!
//! # Directory layout
//!
//! The file-backed stores default to `~/.continuity/`:
//!
//! ```text
//! ~/.continuity/
//! ├── state/
//! │   └── {subject_id}.json
//! ├── history/
//! │   └── {subject_id}.jsonl
//! └── activity/
//!     └── {subject_id}.jsonl
//! ```
//!
//! # Modules
//!
//! - [`memory`] — in-memory stores (arena + index for state).
//! - [`state_store`] — one JSON file per subject with a revision wrapper.
//! - [`history_log`] — JSON Lines, append only.
//! - [`activity_log`] — JSON Lines activity feed.
//! - [`locks`] — per-subject mutex registry for single-writer callers.

pub mod activity_log;
pub mod history_log;
pub mod locks;
pub mod memory;
pub mod state_store;

use std::sync::Arc;

use crate::continuity::{ContinuityHistory, InvariantState};
use crate::error::{ContinuityError, Result};
use crate::features::ActivityEvent;

pub use activity_log::FileActivityLog;
pub use history_log::FileHistoryLog;
pub use locks::SubjectLocks;
pub use memory::{InMemoryActivityLog, InMemoryHistoryLog, InMemoryStateStore};
pub use state_store::FileStateStore;

// ── Traits ────────────────────────────────────────────────────────────────────

/// A persisted state together with its store revision.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredState {
    pub state: InvariantState,
    /// Incremented on every successful save; the first save is revision 1.
    pub revision: u64,
}

/// Durable per-subject state keyed by subject id.
pub trait StateStore: Send + Sync {
    /// Load the state for `subject_id`, or `None` for an unknown subject.
    fn load(&self, subject_id: &str) -> Result<Option<StoredState>>;

    /// Upsert `state`, returning the new revision.
    ///
    /// `expected_revision` must equal the stored revision, or be `None`
    /// when no state exists yet. Any other combination fails with
    /// `ConcurrentModification` and leaves the store untouched.
    fn save(&self, state: &InvariantState, expected_revision: Option<u64>) -> Result<u64>;
}

/// Append-only sink for evaluation audit rows.
pub trait HistoryLog: Send + Sync {
    fn append(&self, record: &ContinuityHistory) -> Result<()>;

    /// Rows for `subject_id` in append order.
    fn list(&self, subject_id: &str) -> Result<Vec<ContinuityHistory>>;
}

/// Ordered recent-activity feed.
pub trait ActivitySource: Send + Sync {
    /// At most `limit` most recent events, oldest first.
    fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<ActivityEvent>>;
}

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn load(&self, subject_id: &str) -> Result<Option<StoredState>> {
        (**self).load(subject_id)
    }

    fn save(&self, state: &InvariantState, expected_revision: Option<u64>) -> Result<u64> {
        (**self).save(state, expected_revision)
    }
}

impl<T: HistoryLog + ?Sized> HistoryLog for Arc<T> {
    fn append(&self, record: &ContinuityHistory) -> Result<()> {
        (**self).append(record)
    }

    fn list(&self, subject_id: &str) -> Result<Vec<ContinuityHistory>> {
        (**self).list(subject_id)
    }
}

impl<T: ActivitySource + ?Sized> ActivitySource for Arc<T> {
    fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<ActivityEvent>> {
        (**self).recent(subject_id, limit)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Reject subject ids that are empty or unsafe to use as file names.
pub fn validate_subject_id(subject_id: &str) -> Result<()> {
    let unsafe_name = subject_id.is_empty()
        || subject_id == "."
        || subject_id == ".."
        || subject_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());
    if unsafe_name {
        return Err(ContinuityError::InvalidSubject(subject_id.to_string()));
    }
    Ok(())
}

/// Check an optimistic write against the currently stored revision.
pub(crate) fn check_revision(
    subject_id: &str,
    expected: Option<u64>,
    actual: Option<u64>,
) -> Result<u64> {
    if expected != actual {
        return Err(ContinuityError::ConcurrentModification {
            subject_id: subject_id.to_string(),
            expected,
            actual,
        });
    }
    Ok(actual.map_or(1, |r| r + 1))
}

/// Insert `event` keeping `events` sorted by timestamp; ties keep arrival order.
/// Reject events that cannot be placed on the timeline.
pub(crate) fn check_timestamp(event: &ActivityEvent) -> Result<()> {
    if event.timestamp.is_finite() {
        Ok(())
    } else {
        Err(ContinuityError::InvalidEvent(format!(
            "refusing to record non-finite timestamp {}",
            event.timestamp
        )))
    }
}

pub(crate) fn insert_chronological(events: &mut Vec<ActivityEvent>, event: ActivityEvent) {
    let at = events.partition_point(|e| e.timestamp <= event.timestamp);
    events.insert(at, event);
}

/// The trailing `limit` events of a chronological list.
pub(crate) fn most_recent(events: &[ActivityEvent], limit: usize) -> Vec<ActivityEvent> {
    events[events.len().saturating_sub(limit)..].to_vec()
}
