//! In-memory collaborators.
//!
//! Useful for tests and for hosts that keep state in process. The state
//! store is an arena of slots plus a subject index: each subject id maps to
//! exactly one authoritative slot, and every write goes through the
//! revision check.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::continuity::{ContinuityHistory, InvariantState};
use crate::error::{ContinuityError, Result};
use crate::features::ActivityEvent;

use super::{
    check_revision, check_timestamp, insert_chronological, most_recent, validate_subject_id,
    ActivitySource, HistoryLog, StateStore, StoredState,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ContinuityError::StorageError("in-memory store lock poisoned".into()))
}

// ── State store ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Slots {
    index: HashMap<String, usize>,
    arena: Vec<StoredState>,
}

/// In-memory [`StateStore`].
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    slots: Mutex<Slots>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subjects with persisted state.
    pub fn len(&self) -> usize {
        lock(&self.slots).map(|s| s.arena.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subject ids in first-write order.
    pub fn subjects(&self) -> Result<Vec<String>> {
        let slots = lock(&self.slots)?;
        Ok(slots
            .arena
            .iter()
            .map(|s| s.state.subject_id.clone())
            .collect())
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self, subject_id: &str) -> Result<Option<StoredState>> {
        let slots = lock(&self.slots)?;
        Ok(slots
            .index
            .get(subject_id)
            .map(|&slot| slots.arena[slot].clone()))
    }

    fn save(&self, state: &InvariantState, expected_revision: Option<u64>) -> Result<u64> {
        let mut slots = lock(&self.slots)?;
        let slot = slots.index.get(&state.subject_id).copied();
        let current = slot.map(|s| slots.arena[s].revision);
        let revision = check_revision(&state.subject_id, expected_revision, current)?;

        let stored = StoredState {
            state: state.clone(),
            revision,
        };
        match slot {
            Some(s) => slots.arena[s] = stored,
            None => {
                let s = slots.arena.len();
                slots.arena.push(stored);
                slots.index.insert(state.subject_id.clone(), s);
            }
        }
        Ok(revision)
    }
}

// ── History log ───────────────────────────────────────────────────────────────

/// In-memory [`HistoryLog`].
#[derive(Debug, Default)]
pub struct InMemoryHistoryLog {
    rows: Mutex<HashMap<String, Vec<ContinuityHistory>>>,
}

impl InMemoryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all subjects.
    pub fn len(&self) -> usize {
        lock(&self.rows)
            .map(|r| r.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryLog for InMemoryHistoryLog {
    fn append(&self, record: &ContinuityHistory) -> Result<()> {
        lock(&self.rows)?
            .entry(record.subject_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn list(&self, subject_id: &str) -> Result<Vec<ContinuityHistory>> {
        Ok(lock(&self.rows)?
            .get(subject_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ── Activity log ──────────────────────────────────────────────────────────────

/// In-memory [`ActivitySource`] that also records events.
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    events: Mutex<HashMap<String, Vec<ActivityEvent>>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event for `subject_id`.
    pub fn record(&self, subject_id: &str, event: ActivityEvent) -> Result<()> {
        validate_subject_id(subject_id)?;
        check_timestamp(&event)?;
        let mut events = lock(&self.events)?;
        insert_chronological(events.entry(subject_id.to_string()).or_default(), event);
        Ok(())
    }

    /// Total events recorded for `subject_id`.
    pub fn count(&self, subject_id: &str) -> usize {
        lock(&self.events)
            .map(|e| e.get(subject_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl ActivitySource for InMemoryActivityLog {
    fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<ActivityEvent>> {
        let events = lock(&self.events)?;
        Ok(events
            .get(subject_id)
            .map(|e| most_recent(e, limit))
            .unwrap_or_default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
