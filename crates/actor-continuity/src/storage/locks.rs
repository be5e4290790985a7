//! Per-subject mutual exclusion.
//!
//! The engine performs a read-modify-write of subject state and does not
//! lock anything itself. Callers that want single-writer semantics wrap
//! each evaluation in [`SubjectLocks::with_subject`]; evaluations for
//! different subjects never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of one mutex per subject id.
#[derive(Debug, Default)]
pub struct SubjectLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SubjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `subject_id`.
    ///
    /// A poisoned subject lock is recovered; the guarded value is `()`,
    /// so there is no partially updated data behind it. The subject's
    /// entry is dropped once no caller holds or waits on it.
    pub fn with_subject<R>(&self, subject_id: &str, f: impl FnOnce() -> R) -> R {
        let lock = self.lock_for(subject_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        self.release(subject_id, &lock);
        result
    }

    /// Number of subjects currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_for(&self, subject_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(subject_id.to_string()).or_default())
    }

    // Clones are only taken under the registry lock, so a count of two
    // (the map and `lock`) means nobody else is holding or waiting.
    fn release(&self, subject_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(lock) == 2 {
            locks.remove(subject_id);
        }
    }
}
