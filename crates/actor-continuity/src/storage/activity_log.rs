//! Activity feed — JSON Lines of raw events per subject.
//!
//! Events may be recorded out of order; [`ActivitySource::recent`] always
//! returns the most recent ones oldest-first.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{ContinuityError, Result};
use crate::features::ActivityEvent;

use super::{check_timestamp, most_recent, validate_subject_id, ActivitySource};

/// Filesystem-backed activity feed.
pub struct FileActivityLog {
    base_dir: PathBuf,
    append_lock: Mutex<()>,
}

impl FileActivityLog {
    /// Create a new `FileActivityLog` rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            append_lock: Mutex::new(()),
        })
    }

    /// Record an activity event for `subject_id`.
    pub fn record(&self, subject_id: &str, event: &ActivityEvent) -> Result<()> {
        validate_subject_id(subject_id)?;
        check_timestamp(event)?;

        let mut line = serde_json::to_string(event)
            .map_err(|e| ContinuityError::SerializationError(e.to_string()))?;
        line.push('\n');

        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| ContinuityError::StorageError("activity log lock poisoned".into()))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(subject_id))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// All events for `subject_id`, oldest first.
    pub fn all(&self, subject_id: &str) -> Result<Vec<ActivityEvent>> {
        validate_subject_id(subject_id)?;
        let path = self.log_path(subject_id);

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ContinuityError::Io(e)),
        };

        let mut events = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event: ActivityEvent = serde_json::from_str(line).map_err(|e| {
                ContinuityError::InvalidFileFormat(format!("{}:{}: {e}", path.display(), i + 1))
            })?;
            events.push(event);
        }
        // Stable: equal timestamps keep append order.
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(events)
    }

    fn log_path(&self, subject_id: &str) -> PathBuf {
        self.base_dir.join(format!("{subject_id}.jsonl"))
    }
}

impl ActivitySource for FileActivityLog {
    fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<ActivityEvent>> {
        Ok(most_recent(&self.all(subject_id)?, limit))
    }
}
