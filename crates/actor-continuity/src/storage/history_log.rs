//! History persistence — append-only JSON Lines per subject.
//!
//! Rows are written to `{base_dir}/{subject_id}.jsonl`, one
//! `ContinuityHistory` per line. Existing lines are never rewritten.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::continuity::ContinuityHistory;
use crate::error::{ContinuityError, Result};

use super::{validate_subject_id, HistoryLog};

/// Filesystem-backed [`HistoryLog`].
pub struct FileHistoryLog {
    base_dir: PathBuf,
    append_lock: Mutex<()>,
}

impl FileHistoryLog {
    /// Create a new `FileHistoryLog` rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            append_lock: Mutex::new(()),
        })
    }

    fn log_path(&self, subject_id: &str) -> PathBuf {
        self.base_dir.join(format!("{subject_id}.jsonl"))
    }
}

impl HistoryLog for FileHistoryLog {
    fn append(&self, record: &ContinuityHistory) -> Result<()> {
        validate_subject_id(&record.subject_id)?;

        let mut line = serde_json::to_string(record)
            .map_err(|e| ContinuityError::SerializationError(e.to_string()))?;
        line.push('\n');

        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| ContinuityError::StorageError("history log lock poisoned".into()))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(&record.subject_id))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn list(&self, subject_id: &str) -> Result<Vec<ContinuityHistory>> {
        validate_subject_id(subject_id)?;
        let path = self.log_path(subject_id);

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ContinuityError::Io(e)),
        };

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| {
                    ContinuityError::InvalidFileFormat(format!(
                        "{}:{}: {e}",
                        path.display(),
                        i + 1
                    ))
                })
            })
            .collect()
    }
}
