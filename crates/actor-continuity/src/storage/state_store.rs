//! State persistence — store and retrieve `InvariantState` records.
//!
//! Each subject's state is stored as a single JSON file named
//! `{subject_id}.json` inside the configured base directory.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "revision": 7,
//!     "state": { ... InvariantState ... }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::continuity::InvariantState;
use crate::error::{ContinuityError, Result};

use super::{check_revision, validate_subject_id, StateStore, StoredState};

// ── File format constants ─────────────────────────────────────────────────────

const STATE_FILE_VERSION: u32 = 1;

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each subject.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    /// Format version number.
    version: u32,
    /// Store revision, incremented on every save.
    revision: u64,
    /// The stored state.
    state: InvariantState,
}

// ── FileStateStore ────────────────────────────────────────────────────────────

/// Filesystem-backed [`StateStore`].
///
/// Revision checks and writes are serialized within one process, and each
/// write lands via rename so readers never observe a partial file.
/// Concurrent writers from multiple processes are not coordinated.
pub struct FileStateStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStateStore {
    /// Create a new `FileStateStore` rooted at `base_dir`.
    ///
    /// The directory and any missing parents are created if they do not exist.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// List the subject ids that have a stored state.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn read(&self, subject_id: &str) -> Result<Option<StateFile>> {
        let path = self.state_path(subject_id);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ContinuityError::Io(e)),
        };

        let file: StateFile = serde_json::from_slice(&bytes).map_err(|e| {
            ContinuityError::InvalidFileFormat(format!(
                "failed to parse state file {}: {e}",
                path.display()
            ))
        })?;

        if file.version != STATE_FILE_VERSION {
            return Err(ContinuityError::InvalidFileFormat(format!(
                "unsupported state file version {} in {}",
                file.version,
                path.display()
            )));
        }
        if file.state.subject_id != subject_id {
            return Err(ContinuityError::CorruptState {
                subject_id: subject_id.to_string(),
                reason: format!("file holds state for {:?}", file.state.subject_id),
            });
        }

        Ok(Some(file))
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Build the filesystem path for a subject id.
    fn state_path(&self, subject_id: &str) -> PathBuf {
        self.base_dir.join(format!("{subject_id}.json"))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, subject_id: &str) -> Result<Option<StoredState>> {
        validate_subject_id(subject_id)?;
        Ok(self.read(subject_id)?.map(|file| StoredState {
            state: file.state,
            revision: file.revision,
        }))
    }

    fn save(&self, state: &InvariantState, expected_revision: Option<u64>) -> Result<u64> {
        validate_subject_id(&state.subject_id)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ContinuityError::StorageError("state store lock poisoned".into()))?;

        let current = self.read(&state.subject_id)?.map(|f| f.revision);
        let revision = check_revision(&state.subject_id, expected_revision, current)?;

        let file = StateFile {
            version: STATE_FILE_VERSION,
            revision,
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ContinuityError::SerializationError(e.to_string()))?;

        let path = self.state_path(&state.subject_id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &path)?;

        Ok(revision)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
