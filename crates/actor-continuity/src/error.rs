//! Error types for the continuity engine.
//!
//! The math layer never fails on well-formed input; every variant here
//! originates at the persistence boundary or from a contract violation
//! in stored state.

/// Continuity error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum ContinuityError {
    #[error("Dimension mismatch in {field}: expected {expected}, found {actual}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Corrupt state for subject {subject_id}: {reason}")]
    CorruptState { subject_id: String, reason: String },

    #[error("Invalid subject id: {0:?}")]
    InvalidSubject(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid activity: {0}")]
    InvalidEvent(String),

    #[error(
        "Concurrent modification of {subject_id}: expected revision {expected:?}, found {actual:?}"
    )]
    ConcurrentModification {
        subject_id: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ContinuityError>;
