use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can arise while reading or writing tracker state.
///
/// Missing or malformed slots never surface here; they fall back to defaults.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON serialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// User-supplied quest or mission data was rejected.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Internal error (poisoned locks, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}
