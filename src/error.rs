//! Error types for store operations.

use crate::types::ValueKind;
use std::path::{Path, PathBuf};

/// Underlying cause of a persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceCause {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed or encoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but does not hold the declared container type.
    #[error("expected {expected} document, found {found}")]
    UnexpectedKind { expected: ValueKind, found: ValueKind },
}

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No file or folder exists at the resolved path.
    #[error("path not found: {}", .path.display())]
    PathNotFound { path: PathBuf },

    /// The resolved path exists but is not a folder.
    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// The resolved directory is staged for deletion.
    #[error("path exists but is pending deletion: {}", .path.display())]
    PendingDeletion { path: PathBuf },

    /// A child could not be created because the path is already taken.
    #[error("path already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    /// The operation has no meaning on the root container.
    #[error("operation not permitted on root: {}", .path.display())]
    AtRoot { path: PathBuf },

    /// The root folder does not exist on disk.
    #[error("root directory not found: {}", .path.display())]
    RootNotFound { path: PathBuf },

    /// The key is not present in the container.
    #[error("key not found: {key} in {}", .path.display())]
    KeyNotFound { key: String, path: PathBuf },

    /// A value of the wrong container type was assigned.
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: ValueKind, found: ValueKind },

    /// A child name or dataset key cannot be mapped onto the layout.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Reading or writing a document failed.
    #[error("persistence error in {}: {cause}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        cause: PersistenceCause,
    },

    /// One or more ledger entries failed to commit.
    #[error("{failed} node(s) failed to commit; first failure: {first}")]
    Commit {
        failed: usize,
        #[source]
        first: Box<StoreError>,
    },

    /// Configuration or logging setup failed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn persistence(path: &Path, cause: impl Into<PersistenceCause>) -> Self {
        StoreError::Persistence {
            path: path.to_path_buf(),
            cause: cause.into(),
        }
    }

    /// True when the error reports an absent path or key.
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::PathNotFound { .. } | StoreError::KeyNotFound { .. } => true,
            StoreError::Persistence {
                cause: PersistenceCause::Io(e),
                ..
            } => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::Config(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
