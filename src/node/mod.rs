//! Path nodes
//!
//! Binds an in-memory object to a filesystem path and to the root that owns
//! it. A path node carries no mutable persisted state of its own.

pub mod deferred;

pub use deferred::{DeferredNode, DeferredState};

use crate::error::{StoreError, StoreResult};
use crate::root::RootShared;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable binding of a normalized path to its root.
pub struct PathNode {
    path: PathBuf,
    root: Arc<RootShared>,
}

impl PathNode {
    pub(crate) fn new(path: PathBuf, root: Arc<RootShared>) -> Self {
        Self { path, root }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn root(&self) -> &Arc<RootShared> {
        &self.root
    }

    /// Whether anything exists at the path on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the path from disk immediately, recursively for folders.
    pub fn physical_delete(&self) -> StoreResult<()> {
        remove_path(&self.path)
    }
}

impl fmt::Debug for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathNode").field("path", &self.path).finish()
    }
}

/// Remove a folder tree or a file. An absent path is not an error.
pub(crate) fn remove_path(path: &Path) -> StoreResult<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StoreError::persistence(path, e)),
    };

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else if metadata.is_file() || metadata.file_type().is_symlink() {
        std::fs::remove_file(path)
    } else {
        return Ok(());
    };

    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed from disk");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::persistence(path, e)),
    }
}
