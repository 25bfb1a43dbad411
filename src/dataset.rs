//! Dataset containers
//!
//! The manifest is an attribute document whose values are placeholders. The
//! real value for each key lives in its own sibling document next to the
//! manifest, so a large payload is only read when its key is accessed.

use crate::attribute::{Attribute, Mapping};
use crate::error::{StoreError, StoreResult};
use crate::path::validate_name;
use crate::serializer::Serializer;
use crate::types::{CommitReport, NodeKey, NodeKind, ValueKind};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Keyed container with one document per value.
#[derive(Clone)]
pub struct Dataset {
    manifest: Attribute,
}

impl Dataset {
    pub(crate) fn new(manifest: Attribute) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &Attribute {
        &self.manifest
    }

    /// Path of the manifest document.
    pub fn path(&self) -> &Path {
        self.manifest.path()
    }

    /// Folder holding the manifest and its sibling documents.
    pub fn folder(&self) -> &Path {
        self.path().parent().unwrap_or_else(|| self.path())
    }

    pub fn exists(&self) -> bool {
        self.manifest.exists()
    }

    pub fn ptr_eq(&self, other: &Dataset) -> bool {
        self.manifest.ptr_eq(&other.manifest)
    }

    /// Sibling document holding the value for `key`.
    pub fn sibling(&self, key: &str) -> StoreResult<Arc<Serializer>> {
        let root = self.manifest.root();
        validate_name(key, &root.config().layout)?;
        Ok(root.serializer(self.folder().join(key), ValueKind::Any))
    }

    /// Paths of the sibling documents this dataset owns: one per listed key,
    /// plus removed keys whose deletion is not yet committed.
    fn member_siblings(&self) -> StoreResult<HashSet<PathBuf>> {
        let folder = self.folder();
        let mut siblings: HashSet<PathBuf> =
            self.keys()?.iter().map(|key| folder.join(key)).collect();
        siblings.extend(self.manifest.root().dropped_siblings_in(folder));
        Ok(siblings)
    }

    /// Whether the manifest or any of its sibling documents holds unsaved
    /// changes.
    pub fn has_unsaved_changes(&self) -> bool {
        if self.manifest.has_unsaved_changes() {
            return true;
        }
        let siblings = match self.member_siblings() {
            Ok(siblings) => siblings,
            Err(e) => {
                warn!(
                    manifest = %self.path().display(),
                    error = %e,
                    "could not list dataset keys"
                );
                return false;
            }
        };
        let manifest = self.manifest.path();
        !self
            .manifest
            .root()
            .ledger()
            .snapshot_where(|key| is_member(key, manifest, &siblings))
            .is_empty()
    }

    pub fn pending_deletion(&self) -> bool {
        self.manifest.pending_deletion()
    }

    /// Commit the manifest and every staged sibling document.
    pub fn commit(&self) -> StoreResult<CommitReport> {
        let siblings = self.member_siblings()?;
        let manifest = self.manifest.path();
        let root = self.manifest.root();
        let report = root.commit_where(|key| is_member(key, manifest, &siblings));
        root.settle_dropped_siblings(self.folder());
        report
    }

    /// Reset the manifest and every live sibling document.
    pub fn reset_cache(&self, flush_first: bool) -> StoreResult<()> {
        let siblings = self.member_siblings()?;
        self.manifest.reset_cache(flush_first)?;
        let root = self.manifest.root();
        let live = root.live_serializers_where(|(path, kind)| {
            *kind == ValueKind::Any && siblings.contains(path)
        });
        for sibling in live {
            sibling.reset_cache(flush_first)?;
        }
        root.settle_dropped_siblings(self.folder());
        Ok(())
    }

    /// Stage deletion of the manifest and every sibling it lists.
    pub fn delete(&self) -> StoreResult<()> {
        for key in self.keys()? {
            self.drop_sibling(&*self.sibling(&key)?);
        }
        self.manifest.delete();
        Ok(())
    }

    fn drop_sibling(&self, sibling: &Serializer) {
        self.manifest
            .root()
            .record_dropped_sibling(sibling.path().to_path_buf());
        sibling.delete();
    }
}

fn is_member(key: &NodeKey, manifest: &Path, siblings: &HashSet<PathBuf>) -> bool {
    match key.kind {
        NodeKind::Document(ValueKind::Object) => key.path == manifest,
        NodeKind::Document(ValueKind::Any) => siblings.contains(&key.path),
        _ => false,
    }
}

impl Mapping for Dataset {
    fn get(&self, key: &str) -> StoreResult<Value> {
        if !self.manifest.contains_key(key)? {
            return Err(StoreError::KeyNotFound {
                key: key.to_string(),
                path: self.path().to_path_buf(),
            });
        }
        self.sibling(key)?.read_required()
    }

    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let sibling = self.sibling(key)?;
        self.manifest.set(key, Value::Null)?;
        sibling.write(value)?;
        self.manifest.root().forget_dropped_sibling(sibling.path());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let sibling = self.sibling(key)?;
        self.manifest.remove(key)?;
        self.drop_sibling(&sibling);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.manifest.keys()
    }

    fn len(&self) -> StoreResult<usize> {
        self.manifest.len()
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        self.manifest.contains_key(key)
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("manifest", &self.path())
            .field("state", &self.manifest.state())
            .finish()
    }
}
