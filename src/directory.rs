//! Directories
//!
//! A folder on disk with three fixed documents (meta attributes, user
//! attributes and a dataset manifest) plus subdirectories for nested groups.
//! Children created in memory are listed alongside the on-disk ones until
//! they are committed.

use crate::attribute::Attribute;
use crate::dataset::Dataset;
use crate::error::{StoreError, StoreResult};
use crate::node::deferred::{as_persist, Persist};
use crate::node::{DeferredNode, DeferredState, PathNode};
use crate::path::validate_name;
use crate::root::{RootContainer, RootShared};
use crate::types::{CommitReport, NodeKey, ValueKind};
use std::collections::BTreeSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// A group in the hierarchy.
pub struct Directory {
    deferred: DeferredNode,
    meta: Attribute,
    attr: Attribute,
    datasets: Dataset,
}

impl Directory {
    pub(crate) fn new(root: Arc<RootShared>, path: PathBuf) -> Arc<Self> {
        let layout = &root.config().layout;
        let meta = Attribute::new(
            root.serializer(path.join(&layout.meta_name), ValueKind::Object),
        );
        let attr = Attribute::new(
            root.serializer(path.join(&layout.attributes_name), ValueKind::Object),
        );
        let datasets = Dataset::new(Attribute::new(
            root.serializer(path.join(&layout.datasets_name), ValueKind::Object),
        ));

        Arc::new_cyclic(|weak: &Weak<Directory>| Directory {
            deferred: DeferredNode::new(
                PathNode::new(path.clone(), root),
                NodeKey::directory(path),
                as_persist(weak),
            ),
            meta,
            attr,
            datasets,
        })
    }

    pub fn path(&self) -> &Path {
        self.deferred.path()
    }

    /// Last path component, or the full path for a filesystem root.
    pub fn name(&self) -> String {
        self.path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }

    pub fn exists(&self) -> bool {
        self.deferred.exists()
    }

    pub fn is_root(&self) -> bool {
        self.path() == self.shared().path()
    }

    /// The store this directory belongs to.
    pub fn root(&self) -> RootContainer {
        RootContainer::from_shared(Arc::clone(self.shared()))
    }

    pub fn meta(&self) -> &Attribute {
        &self.meta
    }

    pub fn attr(&self) -> &Attribute {
        &self.attr
    }

    pub fn datasets(&self) -> &Dataset {
        &self.datasets
    }

    pub fn state(&self) -> DeferredState {
        self.deferred.state()
    }

    pub fn pending_deletion(&self) -> bool {
        self.deferred.pending_deletion()
    }

    /// Whether this directory or anything below it holds unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.shared().ledger().has_entries_under(self.path())
    }

    fn shared(&self) -> &Arc<RootShared> {
        self.deferred.node().root()
    }

    /// Resolve an existing child.
    ///
    /// Children created in memory take precedence over the disk.
    pub fn child(&self, name: &str) -> StoreResult<Arc<Directory>> {
        let root = self.shared();
        validate_name(name, &root.config().layout)?;
        if let Some(child) = root.pending_child(self.path(), name) {
            return Ok(child);
        }

        let path = self.path().join(name);
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::PathNotFound { path })
            }
            Err(e) => return Err(StoreError::persistence(&path, e)),
        };
        if !metadata.is_dir() {
            return Err(StoreError::NotADirectory { path });
        }

        let child = root.directory(path);
        if child.pending_deletion() {
            return Err(StoreError::PendingDeletion {
                path: child.path().to_path_buf(),
            });
        }
        Ok(child)
    }

    /// Names of all visible children in ascending order: subfolders on disk
    /// merged with uncommitted in-memory children, minus pending deletions.
    pub fn child_names(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .children()?
            .iter()
            .map(|child| child.name())
            .collect())
    }

    /// All visible children in ascending name order.
    pub fn children(&self) -> StoreResult<Vec<Arc<Directory>>> {
        let root = self.shared();
        let layout = &root.config().layout;
        let mut names = BTreeSet::new();

        match std::fs::read_dir(self.path()) {
            Ok(entries) => {
                for entry in entries {
                    let entry = entry.map_err(|e| StoreError::persistence(self.path(), e))?;
                    if !entry.path().is_dir() {
                        continue;
                    }
                    match entry.file_name().into_string() {
                        Ok(name) if !layout.is_reserved(&name) => {
                            names.insert(name);
                        }
                        Ok(_) => {}
                        Err(raw) => {
                            warn!(
                                "Skipping non UTF-8 directory name {:?} in {}",
                                raw,
                                self.path().display()
                            );
                        }
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::persistence(self.path(), e)),
        }

        let mut in_memory = root.pending_children_of(self.path());
        names.extend(in_memory.iter().map(|(name, _)| name.clone()));

        let mut children = Vec::with_capacity(names.len());
        for name in names {
            let child = match in_memory.iter().position(|(pending, _)| *pending == name) {
                Some(index) => in_memory.swap_remove(index).1,
                None => root.directory(self.path().join(&name)),
            };
            if !child.pending_deletion() {
                children.push(child);
            }
        }
        Ok(children)
    }

    /// Register a new child in memory. It is written to disk on commit.
    pub fn create_child(&self, name: &str) -> StoreResult<Arc<Directory>> {
        let root = self.shared();
        validate_name(name, &root.config().layout)?;
        let path = self.path().join(name);
        if std::fs::symlink_metadata(&path).is_ok() {
            return Err(StoreError::AlreadyExists { path });
        }

        let child = root.directory(path);
        child.deferred.mark_modified();
        root.add_pending_child(self.path(), name, &child);
        debug!(path = %child.path().display(), "created directory in memory");
        Ok(child)
    }

    /// Resolve `name` if it exists, otherwise create it.
    pub fn require_child(&self, name: &str) -> StoreResult<Arc<Directory>> {
        match self.child(name) {
            Err(StoreError::PathNotFound { .. }) => self.create_child(name),
            resolved => resolved,
        }
    }

    /// The enclosing directory; the root's own directory at the top level.
    pub fn parent(&self) -> StoreResult<Arc<Directory>> {
        let root = self.shared();
        let at_root = || StoreError::AtRoot {
            path: self.path().to_path_buf(),
        };
        if self.is_root() {
            return Err(at_root());
        }
        let parent = self.path().parent().ok_or_else(at_root)?;
        Ok(root.directory(parent.to_path_buf()))
    }

    /// Reset every live cached document at or below this directory.
    ///
    /// With `flush_first`, unsaved documents are committed before being
    /// reset; otherwise their changes are discarded. Every document is
    /// visited; the first failure is returned.
    pub fn clear_cache(&self, flush_first: bool) -> StoreResult<()> {
        let documents = self
            .shared()
            .live_serializers_where(|(path, _)| path.starts_with(self.path()));

        let mut first_failure = None;
        for document in documents {
            if let Err(e) = document.reset_cache(flush_first) {
                first_failure.get_or_insert(e);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    /// Stage deletion of this folder and everything in it.
    ///
    /// Unsaved changes below the folder are discarded right away.
    pub fn delete(&self) -> StoreResult<()> {
        if self.is_root() {
            return Err(StoreError::AtRoot {
                path: self.path().to_path_buf(),
            });
        }
        let root = self.shared();
        let path = self.path();

        for node in root
            .ledger()
            .snapshot_where(|key| key.path.starts_with(path) && key.path != path)
        {
            node.discard();
        }
        self.clear_cache(false)?;
        root.forget_pending_under(path);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            root.remove_pending_child(parent, &name.to_string_lossy());
        }

        self.deferred.schedule_deletion();
        debug!(path = %path.display(), "staged directory deletion");
        Ok(())
    }

    /// Commit every staged change at or below this directory.
    pub fn commit(&self) -> StoreResult<CommitReport> {
        let path = self.path();
        self.shared()
            .commit_where(|key| key.path.starts_with(path))
    }
}

impl Persist for Directory {
    fn deferred(&self) -> &DeferredNode {
        &self.deferred
    }

    fn persist(&self) -> StoreResult<()> {
        if self.deferred.pending_deletion() {
            self.deferred.commit()?;
            return Ok(());
        }

        let path = self.path();
        std::fs::create_dir_all(path).map_err(|e| StoreError::persistence(path, e))?;
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.shared()
                .remove_pending_child(parent, &name.to_string_lossy());
        }
        self.deferred.mark_clean();
        Ok(())
    }

    fn discard(&self) {
        self.deferred.mark_clean();
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("path", &self.path())
            .field("state", &self.state())
            .finish()
    }
}
