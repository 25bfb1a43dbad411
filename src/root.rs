//! Root container
//!
//! The top-level directory of a store. It owns the dirty ledger and the
//! identity caches for every node beneath it, and exposes the bulk commit
//! that flushes the ledger.

use crate::attribute::Attribute;
use crate::cache::IdentityCache;
use crate::config::StoreConfig;
use crate::dataset::Dataset;
use crate::directory::Directory;
use crate::error::{StoreError, StoreResult};
use crate::ledger::Ledger;
use crate::path::resolve_below;
use crate::serializer::Serializer;
use crate::types::{CommitReport, NodeKey, ValueKind};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Instant;
use tracing::{error, info};

type DocumentKey = (PathBuf, ValueKind);

/// Children created in memory but not yet committed, by parent path.
type PendingChildren = HashMap<PathBuf, BTreeMap<String, Weak<Directory>>>;

/// Process-wide registry of open roots, keyed by canonical path.
fn open_roots() -> &'static IdentityCache<PathBuf, RootShared> {
    static ROOTS: OnceLock<IdentityCache<PathBuf, RootShared>> = OnceLock::new();
    ROOTS.get_or_init(IdentityCache::new)
}

/// State shared by every node below one root.
pub(crate) struct RootShared {
    path: PathBuf,
    config: StoreConfig,
    ledger: Ledger,
    directories: IdentityCache<PathBuf, Directory>,
    documents: IdentityCache<DocumentKey, Serializer>,
    pending_children: Mutex<PendingChildren>,
    dropped_siblings: Mutex<HashSet<PathBuf>>,
}

impl RootShared {
    fn new(path: PathBuf, config: StoreConfig) -> Self {
        Self {
            path,
            config,
            ledger: Ledger::new(),
            directories: IdentityCache::new(),
            documents: IdentityCache::new(),
            pending_children: Mutex::new(HashMap::new()),
            dropped_siblings: Mutex::new(HashSet::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Cached directory for a normalized path below (or at) the root.
    pub fn directory(self: &Arc<Self>, path: PathBuf) -> Arc<Directory> {
        self.directories
            .get_or_create(path.clone(), || Directory::new(Arc::clone(self), path))
    }

    /// Cached document for a normalized path and declared type.
    pub fn serializer(self: &Arc<Self>, path: PathBuf, kind: ValueKind) -> Arc<Serializer> {
        self.documents.get_or_create((path.clone(), kind), || {
            Serializer::new(Arc::clone(self), path, kind)
        })
    }

    pub fn live_serializers_where<P>(&self, filter: P) -> Vec<Arc<Serializer>>
    where
        P: FnMut(&DocumentKey) -> bool,
    {
        self.documents.live_where(filter)
    }

    /// Register an uncommitted child. Collected entries of every parent are
    /// swept on the way.
    pub fn add_pending_child(&self, parent: &Path, name: &str, child: &Arc<Directory>) {
        let mut table = self.pending_children.lock();
        table.retain(|_, children| {
            children.retain(|_, weak| weak.strong_count() > 0);
            !children.is_empty()
        });
        table
            .entry(parent.to_path_buf())
            .or_default()
            .insert(name.to_string(), Arc::downgrade(child));
    }

    pub fn pending_child(&self, parent: &Path, name: &str) -> Option<Arc<Directory>> {
        self.pending_children
            .lock()
            .get(parent)
            .and_then(|children| children.get(name))
            .and_then(Weak::upgrade)
    }

    /// Live pending children of `parent`, sweeping collected entries.
    pub fn pending_children_of(&self, parent: &Path) -> Vec<(String, Arc<Directory>)> {
        let mut table = self.pending_children.lock();
        let Some(children) = table.get_mut(parent) else {
            return Vec::new();
        };
        children.retain(|_, weak| weak.strong_count() > 0);
        let live = children
            .iter()
            .filter_map(|(name, weak)| weak.upgrade().map(|child| (name.clone(), child)))
            .collect();
        if children.is_empty() {
            table.remove(parent);
        }
        live
    }

    pub fn remove_pending_child(&self, parent: &Path, name: &str) {
        let mut table = self.pending_children.lock();
        if let Some(children) = table.get_mut(parent) {
            children.remove(name);
            if children.is_empty() {
                table.remove(parent);
            }
        }
    }

    /// Forget every pending child whose parent lies at or below `prefix`,
    /// along with dataset siblings dropped there.
    pub fn forget_pending_under(&self, prefix: &Path) {
        self.pending_children
            .lock()
            .retain(|parent, _| !parent.starts_with(prefix));
        self.dropped_siblings
            .lock()
            .retain(|path| !path.starts_with(prefix));
    }

    /// Remember a dataset sibling whose key was removed, so the dataset's
    /// scoped commit still flushes its deletion.
    pub fn record_dropped_sibling(&self, path: PathBuf) {
        self.dropped_siblings.lock().insert(path);
    }

    pub fn forget_dropped_sibling(&self, path: &Path) {
        self.dropped_siblings.lock().remove(path);
    }

    /// Dropped siblings whose parent folder is `folder`.
    pub fn dropped_siblings_in(&self, folder: &Path) -> Vec<PathBuf> {
        self.dropped_siblings
            .lock()
            .iter()
            .filter(|path| path.parent() == Some(folder))
            .cloned()
            .collect()
    }

    /// Forget dropped siblings in `folder` that no longer wait in the ledger.
    pub fn settle_dropped_siblings(&self, folder: &Path) {
        self.dropped_siblings.lock().retain(|path| {
            path.parent() != Some(folder)
                || self
                    .ledger
                    .contains(&NodeKey::document(path.clone(), ValueKind::Any))
        });
    }

    #[cfg(test)]
    fn pending_parent_count(&self) -> usize {
        self.pending_children.lock().len()
    }

    /// Commit every ledger entry matching `filter`.
    ///
    /// Each node's commit is self-contained, so entries are processed in key
    /// order purely for stable logs. Failures are collected and reported after
    /// the remaining entries were attempted, unless `stop_on_error` is set.
    pub fn commit_where<P>(&self, filter: P) -> StoreResult<CommitReport>
    where
        P: FnMut(&NodeKey) -> bool,
    {
        let started = Instant::now();
        let pending = self.ledger.snapshot_where(filter);
        let mut report = CommitReport::default();
        let mut failed = 0;
        let mut first_failure = None;

        for node in pending {
            let deferred = node.deferred();
            if !deferred.has_unsaved_changes() {
                continue;
            }
            let deleting = deferred.pending_deletion();
            match node.persist() {
                Ok(()) => {
                    report.committed += 1;
                    if deleting {
                        report.deleted += 1;
                    }
                }
                Err(e) => {
                    error!(path = %deferred.path().display(), error = %e, "commit failed");
                    failed += 1;
                    first_failure.get_or_insert(e);
                    if self.config.persistence.stop_on_error {
                        break;
                    }
                }
            }
        }

        if let Some(first) = first_failure {
            return Err(StoreError::Commit {
                failed,
                first: Box::new(first),
            });
        }

        if report.committed > 0 {
            info!(
                root = %self.path.display(),
                committed = report.committed,
                deleted = report.deleted,
                duration_ms = started.elapsed().as_millis() as u64,
                "commit complete"
            );
        }
        Ok(report)
    }
}

/// Handle to an open store.
///
/// Dereferences to the root [`Directory`], so the whole directory surface is
/// available on the root as well.
#[derive(Clone)]
pub struct RootContainer {
    shared: Arc<RootShared>,
    directory: Arc<Directory>,
}

impl RootContainer {
    /// Open an existing folder as a store with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open an existing folder as a store.
    ///
    /// The folder is never created. If the root is already open in this
    /// process the live instance is returned and `config` is ignored.
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        let canonical = dunce::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::RootNotFound {
                path: path.to_path_buf(),
            },
            _ => StoreError::persistence(path, e),
        })?;
        if !canonical.is_dir() {
            return Err(StoreError::NotADirectory { path: canonical });
        }

        let shared = open_roots().get_or_create(canonical.clone(), || {
            info!(root = %canonical.display(), "opened store");
            Arc::new(RootShared::new(canonical.clone(), config))
        });
        Ok(Self::from_shared(shared))
    }

    pub(crate) fn from_shared(shared: Arc<RootShared>) -> Self {
        let directory = shared.directory(shared.path.clone());
        Self { shared, directory }
    }

    pub(crate) fn shared(&self) -> &Arc<RootShared> {
        &self.shared
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// The root as a plain directory handle.
    pub fn as_directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Flush every node in the ledger.
    pub fn commit(&self) -> StoreResult<CommitReport> {
        self.shared.commit_where(|_| true)
    }

    /// Whether any node below the root holds unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.shared.ledger.is_empty()
    }

    /// Number of nodes currently in the ledger.
    pub fn unsaved_count(&self) -> usize {
        self.shared.ledger.len()
    }

    /// Paths of nodes currently in the ledger, ascending.
    pub fn unsaved_paths(&self) -> Vec<PathBuf> {
        self.shared.ledger.paths()
    }

    /// Open an arbitrary document below the root.
    pub fn serializer(&self, relative: &Path, kind: ValueKind) -> StoreResult<Arc<Serializer>> {
        let path = resolve_below(&self.shared.path, relative)?;
        Ok(self.shared.serializer(path, kind))
    }

    /// Open an arbitrary attribute document below the root.
    pub fn attribute(&self, relative: &Path) -> StoreResult<Attribute> {
        self.serializer(relative, ValueKind::Object)
            .map(Attribute::new)
    }

    /// Open an arbitrary dataset manifest below the root.
    pub fn dataset(&self, relative: &Path) -> StoreResult<Dataset> {
        self.attribute(relative).map(Dataset::new)
    }

    /// Whether both handles refer to the same open store.
    pub fn ptr_eq(&self, other: &RootContainer) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Deref for RootContainer {
    type Target = Directory;

    fn deref(&self) -> &Directory {
        &self.directory
    }
}

impl fmt::Debug for RootContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootContainer")
            .field("path", &self.shared.path)
            .field("unsaved", &self.shared.ledger.len())
            .finish()
    }
}
