//! Dirty ledger
//!
//! Root-owned set of nodes currently holding unsaved changes. A node is in
//! the ledger exactly while its deferred state is not `Clean`. The ledger
//! holds strong references, so staged changes survive even when callers drop
//! every handle to the node before committing.

use crate::node::deferred::Persist;
use crate::types::NodeKey;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) struct Ledger {
    entries: Mutex<BTreeMap<NodeKey, Arc<dyn Persist>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn register(&self, key: NodeKey, node: Arc<dyn Persist>) {
        let previous = self.entries.lock().insert(key, node);
        drop(previous);
    }

    pub fn release(&self, key: &NodeKey) {
        let removed = self.entries.lock().remove(key);
        drop(removed);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether any entry lives at or below `prefix`.
    pub fn has_entries_under(&self, prefix: &Path) -> bool {
        self.entries
            .lock()
            .keys()
            .any(|key| key.path.starts_with(prefix))
    }

    /// Paths of all entries in ascending order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries
            .lock()
            .keys()
            .map(|key| key.path.clone())
            .collect()
    }

    /// Entries matching `filter`, in ascending key order. The lock is released
    /// before the snapshot is returned so callers may commit from it.
    pub fn snapshot_where<P>(&self, mut filter: P) -> Vec<Arc<dyn Persist>>
    where
        P: FnMut(&NodeKey) -> bool,
    {
        self.entries
            .lock()
            .iter()
            .filter(|(key, _)| filter(key))
            .map(|(_, node)| Arc::clone(node))
            .collect()
    }
}
