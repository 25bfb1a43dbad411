//! Deferred nodes
//!
//! Stages mutations in memory. Deletes and writes only reach the disk on an
//! explicit commit. Every transition between clean and dirty is reported to
//! the owning root's ledger, which is how a bulk commit discovers its work.

use super::PathNode;
use crate::error::StoreResult;
use crate::types::NodeKey;
use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use std::sync::Weak;

/// Persistence state of a deferred node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    /// Memory and disk agree.
    Clean,
    /// Holds changes not yet written.
    Dirty,
    /// Scheduled for removal; also an unsaved change.
    DirtyPendingDeletion,
}

impl DeferredState {
    pub fn is_unsaved(self) -> bool {
        !matches!(self, DeferredState::Clean)
    }

    pub fn is_pending_deletion(self) -> bool {
        matches!(self, DeferredState::DirtyPendingDeletion)
    }
}

/// Seam between the ledger and the concrete node types it flushes.
pub(crate) trait Persist: Send + Sync {
    fn deferred(&self) -> &DeferredNode;

    /// Write staged state to disk and return to `Clean`.
    fn persist(&self) -> StoreResult<()>;

    /// Forget staged state without touching disk.
    fn discard(&self);
}

/// Path node with a staged-mutation state machine.
pub struct DeferredNode {
    node: PathNode,
    key: NodeKey,
    this: Weak<dyn Persist>,
    state: Mutex<DeferredState>,
}

impl DeferredNode {
    /// `this` must point at the node that embeds the returned value; it is
    /// what gets registered with the ledger.
    pub(crate) fn new(node: PathNode, key: NodeKey, this: Weak<dyn Persist>) -> Self {
        Self {
            node,
            key,
            this,
            state: Mutex::new(DeferredState::Clean),
        }
    }

    pub fn path(&self) -> &Path {
        self.node.path()
    }

    pub fn exists(&self) -> bool {
        self.node.exists()
    }

    pub(crate) fn node(&self) -> &PathNode {
        &self.node
    }

    pub fn state(&self) -> DeferredState {
        *self.state.lock()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.state().is_unsaved()
    }

    pub fn pending_deletion(&self) -> bool {
        self.state().is_pending_deletion()
    }

    /// Flag or unflag unsaved changes.
    ///
    /// A staged deletion is left in place either way; only a commit or an
    /// explicit discard clears it.
    pub fn set_unsaved_changes(&self, unsaved: bool) {
        self.transition(|current| match (current, unsaved) {
            (DeferredState::DirtyPendingDeletion, _) => DeferredState::DirtyPendingDeletion,
            (_, true) => DeferredState::Dirty,
            (_, false) => DeferredState::Clean,
        });
    }

    /// Record a modification, cancelling any staged deletion.
    pub(crate) fn mark_modified(&self) {
        self.transition(|_| DeferredState::Dirty);
    }

    pub(crate) fn schedule_deletion(&self) {
        self.transition(|_| DeferredState::DirtyPendingDeletion);
    }

    /// Return to `Clean` unconditionally.
    pub(crate) fn mark_clean(&self) {
        self.transition(|_| DeferredState::Clean);
    }

    /// Base commit: perform a staged deletion, then clear both flags.
    ///
    /// Returns whether a deletion was carried out.
    pub(crate) fn commit(&self) -> StoreResult<bool> {
        let deleting = self.pending_deletion();
        if deleting {
            self.node.physical_delete()?;
        }
        self.mark_clean();
        Ok(deleting)
    }

    fn transition<F>(&self, next: F)
    where
        F: FnOnce(DeferredState) -> DeferredState,
    {
        let mut state = self.state.lock();
        let previous = *state;
        *state = next(previous);

        if previous != *state {
            tracing::trace!(
                path = %self.path().display(),
                from = ?previous,
                to = ?*state,
                "deferred state transition"
            );
        }

        let ledger = self.node.root().ledger();
        if state.is_unsaved() {
            if let Some(this) = self.this.upgrade() {
                ledger.register(self.key.clone(), this);
            }
        } else if previous.is_unsaved() {
            ledger.release(&self.key);
        }
    }
}

impl fmt::Debug for DeferredNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredNode")
            .field("path", &self.path())
            .field("state", &self.state())
            .finish()
    }
}

pub(crate) fn as_persist<T: Persist + 'static>(weak: &Weak<T>) -> Weak<dyn Persist> {
    weak.clone()
}
