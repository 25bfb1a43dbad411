//! Integration tests for the dirstore hierarchical data store

mod attributes;
mod datasets;
mod deferred_deletion;
mod enumeration;
mod identity;
mod ledger;
mod type_validation;

use dirstore::RootContainer;
use tempfile::TempDir;

/// Fresh scratch folder opened as a store.
pub fn scratch_root() -> (TempDir, RootContainer) {
    let temp = TempDir::new().unwrap();
    let root = RootContainer::open(temp.path()).unwrap();
    (temp, root)
}
