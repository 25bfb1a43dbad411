use crate::scratch_root;
use dirstore::{Mapping, RootContainer, ValueKind};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

#[test]
fn test_child_lookups_share_one_instance() {
    let (temp, root) = scratch_root();
    std::fs::create_dir(temp.path().join("group")).unwrap();

    let first = root.child("group").unwrap();
    let second = root.child("group").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.attr().ptr_eq(second.attr()));
}

#[test]
fn test_documents_share_one_instance_across_access_paths() {
    let (_temp, root) = scratch_root();
    let child = root.require_child("group").unwrap();

    let via_directory = child.attr().serializer().clone();
    let via_root = root
        .serializer(Path::new("group/.attributes"), ValueKind::Object)
        .unwrap();
    assert!(Arc::ptr_eq(&via_directory, &via_root));
}

#[test]
fn test_unreferenced_clean_nodes_are_reloaded() {
    let (_temp, root) = scratch_root();
    let child = root.require_child("group").unwrap();
    child.attr().set("k", json!("v")).unwrap();
    root.commit().unwrap();
    drop(child);

    let reloaded = root.child("group").unwrap();
    assert!(!reloaded.attr().is_hydrated());
    assert_eq!(reloaded.attr().get("k").unwrap(), json!("v"));
}

#[test]
fn test_dirty_nodes_survive_dropped_handles() {
    let (_temp, root) = scratch_root();
    root.require_child("group")
        .unwrap()
        .attr()
        .set("k", json!(1))
        .unwrap();

    let again = root.child("group").unwrap();
    assert!(again.attr().has_unsaved_changes());
    assert_eq!(again.attr().get("k").unwrap(), json!(1));
}

#[test]
fn test_reopening_a_root_returns_the_live_store() {
    let (temp, root) = scratch_root();
    let reopened = dirstore::open(temp.path()).unwrap();
    assert!(root.ptr_eq(&reopened));
    assert!(Arc::ptr_eq(root.as_directory(), reopened.as_directory()));

    let other = tempfile::TempDir::new().unwrap();
    let unrelated = RootContainer::open(other.path()).unwrap();
    assert!(!root.ptr_eq(&unrelated));
}
