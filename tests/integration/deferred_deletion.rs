use crate::scratch_root;
use dirstore::{DeferredState, Mapping, StoreError, ValueKind};
use serde_json::json;
use std::path::Path;

#[test]
fn test_document_deletion_waits_for_commit() {
    let (temp, root) = scratch_root();
    let doc = root
        .serializer(Path::new("notes.json"), ValueKind::Any)
        .unwrap();
    doc.write(json!({"a": 1})).unwrap();
    root.commit().unwrap();
    let file = temp.path().join("notes.json");
    assert!(file.is_file());

    doc.delete();
    assert!(file.exists());
    assert!(doc.pending_deletion());
    assert_eq!(doc.read().unwrap(), json!(null));

    root.commit().unwrap();
    assert!(!file.exists());
    assert!(!doc.pending_deletion());
    assert_eq!(doc.state(), DeferredState::Clean);
}

#[test]
fn test_write_cancels_pending_deletion() {
    let (temp, root) = scratch_root();
    let doc = root
        .serializer(Path::new("notes.json"), ValueKind::Any)
        .unwrap();
    doc.write(json!(1)).unwrap();
    root.commit().unwrap();

    doc.delete();
    doc.write(json!(2)).unwrap();
    assert!(!doc.pending_deletion());
    root.commit().unwrap();

    let on_disk = std::fs::read_to_string(temp.path().join("notes.json")).unwrap();
    assert_eq!(on_disk.trim(), "2");
}

#[test]
fn test_directory_deletion_waits_for_commit() {
    let (temp, root) = scratch_root();
    let group = root.require_child("group").unwrap();
    group.require_child("nested").unwrap();
    group.attr().set("k", json!(1)).unwrap();
    root.commit().unwrap();
    assert!(temp.path().join("group/nested").is_dir());

    group.delete().unwrap();
    assert!(temp.path().join("group").is_dir());
    assert!(group.pending_deletion());
    assert!(matches!(
        root.child("group"),
        Err(StoreError::PendingDeletion { .. })
    ));

    let report = root.commit().unwrap();
    assert_eq!(report.deleted, 1);
    assert!(!temp.path().join("group").exists());
    assert!(!group.pending_deletion());
}

#[test]
fn test_recreate_after_committed_delete() {
    let (_temp, root) = scratch_root();
    let group = root.require_child("group").unwrap();
    root.commit().unwrap();
    group.delete().unwrap();
    root.commit().unwrap();

    let again = root.require_child("group").unwrap();
    again.attr().set("fresh", json!(true)).unwrap();
    root.commit().unwrap();
    assert!(again.exists());
    assert_eq!(root.child_names().unwrap(), vec!["group"]);
}
