use crate::scratch_root;
use dirstore::{Mapping, StoreError, ValueKind};
use serde_json::json;
use std::path::Path;

#[test]
fn test_single_commit_flushes_every_descendant() {
    let (_temp, root) = scratch_root();
    let a = root.require_child("a").unwrap();
    let b = root.require_child("b").unwrap().require_child("deep").unwrap();
    a.attr().set("k", json!(1)).unwrap();
    b.attr().set("k", json!(2)).unwrap();
    assert!(a.has_unsaved_changes());
    assert!(b.has_unsaved_changes());

    root.commit().unwrap();
    assert!(!root.has_unsaved_changes());
    assert!(!a.has_unsaved_changes());
    assert!(!b.has_unsaved_changes());
    assert!(!a.attr().has_unsaved_changes());
    assert!(!b.attr().has_unsaved_changes());
}

#[test]
fn test_empty_commit_reports_nothing() {
    let (_temp, root) = scratch_root();
    let report = root.commit().unwrap();
    assert_eq!(report.committed, 0);
    assert_eq!(report.deleted, 0);
}

#[test]
fn test_reads_are_not_unsaved_changes() {
    let (_temp, root) = scratch_root();
    root.attr().set("k", json!(1)).unwrap();
    root.commit().unwrap();
    root.clear_cache(false).unwrap();

    assert_eq!(root.attr().get("k").unwrap(), json!(1));
    assert!(!root.has_unsaved_changes());
}

#[test]
fn test_unsaved_paths_lists_ledger_entries() {
    let (_temp, root) = scratch_root();
    root.attr().set("k", json!(1)).unwrap();
    let group = root.require_child("group").unwrap();

    let paths = root.unsaved_paths();
    assert!(paths.contains(&group.path().to_path_buf()));
    assert!(paths
        .iter()
        .any(|p| p.file_name() == Some(std::ffi::OsStr::new(".attributes"))));
    assert!(paths.iter().all(|p| p.starts_with(root.path())));
}

#[test]
fn test_failed_entry_stays_in_ledger() {
    let (temp, root) = scratch_root();
    std::fs::write(temp.path().join("blocker"), "file").unwrap();
    let doc = root
        .serializer(Path::new("blocker/inner.json"), ValueKind::Any)
        .unwrap();
    doc.write(json!(1)).unwrap();

    assert!(matches!(root.commit(), Err(StoreError::Commit { .. })));
    assert!(doc.has_unsaved_changes());

    std::fs::remove_file(temp.path().join("blocker")).unwrap();
    root.commit().unwrap();
    assert!(!root.has_unsaved_changes());
    assert!(temp.path().join("blocker/inner.json").is_file());
}
