use crate::scratch_root;
use dirstore::{Mapping, PersistenceCause, StoreError, ValueKind};
use serde_json::json;
use std::path::Path;

#[test]
fn test_wrong_type_leaves_value_and_state_unchanged() {
    let (_temp, root) = scratch_root();
    let list = root
        .serializer(Path::new("list.json"), ValueKind::Array)
        .unwrap();
    list.write(json!([1, 2])).unwrap();
    root.commit().unwrap();
    assert!(!list.has_unsaved_changes());

    let err = list.write(json!({"not": "a list"})).unwrap_err();
    assert!(matches!(
        err,
        StoreError::TypeMismatch {
            expected: ValueKind::Array,
            found: ValueKind::Object,
        }
    ));
    assert_eq!(list.read().unwrap(), json!([1, 2]));
    assert!(!list.has_unsaved_changes());
}

#[test]
fn test_attribute_rejects_non_map() {
    let (_temp, root) = scratch_root();
    root.attr().set("k", json!(1)).unwrap();

    assert!(matches!(
        root.attr().write(json!([1])),
        Err(StoreError::TypeMismatch { .. })
    ));
    assert_eq!(root.attr().get("k").unwrap(), json!(1));
    assert!(root.attr().has_unsaved_changes());
}

#[test]
fn test_corrupt_document_reports_path_and_recovers() {
    let (_temp, root) = scratch_root();
    let file = root.path().join(".attributes");
    std::fs::write(&file, "{ not json").unwrap();

    let err = root.attr().get("k").unwrap_err();
    match err {
        StoreError::Persistence { path, cause } => {
            assert_eq!(path, file);
            assert!(matches!(cause, PersistenceCause::Json(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!root.attr().is_hydrated());

    std::fs::write(&file, r#"{"k": "fixed"}"#).unwrap();
    assert_eq!(root.attr().get("k").unwrap(), json!("fixed"));
}

#[test]
fn test_document_of_wrong_kind_on_disk() {
    let (temp, root) = scratch_root();
    std::fs::write(temp.path().join(".attributes"), "[1, 2, 3]").unwrap();

    let err = root.attr().keys().unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence {
            cause: PersistenceCause::UnexpectedKind { .. },
            ..
        }
    ));
}
