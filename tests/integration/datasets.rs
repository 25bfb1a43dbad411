use crate::scratch_root;
use dirstore::{Mapping, StoreError};
use serde_json::{json, Value};

#[test]
fn test_dataset_value_lives_in_sibling_document() {
    let (temp, root) = scratch_root();
    let group = root.require_child("group").unwrap();
    group.datasets().set("weights", json!([1, 1, 1, 1, 1])).unwrap();
    root.commit().unwrap();

    let folder = temp.path().join("group");
    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(folder.join(".data_sets")).unwrap())
            .unwrap();
    assert_eq!(manifest, json!({"weights": null}));

    let sibling: Value =
        serde_json::from_str(&std::fs::read_to_string(folder.join("weights")).unwrap()).unwrap();
    assert_eq!(sibling, json!([1, 1, 1, 1, 1]));
}

#[test]
fn test_dataset_removal_clears_manifest_and_sibling() {
    let (temp, root) = scratch_root();
    root.datasets().set("weights", json!([1, 1, 1, 1, 1])).unwrap();
    root.commit().unwrap();

    root.datasets().remove("weights").unwrap();
    assert!(temp.path().join("weights").is_file());
    root.commit().unwrap();

    assert!(!temp.path().join("weights").exists());
    assert!(!root.datasets().contains_key("weights").unwrap());
    root.clear_cache(false).unwrap();
    assert!(matches!(
        root.datasets().get("weights"),
        Err(StoreError::KeyNotFound { .. })
    ));
}

#[test]
fn test_dataset_values_load_lazily() {
    let (_temp, root) = scratch_root();
    root.datasets().set("small", json!(1)).unwrap();
    root.datasets().set("large", json!(vec![0; 1000])).unwrap();
    root.commit().unwrap();
    root.clear_cache(false).unwrap();

    assert_eq!(root.datasets().get("small").unwrap(), json!(1));
    let large = root.datasets().sibling("large").unwrap();
    assert!(!large.is_hydrated());
    assert_eq!(root.datasets().keys().unwrap(), vec!["small", "large"]);
}

#[test]
fn test_dataset_sibling_names_are_not_listed_as_children() {
    let (_temp, root) = scratch_root();
    root.datasets().set("weights", json!([1])).unwrap();
    root.require_child("group").unwrap();
    root.commit().unwrap();

    assert_eq!(root.child_names().unwrap(), vec!["group"]);
}
