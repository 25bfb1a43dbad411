use crate::scratch_root;
use dirstore::{Mapping, StoreError};
use proptest::prelude::*;
use serde_json::{json, Value};

#[test]
fn test_attribute_round_trip_through_disk() {
    let (_temp, root) = scratch_root();
    let group = root.require_child("group").unwrap();
    group.attr().set("key", json!("value")).unwrap();
    root.commit().unwrap();

    group.clear_cache(false).unwrap();
    assert!(!group.attr().is_hydrated());
    assert_eq!(group.attr().get("key").unwrap(), json!("value"));
}

#[test]
fn test_clear_cache_without_flush_drops_unsaved_values() {
    let (_temp, root) = scratch_root();
    root.attr().set("kept", json!(1)).unwrap();
    root.commit().unwrap();
    root.attr().set("lost", json!(2)).unwrap();

    root.clear_cache(false).unwrap();
    assert!(!root.has_unsaved_changes());
    assert_eq!(root.attr().keys().unwrap(), vec!["kept"]);
}

#[test]
fn test_clear_cache_with_flush_persists_first() {
    let (temp, root) = scratch_root();
    root.attr().set("saved", json!(true)).unwrap();

    root.clear_cache(true).unwrap();
    assert!(!root.has_unsaved_changes());
    assert!(temp.path().join(".attributes").is_file());
    assert_eq!(root.attr().get("saved").unwrap(), json!(true));
}

#[test]
fn test_meta_and_attr_are_separate_documents() {
    let (temp, root) = scratch_root();
    root.meta().set("version", json!(3)).unwrap();
    root.attr().set("title", json!("run")).unwrap();
    root.commit().unwrap();

    let meta: Value =
        serde_json::from_str(&std::fs::read_to_string(temp.path().join(".meta")).unwrap())
            .unwrap();
    assert_eq!(meta, json!({"version": 3}));
    assert!(matches!(
        root.attr().get("version"),
        Err(StoreError::KeyNotFound { .. })
    ));
}

#[test]
fn test_written_documents_are_indented() {
    let (temp, root) = scratch_root();
    root.attr().set("a", json!(1)).unwrap();
    root.commit().unwrap();

    let text = std::fs::read_to_string(temp.path().join(".attributes")).unwrap();
    assert_eq!(text, "{\n    \"a\": 1\n}\n");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_key_order_survives_commit_and_reload(
        keys in prop::collection::hash_set("[a-z]{1,8}", 1..12)
    ) {
        let (_temp, root) = scratch_root();
        let keys: Vec<String> = keys.into_iter().collect();
        for (i, key) in keys.iter().enumerate() {
            root.attr().set(key, json!(i)).unwrap();
        }
        root.commit().unwrap();
        root.clear_cache(false).unwrap();

        prop_assert_eq!(root.attr().keys().unwrap(), keys.clone());
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(root.attr().get(key).unwrap(), json!(i));
        }
    }
}
