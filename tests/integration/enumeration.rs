use crate::scratch_root;
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn test_children_merge_disk_and_memory_in_order() {
    let (temp, root) = scratch_root();
    std::fs::create_dir(temp.path().join("b")).unwrap();
    std::fs::create_dir(temp.path().join("a")).unwrap();
    root.create_child("c").unwrap();

    assert_eq!(root.child_names().unwrap(), vec!["a", "b", "c"]);
    // Enumeration is restartable.
    assert_eq!(root.child_names().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_children_exclude_pending_deletion() {
    let (temp, root) = scratch_root();
    std::fs::create_dir(temp.path().join("b")).unwrap();
    std::fs::create_dir(temp.path().join("a")).unwrap();
    let c = root.create_child("c").unwrap();

    root.child("a").unwrap().delete().unwrap();
    c.delete().unwrap();
    assert_eq!(root.child_names().unwrap(), vec!["b"]);
}

#[test]
fn test_children_skip_files_and_layout_documents() {
    let (temp, root) = scratch_root();
    std::fs::write(temp.path().join("plain.txt"), "x").unwrap();
    std::fs::create_dir(temp.path().join(".meta")).unwrap();
    std::fs::create_dir(temp.path().join("group")).unwrap();

    assert_eq!(root.child_names().unwrap(), vec!["group"]);
}

#[test]
fn test_in_memory_child_is_authoritative() {
    let (_temp, root) = scratch_root();
    let created = root.create_child("group").unwrap();
    root.commit().unwrap();

    let listed = root.children().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(std::sync::Arc::ptr_eq(&listed[0], &created));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_children_sorted_union(
        on_disk in prop::collection::btree_set("d[a-z]{0,5}", 0..6),
        in_memory in prop::collection::btree_set("m[a-z]{0,5}", 0..6),
    ) {
        let (temp, root) = scratch_root();
        for name in &on_disk {
            std::fs::create_dir(temp.path().join(name)).unwrap();
        }
        for name in &in_memory {
            root.create_child(name).unwrap();
        }

        let expected: Vec<String> = on_disk
            .union(&in_memory)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        prop_assert_eq!(root.child_names().unwrap(), expected);
    }
}
