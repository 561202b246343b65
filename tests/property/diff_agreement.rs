//! Fast-path and slow-path diff agreement

use mercator::diff::diff;
use mercator::manifest::Manifest;
use mercator::tree::hasher;
use mercator::tree::node::{DirNode, FileNode, Node};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn arb_manifest() -> impl Strategy<Value = Manifest> {
    let path = (prop::collection::vec("[a-b]", 0..3), "[a-c]")
        .prop_map(|(mut dirs, file)| {
            dirs.push(format!("{}.txt", file));
            dirs.join("/")
        });
    prop::collection::btree_map(path, 0u8..4, 0..10).prop_map(|files: BTreeMap<String, u8>| {
        let leaves = files.into_iter().map(|(path, content)| {
            Node::File(FileNode {
                path,
                fingerprint: hasher::content_fingerprint(&[content]),
                size: 1,
                skip_reason: None,
            })
        });
        Manifest::from_tree(&DirNode::assemble(leaves).unwrap())
    })
}

proptest! {
    #[test]
    fn has_changes_matches_root_inequality(old in arb_manifest(), new in arb_manifest()) {
        let result = diff(&old, &new);
        let roots_differ = old.root_fingerprint != new.root_fingerprint;
        prop_assert_eq!(result.has_changes, roots_differ);
        prop_assert_eq!(result.change_count() > 0, roots_differ);
    }

    #[test]
    fn diff_sets_partition_entries(old in arb_manifest(), new in arb_manifest()) {
        let result = diff(&old, &new);
        if result.has_changes {
            for path in &result.added {
                prop_assert!(new.entries.contains_key(path) && !old.entries.contains_key(path));
            }
            for path in &result.removed {
                prop_assert!(old.entries.contains_key(path) && !new.entries.contains_key(path));
            }
            for path in &result.changed {
                prop_assert_ne!(old.entries[path].fingerprint, new.entries[path].fingerprint);
            }
            prop_assert_eq!(
                result.added.len() + result.changed.len() + result.unchanged_count,
                new.entries.len()
            );
        }
    }

    #[test]
    fn diff_with_self_is_empty(manifest in arb_manifest()) {
        let result = diff(&manifest, &manifest);
        prop_assert!(!result.has_changes);
        prop_assert_eq!(result.change_count(), 0);
        prop_assert_eq!(result.unchanged_count, manifest.entries.len());
    }
}
