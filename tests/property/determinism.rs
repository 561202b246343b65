//! Property-based tests for determinism guarantees

use mercator::manifest::{self, Manifest};
use mercator::tree::builder::TreeBuilder;
use mercator::tree::hasher;
use mercator::tree::node::{DirNode, FileNode, Node};
use proptest::prelude::*;
use std::collections::BTreeMap;
use tempfile::TempDir;

/// Directory segments never end in `.txt`, file names always do, so no path
/// is both a file and a directory.
fn arb_path() -> impl Strategy<Value = String> {
    (prop::collection::vec("[a-c]", 0..3), "[a-d]").prop_map(|(dirs, file)| {
        let mut parts = dirs;
        parts.push(format!("{}.txt", file));
        parts.join("/")
    })
}

fn arb_files() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(arb_path(), "[a-z ]{0,24}", 0..12)
}

fn leaves(files: &[(String, String)]) -> Vec<Node> {
    files
        .iter()
        .map(|(path, content)| {
            Node::File(FileNode {
                path: path.clone(),
                fingerprint: hasher::content_fingerprint(content.as_bytes()),
                size: content.len() as u64,
                skip_reason: None,
            })
        })
        .collect()
}

fn arb_files_and_shuffle() -> impl Strategy<Value = (Vec<(String, String)>, Vec<(String, String)>)> {
    arb_files().prop_flat_map(|files| {
        let ordered: Vec<(String, String)> = files.into_iter().collect();
        (Just(ordered.clone()), Just(ordered).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn root_independent_of_entry_order((ordered, shuffled) in arb_files_and_shuffle()) {
        let a = DirNode::assemble(leaves(&ordered)).unwrap();
        let b = DirNode::assemble(leaves(&shuffled)).unwrap();
        prop_assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn manifest_entries_determine_root(files in arb_files()) {
        let ordered: Vec<(String, String)> = files.into_iter().collect();
        let tree = DirNode::assemble(leaves(&ordered)).unwrap();
        let flat = Manifest::from_tree(&tree);
        prop_assert_eq!(flat.recompute_root().unwrap(), tree.fingerprint);

        let decoded = manifest::deserialize(flat.to_json().unwrap().as_bytes()).unwrap();
        prop_assert_eq!(decoded, flat);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn filesystem_scan_matches_assembled_tree((ordered, shuffled) in arb_files_and_shuffle()) {
        let temp_dir = TempDir::new().unwrap();
        for (path, content) in &shuffled {
            let full = temp_dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }

        let scanned = TreeBuilder::new(temp_dir.path()).build().unwrap();
        let assembled = DirNode::assemble(leaves(&ordered)).unwrap();
        prop_assert_eq!(scanned.root.fingerprint, assembled.fingerprint);
        prop_assert!(scanned.errors.is_empty());
    }
}
