//! Integration tests for tree building determinism

use mercator::ignore::IgnoreMatcher;
use mercator::manifest::Manifest;
use mercator::tree::builder::TreeBuilder;
use mercator::tree::node::Node;
use std::fs;
use tempfile::TempDir;

use crate::integration::write_file;

/// Test that the same filesystem produces the same root hash
#[test]
fn test_same_filesystem_same_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();

    write_file(&root, "file1.txt", "content1");
    write_file(&root, "file2.txt", "content2");
    write_file(&root, "dir1/file3.txt", "content3");

    let builder = TreeBuilder::new(root.clone());
    let root1 = builder.compute_root().unwrap();
    let root2 = builder.compute_root().unwrap();

    assert_eq!(root1, root2);
}

/// Same content created in a different order hashes identically
#[test]
fn test_creation_order_does_not_matter() {
    let forward = TempDir::new().unwrap();
    let reverse = TempDir::new().unwrap();
    let files = [
        ("zeta.txt", "z"),
        ("alpha/one.txt", "1"),
        ("alpha/two.txt", "2"),
        ("Mixed/Case.txt", "m"),
    ];

    for (path, content) in files {
        write_file(forward.path(), path, content);
    }
    for (path, content) in files.iter().rev() {
        write_file(reverse.path(), path, content);
    }

    let a = TreeBuilder::new(forward.path()).build().unwrap();
    let b = TreeBuilder::new(reverse.path()).build().unwrap();
    assert_eq!(a.root.fingerprint, b.root.fingerprint);

    let ma = Manifest::from_tree(&a.root);
    let mb = Manifest::from_tree(&b.root);
    assert_eq!(ma.entries, mb.entries);
}

/// Root fingerprint does not depend on where the tree lives
#[test]
fn test_location_independent() {
    let one = TempDir::new().unwrap();
    let two = TempDir::new().unwrap();
    write_file(one.path(), "src/lib.rs", "pub fn f() {}");
    write_file(two.path(), "src/lib.rs", "pub fn f() {}");

    assert_eq!(
        TreeBuilder::new(one.path()).compute_root().unwrap(),
        TreeBuilder::new(two.path()).compute_root().unwrap()
    );
}

/// Test that file content changes produce different root hashes
#[test]
fn test_file_content_change_different_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();

    fs::write(root.join("test.txt"), "content1").unwrap();

    let builder = TreeBuilder::new(root.clone());
    let root1 = builder.compute_root().unwrap();

    fs::write(root.join("test.txt"), "content2").unwrap();

    let root2 = builder.compute_root().unwrap();
    assert_ne!(root1, root2);
}

/// Renaming a file changes the root even though content is the same
#[test]
fn test_rename_different_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    fs::write(root.join("before.txt"), "same").unwrap();

    let builder = TreeBuilder::new(root.clone());
    let root1 = builder.compute_root().unwrap();

    fs::rename(root.join("before.txt"), root.join("after.txt")).unwrap();
    let root2 = builder.compute_root().unwrap();
    assert_ne!(root1, root2);
}

/// Manifest entries rebuild exactly the scanned root
#[test]
fn test_manifest_recomputes_scanned_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.txt", "hello");
    write_file(root, "b/c.txt", "world");
    write_file(root, "b/d/e.txt", "deep");
    fs::create_dir_all(root.join("empty/nested")).unwrap();

    let tree = TreeBuilder::new(root).build().unwrap();
    let manifest = Manifest::from_tree(&tree.root);
    assert_eq!(manifest.recompute_root().unwrap(), tree.root.fingerprint);
    assert!(tree.root.find("empty").is_none());
}

/// A wide tree builds the same with one worker or many
#[test]
fn test_parallel_build_matches_serial() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for d in 0..8 {
        for f in 0..16 {
            write_file(root, &format!("d{}/sub{}/f{}.txt", d, f % 3, f), format!("{}-{}", d, f));
        }
    }

    let serial = TreeBuilder::new(root)
        .with_matcher(IgnoreMatcher::empty())
        .with_concurrency(1)
        .build()
        .unwrap();
    let parallel = TreeBuilder::new(root)
        .with_matcher(IgnoreMatcher::empty())
        .with_concurrency(6)
        .build()
        .unwrap();

    assert_eq!(serial.root.fingerprint, parallel.root.fingerprint);
    assert_eq!(serial.root.leaf_count(), 128);
    assert_eq!(parallel.stats.files, 128);
}

#[cfg(unix)]
#[test]
fn test_unreadable_marker_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "ok.txt", "ok");
    std::os::unix::fs::symlink(root.join("missing-target"), root.join("broken")).unwrap();

    let first = TreeBuilder::new(root).build().unwrap();
    let second = TreeBuilder::new(root).build().unwrap();
    assert_eq!(first.root.fingerprint, second.root.fingerprint);
    assert_eq!(first.errors.len(), 1);
    assert!(matches!(first.root.find("broken"), Some(Node::Unreadable(_))));

    let manifest = Manifest::from_tree(&first.root);
    assert!(manifest.entries.contains_key("broken"));
    assert_eq!(manifest.recompute_root().unwrap(), first.root.fingerprint);
}
