//! End-to-end scan and diff scenarios

use mercator::api::{ScanApi, ScanOutcome};
use mercator::config::ScanConfig;
use mercator::diff::diff;
use std::collections::BTreeSet;
use std::fs;
use std::time::{Duration, SystemTime};

use crate::integration::{scenario_root, write_file};

fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn api() -> ScanApi {
    ScanApi::new(ScanConfig::default())
}

/// Scenario A: unchanged rescans match; an edit is reported as changed
#[test]
fn test_edit_reported_as_changed() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let api = api();

    let first = api.scan(root).unwrap();
    let second = api.scan(root).unwrap();
    assert_eq!(first.manifest.root_fingerprint, second.manifest.root_fingerprint);
    assert_eq!(first.manifest.entries, second.manifest.entries);

    fs::write(root.join("a.txt"), "hello!").unwrap();
    let edited = api.scan(root).unwrap();
    let result = diff(&first.manifest, &edited.manifest);

    assert_eq!(result.changed, set(&["a.txt"]));
    assert!(result.added.is_empty());
    assert!(result.removed.is_empty());
    assert!(result.has_changes);
    assert_eq!(result.unchanged_count, 1);
    assert_eq!(ScanOutcome::from_diff(&result), ScanOutcome::Changes);
}

/// Scenario B: a new file is the only addition
#[test]
fn test_new_file_reported_as_added() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let api = api();

    let before = api.scan(root).unwrap();
    write_file(root, "b/d.txt", "new");
    let after = api.scan(root).unwrap();

    let result = diff(&before.manifest, &after.manifest);
    assert_eq!(result.added, set(&["b/d.txt"]));
    assert!(result.changed.is_empty());
    assert!(result.removed.is_empty());
}

/// Scenario C: deleting a.txt leaves b/ untouched
#[test]
fn test_deleted_file_reported_as_removed() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let api = api();

    let before = api.scan(root).unwrap();
    fs::remove_file(root.join("a.txt")).unwrap();
    let after = api.scan(root).unwrap();

    let result = diff(&before.manifest, &after.manifest);
    assert_eq!(result.removed, set(&["a.txt"]));
    assert!(result.added.is_empty());
    assert!(result.changed.is_empty());

    assert_eq!(
        before.tree.find("b").unwrap().fingerprint(),
        after.tree.find("b").unwrap().fingerprint()
    );
}

/// Scenario D: a large binary with a new mtime but same size is unchanged
#[test]
fn test_large_binary_unchanged_despite_mtime() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let mut blob = vec![0xABu8; 4096];
    blob[10] = 0;
    write_file(root, "assets/blob.dat", &blob);

    let config = ScanConfig {
        max_file_size: 1024,
        ..ScanConfig::default()
    };
    let api = ScanApi::new(config);
    let before = api.scan(root).unwrap();
    assert!(before.manifest.entries["assets/blob.dat"].skipped);

    let earlier = SystemTime::now() - Duration::from_secs(3600);
    fs::OpenOptions::new()
        .write(true)
        .open(root.join("assets/blob.dat"))
        .unwrap()
        .set_modified(earlier)
        .unwrap();

    let after = api.scan(root).unwrap();
    let result = diff(&before.manifest, &after.manifest);
    assert!(!result.has_changes);
    assert_eq!(before.manifest.root_fingerprint, after.manifest.root_fingerprint);
}

/// One byte changes the file, its ancestors and the root, but no sibling
#[test]
fn test_single_byte_edit_propagates_to_ancestors_only() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    write_file(root, "b/e/deep.txt", "deep");
    write_file(root, "z/sibling.txt", "sibling");
    let api = api();

    let before = api.scan(root).unwrap();
    write_file(root, "b/e/deep.txt", "deeP");
    let after = api.scan(root).unwrap();

    for changed in ["b/e/deep.txt", "b/e", "b"] {
        assert_ne!(
            before.tree.find(changed).unwrap().fingerprint(),
            after.tree.find(changed).unwrap().fingerprint(),
            "{} should change",
            changed
        );
    }
    assert_ne!(before.tree.fingerprint, after.tree.fingerprint);

    for unchanged in ["a.txt", "b/c.txt", "z", "z/sibling.txt"] {
        assert_eq!(
            before.tree.find(unchanged).unwrap().fingerprint(),
            after.tree.find(unchanged).unwrap().fingerprint(),
            "{} should not change",
            unchanged
        );
    }
}

#[test]
fn test_diff_against_root_reports_outcomes() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let api = api();
    let baseline = api.scan(root).unwrap().manifest;

    let (same, _) = api.diff_against_root(Some(&baseline), root).unwrap();
    assert_eq!(ScanOutcome::from_diff(&same), ScanOutcome::NoChanges);
    assert_eq!(same.unchanged_count, baseline.len());

    write_file(root, "c.txt", "more");
    let (changed, report) = api.diff_against_root(Some(&baseline), root).unwrap();
    assert_eq!(ScanOutcome::from_diff(&changed), ScanOutcome::Changes);
    assert_eq!(changed.current_root, report.manifest.root_fingerprint);
    assert_eq!(changed.previous_root, baseline.root_fingerprint);
}

#[test]
fn test_missing_root_is_failure() {
    let temp_dir = scenario_root();
    let missing = temp_dir.path().join("does-not-exist");
    let err = api().scan(&missing).unwrap_err();
    assert!(matches!(
        err,
        mercator::ApiError::Scan(mercator::ScanError::RootNotFound(_))
    ));
}

#[test]
fn test_root_that_is_a_file_is_failure() {
    let temp_dir = scenario_root();
    let err = api().scan(&temp_dir.path().join("a.txt")).unwrap_err();
    assert!(matches!(
        err,
        mercator::ApiError::Scan(mercator::ScanError::RootNotDirectory(_))
    ));
}
