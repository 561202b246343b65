//! Manifest persistence and the fallback to a full scan

use mercator::api::{empty_manifest, ScanApi};
use mercator::config::ScanConfig;
use mercator::diff::diff;
use mercator::error::ScanError;
use mercator::manifest::{self, Manifest, MANIFEST_VERSION};
use std::fs;

use crate::integration::{scenario_root, write_file};

#[test]
fn test_saved_manifest_diffs_clean_against_rescan() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let api = ScanApi::new(ScanConfig::default());

    let report = api.scan(root).unwrap();
    let path = root.join(".mercator").join("manifest.json");
    report.manifest.save(&path).unwrap();

    let loaded = Manifest::load(&path).unwrap();
    assert_eq!(loaded.version, MANIFEST_VERSION);
    assert_eq!(loaded.root_fingerprint, report.manifest.root_fingerprint);

    // The manifest directory itself is ignored by default
    let (result, _) = api.diff_against_root(Some(&loaded), root).unwrap();
    assert!(!result.has_changes);
}

#[test]
fn test_manifest_json_shape() {
    let temp_dir = scenario_root();
    let report = ScanApi::new(ScanConfig::default())
        .scan(temp_dir.path())
        .unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&report.manifest.to_json().unwrap()).unwrap();

    assert_eq!(value["version"], 1);
    assert_eq!(value["root_fingerprint"].as_str().unwrap().len(), 64);
    assert!(value["scanned_at"].is_string());
    let entry = &value["entries"]["b/c.txt"];
    assert_eq!(entry["size"], 5);
    assert_eq!(entry["skipped"], false);
    assert_eq!(
        entry["fingerprint"].as_str().unwrap(),
        blake3::hash(b"world").to_hex().as_str()
    );
}

#[test]
fn test_overwrite_is_atomic_replacement() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let api = ScanApi::new(ScanConfig::default());
    let path = root.join("snap.json");

    let first = api.scan(root).unwrap().manifest;
    first.save(&path).unwrap();
    write_file(root, "new.txt", "n");
    let second = api.scan(root).unwrap().manifest;
    second.save(&path).unwrap();

    let loaded = Manifest::load(&path).unwrap();
    assert_eq!(loaded.root_fingerprint, second.root_fingerprint);
    assert!(!root.join("snap.json.tmp").exists());
}

#[test]
fn test_corrupt_or_incompatible_manifest_falls_back() {
    let temp_dir = scenario_root();
    let root = temp_dir.path();
    let path = root.join("manifest.json");

    fs::write(&path, r#"{"version": 1, "root_fingerprint": "zz"}"#).unwrap();
    assert!(matches!(
        Manifest::load(&path).unwrap_err(),
        ScanError::ManifestCorrupt(_)
    ));
    assert!(Manifest::load_or_none(&path).unwrap().is_none());

    let mut value: serde_json::Value =
        serde_json::from_str(&empty_manifest().to_json().unwrap()).unwrap();
    value["version"] = serde_json::json!(2);
    fs::write(&path, value.to_string()).unwrap();
    assert!(matches!(
        Manifest::load(&path).unwrap_err(),
        ScanError::ManifestIncompatibleVersion { found: 2, .. }
    ));
    assert!(Manifest::load_or_none(&path).unwrap().is_none());

    // No prior manifest: everything is added
    let api = ScanApi::new(ScanConfig::default());
    let (result, _) = api.diff_against_root(None, root).unwrap();
    assert!(result.added.contains("a.txt"));
    assert!(result.added.contains("b/c.txt"));
}

#[test]
fn test_decode_rejects_root_mismatch() {
    let temp_dir = scenario_root();
    let report = ScanApi::new(ScanConfig::default())
        .scan(temp_dir.path())
        .unwrap();
    let mut tampered = report.manifest.clone();
    tampered.entries.remove("a.txt");

    let err = manifest::deserialize(tampered.to_json().unwrap().as_bytes()).unwrap_err();
    assert!(matches!(err, ScanError::ManifestCorrupt(_)));
    assert!(err.is_manifest_error());
}

#[test]
fn test_idempotent_diff_of_loaded_manifest() {
    let temp_dir = scenario_root();
    let report = ScanApi::new(ScanConfig::default())
        .scan(temp_dir.path())
        .unwrap();
    let decoded = manifest::deserialize(report.manifest.to_json().unwrap().as_bytes()).unwrap();
    let result = diff(&decoded, &decoded);
    assert!(!result.has_changes);
    assert_eq!(result.change_count(), 0);
}
