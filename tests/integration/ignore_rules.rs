//! Ignore rules applied during a scan

use mercator::api::ScanApi;
use mercator::config::ScanConfig;
use mercator::ignore::IgnoreMatcher;
use mercator::tree::builder::TreeBuilder;
use tempfile::TempDir;

use crate::integration::write_file;

fn entries(config: ScanConfig, root: &std::path::Path) -> Vec<String> {
    let report = ScanApi::new(config).scan(root).unwrap();
    report.manifest.entries.keys().cloned().collect()
}

#[test]
fn test_default_deny_list_applies() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "src/main.rs", "fn main() {}");
    write_file(root, ".git/HEAD", "ref: refs/heads/main");
    write_file(root, "node_modules/pkg/index.js", "module.exports = 1");
    write_file(root, "target/debug/out", "bin");
    write_file(root, "Cargo.lock", "# lock");
    write_file(root, ".mercator/manifest.json", "{}");

    assert_eq!(entries(ScanConfig::default(), root), vec!["src/main.rs"]);
}

#[test]
fn test_gitignore_file_at_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, ".gitignore", "*.log\nscratch/\n!keep.log\n");
    write_file(root, "app.log", "noise");
    write_file(root, "keep.log", "signal");
    write_file(root, "scratch/notes.txt", "tmp");
    write_file(root, "src/lib.rs", "");

    let found = entries(ScanConfig::default(), root);
    assert_eq!(found, vec![".gitignore", "keep.log", "src/lib.rs"]);
}

#[test]
fn test_negation_cannot_resurrect_under_pruned_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "generated/keep.txt", "x");
    write_file(root, "generated/drop.txt", "y");
    write_file(root, "main.txt", "z");

    let config = ScanConfig {
        use_default_ignores: false,
        extra_ignores: vec!["generated/".to_string(), "!generated/keep.txt".to_string()],
        ..ScanConfig::default()
    };
    assert_eq!(entries(config, root), vec!["main.txt"]);
}

#[test]
fn test_double_star_and_anchoring() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "docs/a/b/draft.md", "d");
    write_file(root, "docs/final.md", "f");
    write_file(root, "todo.txt", "root todo");
    write_file(root, "nested/todo.txt", "nested todo");

    let config = ScanConfig {
        use_default_ignores: false,
        extra_ignores: vec!["docs/**/draft.md".to_string(), "/todo.txt".to_string()],
        ..ScanConfig::default()
    };
    assert_eq!(entries(config, root), vec!["docs/final.md", "nested/todo.txt"]);
}

#[test]
fn test_extra_patterns_override_ignore_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, ".mercatorignore", "*.dat\n");
    write_file(root, "a.dat", "a");
    write_file(root, "b.dat", "b");

    let config = ScanConfig {
        extra_ignores: vec!["!b.dat".to_string()],
        ..ScanConfig::default()
    };
    assert_eq!(entries(config, root), vec![".mercatorignore", "b.dat"]);
}

#[test]
fn test_ignored_directory_is_not_visited() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "kept.txt", "k");
    write_file(root, "huge/a/b/c/d.txt", "deep");

    let matcher = IgnoreMatcher::builder(root)
        .with_defaults(false)
        .add_pattern("huge/")
        .build()
        .unwrap();
    let tree = TreeBuilder::new(root).with_matcher(matcher).build().unwrap();
    assert_eq!(tree.stats.ignored, 1);
    // root plus nothing under huge/
    assert_eq!(tree.stats.directories, 1);
}
