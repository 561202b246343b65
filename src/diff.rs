//! Diff engine
//!
//! Comparing two manifests starts with the root fingerprints: equal roots mean
//! equal trees and the per-entry comparison is skipped. Otherwise entries are
//! compared by path. Localization walks both trees from the root and only
//! descends into directories whose fingerprints differ.

use crate::error::ScanError;
use crate::manifest::Manifest;
use crate::tree::node::{DirNode, Node};
use crate::tree::path;
use crate::types::Fingerprint;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, instrument};

/// Paths that differ between two manifests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub changed: BTreeSet<String>,
    pub has_changes: bool,
    /// Paths present in both manifests with equal fingerprints
    pub unchanged_count: usize,
    pub previous_root: Fingerprint,
    pub current_root: Fingerprint,
}

impl DiffResult {
    fn unchanged(old: &Manifest, new: &Manifest) -> Self {
        Self {
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            changed: BTreeSet::new(),
            has_changes: false,
            unchanged_count: new.entries.len(),
            previous_root: old.root_fingerprint,
            current_root: new.root_fingerprint,
        }
    }

    /// Number of added, removed and changed paths together.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Every differing path with its status, in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ChangeStatus)> {
        let mut all: Vec<(&str, ChangeStatus)> = self
            .added
            .iter()
            .map(|p| (p.as_str(), ChangeStatus::Added))
            .chain(self.removed.iter().map(|p| (p.as_str(), ChangeStatus::Removed)))
            .chain(self.changed.iter().map(|p| (p.as_str(), ChangeStatus::Changed)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all.into_iter()
    }
}

/// How a path or subtree differs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Removed,
    Changed,
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Removed => "removed",
            ChangeStatus::Changed => "changed",
        };
        f.write_str(s)
    }
}

/// A subtree whose aggregate fingerprint differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtreeChange {
    /// Root-relative path; empty for the root itself
    pub path: String,
    pub status: ChangeStatus,
}

/// Compare two manifests.
#[instrument(skip_all, fields(old_entries = old.entries.len(), new_entries = new.entries.len()))]
pub fn diff(old: &Manifest, new: &Manifest) -> DiffResult {
    let roots_differ = old.root_fingerprint != new.root_fingerprint;
    if !roots_differ {
        debug!("Root fingerprints match");
        return DiffResult::unchanged(old, new);
    }

    let mut added = BTreeSet::new();
    let mut removed = BTreeSet::new();
    let mut changed = BTreeSet::new();
    let mut unchanged_count = 0;

    for (entry_path, new_entry) in &new.entries {
        match old.entries.get(entry_path) {
            None => {
                added.insert(entry_path.clone());
            }
            Some(old_entry) if old_entry.fingerprint != new_entry.fingerprint => {
                changed.insert(entry_path.clone());
            }
            Some(_) => unchanged_count += 1,
        }
    }
    for entry_path in old.entries.keys() {
        if !new.entries.contains_key(entry_path) {
            removed.insert(entry_path.clone());
        }
    }

    let has_changes = !(added.is_empty() && removed.is_empty() && changed.is_empty());
    if has_changes != roots_differ {
        error!(
            previous_root = %old.root_fingerprint,
            current_root = %new.root_fingerprint,
            "Root fingerprints differ but no entry changed"
        );
    }
    debug_assert_eq!(
        has_changes, roots_differ,
        "root fingerprint inequality must match entry-level changes"
    );

    debug!(
        added = added.len(),
        removed = removed.len(),
        changed = changed.len(),
        unchanged = unchanged_count,
        "Diff computed"
    );

    DiffResult {
        added,
        removed,
        changed,
        has_changes,
        unchanged_count,
        previous_root: old.root_fingerprint,
        current_root: new.root_fingerprint,
    }
}

/// Subtrees at `depth` whose fingerprints differ between two manifests.
///
/// Depth 0 reports the root alone. Leaves shallower than `depth` are
/// reported at their own path.
pub fn localize(
    old: &Manifest,
    new: &Manifest,
    depth: usize,
) -> Result<Vec<SubtreeChange>, ScanError> {
    if old.root_fingerprint == new.root_fingerprint {
        return Ok(Vec::new());
    }
    Ok(localize_trees(&old.to_tree()?, &new.to_tree()?, depth))
}

/// Tree form of [`localize`].
pub fn localize_trees(old: &DirNode, new: &DirNode, depth: usize) -> Vec<SubtreeChange> {
    let mut out = Vec::new();
    if old.fingerprint == new.fingerprint {
        return out;
    }
    if depth == 0 {
        out.push(SubtreeChange {
            path: String::new(),
            status: ChangeStatus::Changed,
        });
        return out;
    }
    compare_children(old, new, depth - 1, &mut out);
    out
}

fn compare_children(old: &DirNode, new: &DirNode, remaining: usize, out: &mut Vec<SubtreeChange>) {
    let mut names: BTreeMap<&str, (Option<&Node>, Option<&Node>)> = BTreeMap::new();
    for (name, node) in &old.children {
        names.entry(name.as_str()).or_default().0 = Some(node);
    }
    for (name, node) in &new.children {
        names.entry(name.as_str()).or_default().1 = Some(node);
    }

    for (name, pair) in names {
        let child_path = path::join(&new.path, name);
        match pair {
            (Some(before), Some(after)) if before.fingerprint() == after.fingerprint() => {}
            (Some(Node::Directory(before)), Some(Node::Directory(after))) if remaining > 0 => {
                compare_children(before, after, remaining - 1, out);
            }
            (Some(_), Some(_)) => out.push(SubtreeChange {
                path: child_path,
                status: ChangeStatus::Changed,
            }),
            (None, Some(_)) => out.push(SubtreeChange {
                path: child_path,
                status: ChangeStatus::Added,
            }),
            (Some(_), None) => out.push(SubtreeChange {
                path: child_path,
                status: ChangeStatus::Removed,
            }),
            (None, None) => {}
        }
    }
}
