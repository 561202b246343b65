//! Library entry points
//!
//! `ScanApi` ties configuration, the tree builder, the manifest codec and the
//! diff engine together. It owns the fingerprint cache and the interrupt flag
//! so repeated scans from one process share both.

use crate::config::ScanConfig;
use crate::diff::{self, DiffResult};
use crate::error::{ApiError, ScanError};
use crate::ignore::IgnoreMatcher;
use crate::manifest::Manifest;
use crate::tree::builder::{ScanStats, TreeBuilder};
use crate::tree::cache::FingerprintCache;
use crate::tree::node::DirNode;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything produced by one scan
#[derive(Debug)]
pub struct ScanReport {
    pub root_path: PathBuf,
    pub tree: DirNode,
    pub manifest: Manifest,
    /// Recoverable per-entry errors; their entries are marked unreadable
    pub errors: Vec<ScanError>,
    pub stats: ScanStats,
}

/// Right-hand side of a diff
#[derive(Debug, Clone)]
pub enum DiffTarget {
    Manifest(Manifest),
    /// Scan this directory and compare against the result
    Root(PathBuf),
}

/// Process-level result classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    NoChanges,
    Changes,
    Failed,
}

impl ScanOutcome {
    pub fn from_diff(result: &DiffResult) -> Self {
        if result.has_changes {
            ScanOutcome::Changes
        } else {
            ScanOutcome::NoChanges
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            ScanOutcome::NoChanges => 0,
            ScanOutcome::Changes => 1,
            ScanOutcome::Failed => 2,
        }
    }
}

/// Scan and diff service
pub struct ScanApi {
    config: ScanConfig,
    cache: Arc<FingerprintCache>,
    interrupt: Arc<AtomicBool>,
    /// Root-relative paths excluded from every scan
    protected: Vec<String>,
}

impl ScanApi {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            cache: Arc::new(FingerprintCache::new()),
            interrupt: Arc::new(AtomicBool::new(false)),
            protected: Vec::new(),
        }
    }

    /// Never track these root-relative paths, regardless of ignore rules.
    pub fn with_protected_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<FingerprintCache> {
        &self.cache
    }

    /// Flag that stops an in-flight scan when set.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Clear a previous interrupt so the next scan can run.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }

    /// Scan `root` using the configured ignore rules.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn scan(&self, root: &Path) -> Result<ScanReport, ApiError> {
        let root_path = crate::tree::path::canonicalize_root(root)?;
        let matcher = IgnoreMatcher::from_scan_config(&root_path, &self.config)?
            .with_protected(&self.protected);
        self.scan_with(&root_path, matcher)
    }

    /// Scan `root` with an explicit matcher.
    pub fn scan_with(&self, root: &Path, matcher: IgnoreMatcher) -> Result<ScanReport, ApiError> {
        let tree = TreeBuilder::new(root)
            .with_matcher(matcher)
            .with_options((&self.config).into())
            .with_concurrency(self.config.worker_count())
            .follow_file_symlinks(self.config.follow_file_symlinks)
            .with_cache(Arc::clone(&self.cache))
            .with_interrupt(Arc::clone(&self.interrupt))
            .build()?;

        let manifest = Manifest::from_tree(&tree.root);
        info!(
            entries = manifest.len(),
            skipped = manifest.skipped_count(),
            root_fingerprint = %manifest.root_fingerprint,
            "Scan complete"
        );

        Ok(ScanReport {
            root_path: tree.root_path,
            tree: tree.root,
            manifest,
            errors: tree.errors,
            stats: tree.stats,
        })
    }

    pub fn diff_manifests(&self, old: &Manifest, new: &Manifest) -> DiffResult {
        diff::diff(old, new)
    }

    /// Diff `old` against a manifest or a fresh scan.
    ///
    /// A missing prior manifest is treated as empty, so every entry is added.
    /// The scan report is returned when the target was scanned.
    pub fn diff(
        &self,
        old: Option<&Manifest>,
        target: DiffTarget,
    ) -> Result<(DiffResult, Option<ScanReport>), ApiError> {
        match target {
            DiffTarget::Manifest(new) => Ok((diff_or_added(old, &new), None)),
            DiffTarget::Root(root) => {
                let (result, report) = self.diff_against_root(old, &root)?;
                Ok((result, Some(report)))
            }
        }
    }

    /// Diff a stored manifest against the live tree under `root`.
    pub fn diff_against_root(
        &self,
        old: Option<&Manifest>,
        root: &Path,
    ) -> Result<(DiffResult, ScanReport), ApiError> {
        let report = self.scan(root)?;
        let result = diff_or_added(old, &report.manifest);
        Ok((result, report))
    }
}

fn diff_or_added(old: Option<&Manifest>, new: &Manifest) -> DiffResult {
    match old {
        Some(old) => diff::diff(old, new),
        None => diff::diff(&empty_manifest(), new),
    }
}

/// Manifest of an empty tree.
pub fn empty_manifest() -> Manifest {
    Manifest::from_tree(&DirNode::empty_root())
}

/// Scan `root` with `matcher` and default limits.
pub fn scan(root: &Path, matcher: IgnoreMatcher) -> Result<Manifest, ScanError> {
    let tree = TreeBuilder::new(root).with_matcher(matcher).build()?;
    Ok(Manifest::from_tree(&tree.root))
}

/// Diff two manifests.
pub fn diff_manifests(old: &Manifest, new: &Manifest) -> DiffResult {
    diff::diff(old, new)
}
