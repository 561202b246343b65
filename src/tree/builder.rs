//! Tree builder for constructing filesystem Merkle trees
//!
//! Traversal is depth-first. Each directory lists its immediate children,
//! drops ignored ones, and builds the rest in parallel on a bounded rayon
//! pool. Collecting the children is the barrier: the directory's own
//! fingerprint is computed afterwards on one thread from the name-ordered
//! children. Ignored directories are never entered.
//!
//! Per-entry failures do not abort the scan. The entry is kept as an
//! unreadable leaf with a fixed fingerprint and the error is returned next to
//! the tree. Only a missing or unreadable root aborts.

use crate::config::ScanConfig;
use crate::error::{ApiError, ScanError};
use crate::ignore::IgnoreMatcher;
use crate::tree::cache::FingerprintCache;
use crate::tree::fingerprint::{fingerprint_file, FileFingerprint, FingerprintOptions};
use crate::tree::node::{DirNode, FileNode, LinkNode, Node, UnreadableNode};
use crate::tree::path;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, trace, warn};
use walkdir::WalkDir;

const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Counters gathered during one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files: usize,
    pub skipped: usize,
    pub links: usize,
    pub unreadable: usize,
    pub directories: usize,
    pub ignored: usize,
    pub duration: Duration,
}

/// Result of a completed build
#[derive(Debug)]
pub struct ScanTree {
    /// Canonical absolute path of the scanned root
    pub root_path: PathBuf,
    pub root: DirNode,
    /// Recoverable per-entry errors, sorted by message
    pub errors: Vec<ScanError>,
    pub stats: ScanStats,
}

/// Tree builder for constructing filesystem Merkle trees
pub struct TreeBuilder {
    root: PathBuf,
    matcher: IgnoreMatcher,
    options: FingerprintOptions,
    concurrency: usize,
    follow_file_symlinks: bool,
    cache: Option<Arc<FingerprintCache>>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl TreeBuilder {
    /// Create a new tree builder for the given root path.
    ///
    /// Starts with no ignore rules, default limits and one worker per CPU.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = ScanConfig::default();
        Self {
            root: root.into(),
            matcher: IgnoreMatcher::empty(),
            options: FingerprintOptions::from(&defaults),
            concurrency: defaults.worker_count(),
            follow_file_symlinks: defaults.follow_file_symlinks,
            cache: None,
            interrupt: None,
        }
    }

    /// Builder configured from a scan configuration, including its ignore rules.
    pub fn from_config(root: impl Into<PathBuf>, config: &ScanConfig) -> Result<Self, ApiError> {
        let root = root.into();
        let matcher = IgnoreMatcher::from_scan_config(&root, config)?;
        Ok(Self::new(root)
            .with_matcher(matcher)
            .with_options(FingerprintOptions::from(config))
            .with_concurrency(config.worker_count())
            .follow_file_symlinks(config.follow_file_symlinks))
    }

    pub fn with_matcher(mut self, matcher: IgnoreMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_options(mut self, options: FingerprintOptions) -> Self {
        self.options = options;
        self
    }

    /// Bound the worker pool. Values below one are treated as one.
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    pub fn follow_file_symlinks(mut self, follow: bool) -> Self {
        self.follow_file_symlinks = follow;
        self
    }

    /// Reuse fingerprints from a caller-owned cache.
    pub fn with_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Stop at the next entry boundary once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Build the complete Merkle tree from the filesystem
    #[instrument(skip(self), fields(root = %self.root.display(), workers = self.concurrency))]
    pub fn build(&self) -> Result<ScanTree, ScanError> {
        let start = Instant::now();
        info!("Starting tree build");

        let root_path = path::canonicalize_root(&self.root)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("mercator-scan-{}", i))
            .build()
            .map_err(|e| ScanError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        let walk = Walk {
            builder: self,
            errors: Mutex::new(Vec::new()),
            counters: Counters::default(),
        };

        let root = pool.install(|| walk.build_dir(&root_path, String::new()))?;

        let mut errors = walk.errors.into_inner();
        errors.sort_by_key(|e| e.to_string());

        let mut stats = walk.counters.snapshot();
        stats.duration = start.elapsed();

        info!(
            files = stats.files,
            skipped = stats.skipped,
            unreadable = stats.unreadable,
            ignored = stats.ignored,
            errors = errors.len(),
            root_fingerprint = %root.fingerprint,
            duration_ms = stats.duration.as_millis() as u64,
            "Tree build completed"
        );

        Ok(ScanTree {
            root_path,
            root,
            errors,
            stats,
        })
    }

    /// Build the tree and return only its root fingerprint.
    pub fn compute_root(&self) -> Result<crate::types::Fingerprint, ScanError> {
        Ok(self.build()?.root.fingerprint)
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn fingerprint(&self, abs: &Path) -> Result<FileFingerprint, ScanError> {
        let Some(cache) = &self.cache else {
            return fingerprint_file(abs, &self.options);
        };
        let metadata = std::fs::metadata(abs).map_err(|e| ScanError::from_io(abs, &e))?;
        if let Some(hit) = cache.lookup(abs, &metadata, &self.options) {
            trace!(path = %abs.display(), "Fingerprint cache hit");
            return Ok(hit);
        }
        let computed = fingerprint_file(abs, &self.options)?;
        cache.store(abs, &metadata, &self.options, computed);
        Ok(computed)
    }
}

/// Build a tree for `root` using `matcher` and default limits.
pub fn build_tree(
    root: &Path,
    matcher: IgnoreMatcher,
) -> Result<(DirNode, Vec<ScanError>), ScanError> {
    let tree = TreeBuilder::new(root).with_matcher(matcher).build()?;
    Ok((tree.root, tree.errors))
}

#[derive(Default)]
struct Counters {
    files: AtomicUsize,
    skipped: AtomicUsize,
    links: AtomicUsize,
    unreadable: AtomicUsize,
    directories: AtomicUsize,
    ignored: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ScanStats {
        ScanStats {
            files: self.files.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            links: self.links.load(Ordering::Relaxed),
            unreadable: self.unreadable.load(Ordering::Relaxed),
            directories: self.directories.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            duration: Duration::ZERO,
        }
    }
}

/// Child of a directory, classified before ignore filtering
enum Candidate {
    Dir,
    File,
    /// Symlink to a directory, or any symlink when file links are not followed
    Link,
    /// Symlink whose target could not be resolved
    Broken(std::io::Error),
    /// Entry that failed while listing its parent
    Failed(ScanError),
}

struct Child {
    name: String,
    relative: String,
    absolute: PathBuf,
    kind: Candidate,
}

/// Shared state for one traversal
struct Walk<'a> {
    builder: &'a TreeBuilder,
    errors: Mutex<Vec<ScanError>>,
    counters: Counters,
}

impl Walk<'_> {
    fn record(&self, err: ScanError) {
        warn!(error = %err, "Recording unreadable entry");
        Counters::bump(&self.counters.unreadable);
        self.errors.lock().push(err);
    }

    fn build_dir(&self, abs: &Path, relative: String) -> Result<DirNode, ScanError> {
        if self.builder.interrupted() {
            return Err(ScanError::Interrupted);
        }

        let children = self.list_children(abs, &relative)?;
        debug!(path = %relative, children = children.len(), "Building directory");

        // collect() waits for every child before aggregation starts
        let built: Vec<Option<(String, Node)>> = children
            .into_par_iter()
            .map(|child| self.build_child(child))
            .collect::<Result<_, _>>()?;

        let children: BTreeMap<String, Node> = built.into_iter().flatten().collect();
        Counters::bump(&self.counters.directories);
        Ok(DirNode::from_children(relative, children))
    }

    fn list_children(&self, abs: &Path, relative: &str) -> Result<Vec<Child>, ScanError> {
        let listing = WalkDir::new(abs)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut children = Vec::new();
        for result in listing {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(walk_error(abs, err));
                }
                Err(err) => {
                    let Some(name) = err.path().and_then(|p| p.file_name()).map(path::normalize_name)
                    else {
                        self.record(walk_error(abs, err));
                        continue;
                    };
                    let absolute = abs.join(&name);
                    children.push(Child {
                        relative: path::join(relative, &name),
                        name,
                        kind: Candidate::Failed(walk_error(&absolute, err)),
                        absolute,
                    });
                    continue;
                }
            };

            let name = path::normalize_name(entry.file_name());
            let child_relative = path::join(relative, &name);
            let absolute = entry.path().to_path_buf();
            let file_type = entry.file_type();

            let (kind, is_dir) = if file_type.is_symlink() {
                match std::fs::metadata(&absolute) {
                    Ok(target) if target.is_dir() => (Candidate::Link, true),
                    Ok(target) if target.is_file() => {
                        if self.builder.follow_file_symlinks {
                            (Candidate::File, false)
                        } else {
                            (Candidate::Link, false)
                        }
                    }
                    Ok(_) => {
                        trace!(path = %child_relative, "Skipping special file behind symlink");
                        continue;
                    }
                    Err(e) => (Candidate::Broken(e), false),
                }
            } else if file_type.is_dir() {
                (Candidate::Dir, true)
            } else if file_type.is_file() {
                (Candidate::File, false)
            } else {
                trace!(path = %child_relative, "Skipping special file");
                continue;
            };

            if self.builder.matcher.should_ignore(&child_relative, is_dir) {
                trace!(path = %child_relative, "Ignored");
                Counters::bump(&self.counters.ignored);
                continue;
            }

            children.push(Child {
                name,
                relative: child_relative,
                absolute,
                kind,
            });
        }
        Ok(children)
    }

    fn build_child(&self, child: Child) -> Result<Option<(String, Node)>, ScanError> {
        if self.builder.interrupted() {
            return Err(ScanError::Interrupted);
        }

        let Child {
            name,
            relative,
            absolute,
            kind,
        } = child;

        let node = match kind {
            Candidate::Dir => match self.build_dir(&absolute, relative.clone()) {
                // Empty directories contribute nothing to their parent
                Ok(dir) if dir.is_empty() => return Ok(None),
                Ok(dir) => Node::Directory(dir),
                Err(ScanError::Interrupted) => return Err(ScanError::Interrupted),
                Err(err) => {
                    self.record(err);
                    Node::Unreadable(UnreadableNode::new(relative))
                }
            },
            Candidate::File => match self.builder.fingerprint(&absolute) {
                Ok(fp) => {
                    trace!(path = %relative, fingerprint = %fp.fingerprint, "Fingerprinted file");
                    Counters::bump(&self.counters.files);
                    if fp.is_skipped() {
                        Counters::bump(&self.counters.skipped);
                    }
                    Node::File(FileNode {
                        path: relative,
                        fingerprint: fp.fingerprint,
                        size: fp.size,
                        skip_reason: fp.skip_reason,
                    })
                }
                Err(err) => {
                    self.record(err);
                    Node::Unreadable(UnreadableNode::new(relative))
                }
            },
            Candidate::Link => match std::fs::read_link(&absolute) {
                Ok(target) => {
                    Counters::bump(&self.counters.links);
                    let target = target.to_string_lossy().replace('\\', "/");
                    Node::Link(LinkNode::new(relative, target))
                }
                Err(e) => {
                    self.record(ScanError::from_io(&absolute, &e));
                    Node::Unreadable(UnreadableNode::new(relative))
                }
            },
            Candidate::Broken(e) => {
                self.record(ScanError::UnreadableFile {
                    path: absolute,
                    reason: format!("symlink target unavailable: {}", e),
                });
                Node::Unreadable(UnreadableNode::new(relative))
            }
            Candidate::Failed(err) => {
                self.record(err);
                Node::Unreadable(UnreadableNode::new(relative))
            }
        };

        Ok(Some((name, node)))
    }
}

fn walk_error(path: &Path, err: walkdir::Error) -> ScanError {
    match err.io_error() {
        Some(io) => ScanError::from_io(err.path().unwrap_or(path), io),
        None => ScanError::UnreadableFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    }
}
