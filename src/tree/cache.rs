//! Fingerprint cache for repeated scans within one process
//!
//! The cache is owned by the caller and handed to the tree builder; there is
//! no process-wide instance. An entry is reused only when the file's size and
//! modification time and the fingerprinting limits all match what was cached.
//! Files modified within [`RACY_WINDOW`] of being cached are never stored,
//! since a same-size edit in the same timestamp tick would go unnoticed.

use crate::tree::fingerprint::{FileFingerprint, FingerprintOptions};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

/// Modification times this close to "now" are considered ambiguous.
pub const RACY_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    size: u64,
    modified: SystemTime,
    max_file_size: u64,
    sniff_bytes: usize,
}

impl CacheKey {
    fn new(metadata: &Metadata, options: &FingerprintOptions) -> Option<Self> {
        Some(Self {
            size: metadata.len(),
            modified: metadata.modified().ok()?,
            max_file_size: options.max_file_size,
            sniff_bytes: options.sniff_bytes,
        })
    }
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Path-keyed cache of file fingerprints, validated by `(size, mtime)`
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: Mutex<HashMap<PathBuf, (CacheKey, FileFingerprint)>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached fingerprint for `path` if its metadata still matches.
    pub fn lookup(
        &self,
        path: &Path,
        metadata: &Metadata,
        options: &FingerprintOptions,
    ) -> Option<FileFingerprint> {
        let found = CacheKey::new(metadata, options).and_then(|key| {
            let entries = self.entries.lock();
            entries
                .get(path)
                .filter(|(cached_key, _)| *cached_key == key)
                .map(|(_, fp)| *fp)
        });
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Remember a freshly computed fingerprint.
    ///
    /// Returns false when the metadata is too ambiguous to cache.
    pub fn store(
        &self,
        path: &Path,
        metadata: &Metadata,
        options: &FingerprintOptions,
        fingerprint: FileFingerprint,
    ) -> bool {
        let Some(key) = CacheKey::new(metadata, options) else {
            return false;
        };
        let settled = SystemTime::now()
            .duration_since(key.modified)
            .map(|age| age >= RACY_WINDOW)
            .unwrap_or(false);
        let mut entries = self.entries.lock();
        if !settled {
            entries.remove(path);
            return false;
        }
        entries.insert(path.to_path_buf(), (key, fingerprint));
        true
    }

    /// Drop a single path.
    pub fn invalidate(&self, path: &Path) {
        self.entries.lock().remove(path);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
