//! Content fingerprinting for individual files
//!
//! Files are streamed through BLAKE3 so memory stays bounded regardless of
//! size. Files over the size ceiling, or whose leading sample looks binary,
//! are fingerprinted from their size alone and flagged as skipped: two
//! different skipped files of equal size are indistinguishable.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::tree::hasher;
use crate::tree::node::SkipReason;
use crate::types::Fingerprint;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Extensions treated as text without sniffing.
const TEXT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "vue", "svelte", "html", "htm", "css", "scss", "sass",
    "less", "json", "yaml", "yml", "toml", "xml", "md", "mdx", "txt", "rst", "sh", "bash",
    "zsh", "fish", "ps1", "bat", "cmd", "sql", "graphql", "gql", "proto", "go", "rs", "rb",
    "php", "java", "kt", "kts", "scala", "clj", "cljs", "edn", "ex", "exs", "erl", "hrl",
    "hs", "ml", "mli", "fs", "fsx", "cs", "vb", "swift", "m", "mm", "h", "hpp", "c", "cpp",
    "cc", "cxx", "r", "jl", "lua", "vim", "el", "lisp", "scm", "rkt", "zig", "nim", "d",
    "dart", "v", "sv", "vhd", "vhdl", "tf", "hcl", "dockerfile", "cmake", "gradle", "groovy",
    "rake", "gemspec", "cabal", "nix", "dhall", "jsonc", "json5", "ini", "cfg", "conf",
    "config", "env", "gitignore", "gitattributes", "editorconfig",
];

/// File names (lowercased) treated as text without sniffing.
const TEXT_NAMES: &[&str] = &[
    "readme", "license", "licence", "changelog", "authors", "contributors", "copying",
    "dockerfile", "containerfile", "makefile", "rakefile", "gemfile", "procfile", "brewfile",
    "vagrantfile", "justfile", "taskfile",
];

/// Limits applied while fingerprinting a single file
#[derive(Debug, Clone, Copy)]
pub struct FingerprintOptions {
    /// Files larger than this are fingerprinted by size only
    pub max_file_size: u64,
    /// Prefix length inspected for binary content
    pub sniff_bytes: usize,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            max_file_size: crate::config::DEFAULT_MAX_FILE_SIZE,
            sniff_bytes: crate::config::DEFAULT_SNIFF_BYTES,
        }
    }
}

impl From<&ScanConfig> for FingerprintOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            sniff_bytes: config.binary_sniff_bytes,
        }
    }
}

/// Result of fingerprinting one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFingerprint {
    pub fingerprint: Fingerprint,
    pub size: u64,
    pub skip_reason: Option<SkipReason>,
}

impl FileFingerprint {
    fn skipped(size: u64, reason: SkipReason) -> Self {
        Self {
            fingerprint: hasher::skipped_fingerprint(size),
            size,
            skip_reason: Some(reason),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }
}

/// Fingerprint the file at `path`, following symlinks.
///
/// Read failures are returned as `PermissionDenied` or `UnreadableFile`.
pub fn fingerprint_file(
    path: &Path,
    options: &FingerprintOptions,
) -> Result<FileFingerprint, ScanError> {
    let metadata = std::fs::metadata(path).map_err(|e| ScanError::from_io(path, &e))?;
    let size = metadata.len();

    if size > options.max_file_size {
        return Ok(FileFingerprint::skipped(size, SkipReason::TooLarge));
    }

    let mut file = File::open(path).map_err(|e| ScanError::from_io(path, &e))?;
    let sample = read_sample(&mut file, options.sniff_bytes).map_err(|e| ScanError::from_io(path, &e))?;

    if !is_known_text(path) && looks_binary(&sample, options.sniff_bytes) {
        return Ok(FileFingerprint::skipped(size, SkipReason::Binary));
    }

    let mut hasher = hasher::content_hasher();
    hasher.update(&sample);
    let rest = io::copy(&mut file, &mut hasher).map_err(|e| ScanError::from_io(path, &e))?;

    Ok(FileFingerprint {
        fingerprint: hasher.finalize().into(),
        size: sample.len() as u64 + rest,
        skip_reason: None,
    })
}

/// Read up to `limit` bytes, retrying short reads until EOF.
fn read_sample(file: &mut File, limit: usize) -> io::Result<Vec<u8>> {
    let mut sample = Vec::with_capacity(limit.min(64 * 1024));
    file.by_ref().take(limit as u64).read_to_end(&mut sample)?;
    Ok(sample)
}

/// Whether the path's name or extension marks it as text.
pub fn is_known_text(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            return true;
        }
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| TEXT_NAMES.contains(&n.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// NUL bytes or invalid UTF-8 in the sample mark a file as binary.
///
/// A multi-byte sequence cut off at the sample limit is not treated as invalid.
pub fn looks_binary(sample: &[u8], limit: usize) -> bool {
    if sample.contains(&0) {
        return true;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => false,
        Err(e) => e.error_len().is_some() || sample.len() < limit,
    }
}
