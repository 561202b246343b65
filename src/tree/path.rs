//! Path canonicalization and normalization utilities
//!
//! Paths inside a tree or manifest are root-relative, `/`-separated and
//! NFC-normalized so that the same file yields the same key on every platform.
//! The root itself is the empty string.

use crate::error::ScanError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Separator used in every relative path.
pub const SEPARATOR: char = '/';

/// Canonicalize the scan root, mapping a missing root to `RootNotFound`.
pub fn canonicalize_root(root: &Path) -> Result<PathBuf, ScanError> {
    let canonical = dunce::canonicalize(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::RootNotFound(root.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
        _ => ScanError::Io(e),
    })?;
    if !canonical.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(canonical)
}

/// Normalize a single directory entry name (Unicode NFC).
pub fn normalize_name(name: &OsStr) -> String {
    name.to_string_lossy().nfc().collect()
}

/// Join a child name onto a relative parent path.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent, SEPARATOR, name)
    }
}

/// Characters treated as separators in externally supplied paths.
///
/// On Unix `\` is a legal file name character and stays inside the segment.
#[cfg(windows)]
const INPUT_SEPARATORS: &[char] = &['/', '\\'];
#[cfg(not(windows))]
const INPUT_SEPARATORS: &[char] = &['/'];

/// Normalize a relative path string read from outside the builder.
///
/// Drops `.` and empty segments and applies NFC. `\` is a separator only on
/// Windows.
pub fn normalize_relative(path: &str) -> String {
    let normalized: String = path.nfc().collect();
    normalized
        .split(INPUT_SEPARATORS)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a relative path into its segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Number of segments in a relative path; the root has depth 0.
pub fn depth(path: &str) -> usize {
    segments(path).count()
}

/// The first `depth` segments of `path`, or None if it is not that deep.
pub fn ancestor_at_depth(path: &str, depth: usize) -> Option<String> {
    let parts: Vec<&str> = segments(path).take(depth).collect();
    if parts.len() < depth {
        return None;
    }
    Some(parts.join("/"))
}

/// Absolute filesystem location of a relative path under `root`.
pub fn to_absolute(root: &Path, relative: &str) -> PathBuf {
    segments(relative).fold(root.to_path_buf(), |acc, part| acc.join(part))
}
