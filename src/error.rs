//! Error types for scanning, manifest handling and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while scanning a tree or reading/writing a manifest
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Scan root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Unreadable file {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("Manifest corrupt: {0}")]
    ManifestCorrupt(String),

    #[error("Manifest version {found} is not supported (expected {supported})")]
    ManifestIncompatibleVersion { found: u64, supported: u64 },

    #[error("Scan interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Per-entry errors that are recorded while traversal continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::PermissionDenied(_) | ScanError::UnreadableFile { .. }
        )
    }

    /// Manifest errors after which callers fall back to a full scan.
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            ScanError::ManifestCorrupt(_) | ScanError::ManifestIncompatibleVersion { .. }
        )
    }

    /// Classify an I/O failure on `path` as a per-entry scan error.
    pub fn from_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(path),
            _ => ScanError::UnreadableFile {
                path,
                reason: err.to_string(),
            },
        }
    }
}

/// Errors surfaced by the library entry points and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
