//! Configuration System
//!
//! Layered configuration for scanning, manifest storage and logging. Sources are
//! merged by the `config` crate: built-in defaults, the global config file, the
//! workspace config file and finally `MERCATOR__*` environment variables.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::workspace_config_path;

/// Files above this size are fingerprinted by size only.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

/// Prefix length sniffed for NUL bytes and UTF-8 validity.
pub const DEFAULT_SNIFF_BYTES: usize = 8192;

/// Manifest location relative to the scan root.
pub const DEFAULT_MANIFEST_PATH: &str = ".mercator/manifest.json";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MercatorConfig {
    /// Scan behaviour
    #[serde(default)]
    pub scan: ScanConfig,

    /// Manifest persistence
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Size ceiling for content fingerprinting (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Bytes read from the start of a file for binary detection
    #[serde(default = "default_sniff_bytes")]
    pub binary_sniff_bytes: usize,

    /// Worker threads; None uses available parallelism
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Ignore-rule files, relative to the scan root, in priority order
    #[serde(default = "default_ignore_files")]
    pub ignore_files: Vec<String>,

    /// Extra gitignore-style patterns applied after the ignore files
    #[serde(default)]
    pub extra_ignores: Vec<String>,

    /// Apply the built-in deny-list
    #[serde(default = "default_true")]
    pub use_default_ignores: bool,

    /// Fingerprint the target of file symlinks (directory symlinks are never followed)
    #[serde(default = "default_true")]
    pub follow_file_symlinks: bool,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_sniff_bytes() -> usize {
    DEFAULT_SNIFF_BYTES
}

fn default_ignore_files() -> Vec<String> {
    vec![".gitignore".to_string(), ".mercatorignore".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            binary_sniff_bytes: default_sniff_bytes(),
            concurrency: None,
            ignore_files: default_ignore_files(),
            extra_ignores: Vec::new(),
            use_default_ignores: default_true(),
            follow_file_symlinks: default_true(),
        }
    }
}

impl ScanConfig {
    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.binary_sniff_bytes == 0 {
            return Err("binary_sniff_bytes must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Manifest persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest path; relative paths resolve against the scan root
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST_PATH)
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
        }
    }
}

impl ManifestConfig {
    /// Absolute manifest location for a given scan root.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Scan(String),
    Manifest(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Scan(msg) => write!(f, "Scan: {}", msg),
            ValidationError::Manifest(msg) => write!(f, "Manifest: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MercatorConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.scan.validate() {
            errors.push(ValidationError::Scan(e));
        }

        if self.manifest.path.as_os_str().is_empty() {
            errors.push(ValidationError::Manifest(
                "Manifest path cannot be empty".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
