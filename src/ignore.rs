//! Ignore rules for scanning.
//!
//! Rules come from three places, evaluated in this order so that later rules
//! override earlier ones: the built-in deny-list, ignore-rule files at the scan
//! root (`.gitignore`, `.mercatorignore`), then extra patterns from
//! configuration. Patterns use gitignore syntax: `*` and `**` wildcards,
//! trailing `/` for directory-only rules, leading `/` to anchor at the root and
//! `!` to re-include a path excluded by an earlier rule.
//!
//! The matcher only ever answers for a single path. Pruning of descendants of
//! an ignored directory is done by the tree builder, which never descends into
//! it, so a negation cannot resurrect a file below an ignored directory.
//!
//! Protected paths sit outside the rule list. They are matched exactly and
//! always ignored, whatever the defaults or negations say. The manifest and
//! its staging file are protected so a scan never records its own output.

use crate::config::ScanConfig;
use crate::error::ApiError;
use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Built-in deny-list applied before any user rules.
pub const BUILTIN_DEFAULTS: &[&str] = &[
    // Version control metadata
    ".git",
    ".svn",
    ".hg",
    // Our own state
    ".mercator/",
    // Caches and virtual environments
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    "venv",
    ".venv",
    // Build and output directories
    "dist/",
    "build/",
    "target/",
    ".next/",
    ".nuxt/",
    ".output/",
    "coverage/",
    ".nyc_output/",
    // Dependency directories
    "node_modules/",
    "vendor/",
    ".bundle/",
    ".cargo/",
    // OS cruft
    ".DS_Store",
    "Thumbs.db",
    // Compiled artifacts
    "*.pyc",
    "*.pyo",
    "*.so",
    "*.dylib",
    "*.dll",
    "*.exe",
    "*.o",
    "*.a",
    "*.class",
    "*.jar",
    "*.whl",
    // Lockfiles
    "*.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
    "bun.lockb",
    // Media and archives
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.ico",
    "*.webp",
    "*.mp3",
    "*.mp4",
    "*.wav",
    "*.mov",
    "*.pdf",
    "*.zip",
    "*.tar",
    "*.gz",
    "*.7z",
    "*.woff",
    "*.woff2",
    "*.ttf",
    // Generated bundles
    "*.min.js",
    "*.min.css",
    "*.map",
];

/// Compiled, ordered ignore rule set for one scan root.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: Gitignore,
    protected: BTreeSet<String>,
}

impl IgnoreMatcher {
    /// Start building a matcher rooted at `root`.
    pub fn builder(root: impl Into<PathBuf>) -> IgnoreMatcherBuilder {
        IgnoreMatcherBuilder {
            root: root.into(),
            use_defaults: true,
            files: Vec::new(),
            patterns: Vec::new(),
            protected: BTreeSet::new(),
        }
    }

    /// A matcher that ignores nothing.
    pub fn empty() -> Self {
        Self {
            rules: Gitignore::empty(),
            protected: BTreeSet::new(),
        }
    }

    /// Build the matcher described by a scan configuration.
    ///
    /// Ignore files are resolved relative to `root`; missing files are skipped.
    pub fn from_scan_config(root: &Path, config: &ScanConfig) -> Result<Self, ApiError> {
        let mut builder = Self::builder(root).with_defaults(config.use_default_ignores);
        for file in &config.ignore_files {
            builder = builder.add_file(root.join(file));
        }
        for pattern in &config.extra_ignores {
            builder = builder.add_pattern(pattern.clone());
        }
        builder.build()
    }

    /// Always ignore these exact root-relative paths.
    pub fn with_protected<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.protected.extend(
            paths
                .into_iter()
                .map(|p| crate::tree::path::normalize_relative(p.as_ref()))
                .filter(|p| !p.is_empty()),
        );
        self
    }

    /// Whether `relative_path` (root-relative, `/`-separated) is excluded.
    ///
    /// The root itself is never ignored.
    pub fn should_ignore(&self, relative_path: &str, is_directory: bool) -> bool {
        if relative_path.is_empty() || relative_path == "." {
            return false;
        }
        if self.protected.contains(relative_path) {
            return true;
        }
        self.rules
            .matched(Path::new(relative_path), is_directory)
            .is_ignore()
    }

    /// Number of compiled rules, including negations, plus protected paths.
    pub fn len(&self) -> usize {
        self.rules.len() + self.protected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects rule sources in priority order.
#[derive(Debug, Clone)]
pub struct IgnoreMatcherBuilder {
    root: PathBuf,
    use_defaults: bool,
    files: Vec<PathBuf>,
    patterns: Vec<String>,
    protected: BTreeSet<String>,
}

impl IgnoreMatcherBuilder {
    /// Include or omit the built-in deny-list (default: included).
    pub fn with_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }

    /// Add an ignore-rule file. Nonexistent files are skipped at build time.
    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Add a single pattern line. Later patterns take priority.
    pub fn add_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Protect an exact root-relative path from ever being scanned.
    pub fn protect_path(mut self, relative: impl AsRef<str>) -> Self {
        let normalized = crate::tree::path::normalize_relative(relative.as_ref());
        if !normalized.is_empty() {
            self.protected.insert(normalized);
        }
        self
    }

    pub fn build(self) -> Result<IgnoreMatcher, ApiError> {
        let mut builder = GitignoreBuilder::new(&self.root);

        if self.use_defaults {
            for pattern in BUILTIN_DEFAULTS {
                builder.add_line(None, pattern).map_err(|e| {
                    ApiError::ConfigError(format!("Invalid built-in ignore pattern {}: {}", pattern, e))
                })?;
            }
        }

        for file in &self.files {
            if !file.is_file() {
                debug!(path = %file.display(), "Ignore file not present");
                continue;
            }
            // Partial errors leave the valid lines of the file in place.
            if let Some(err) = builder.add(file) {
                warn!(path = %file.display(), error = %err, "Ignore file contains invalid patterns");
            }
        }

        for pattern in &self.patterns {
            let line = pattern.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            builder.add_line(None, line).map_err(|e| {
                ApiError::ConfigError(format!("Invalid ignore pattern {}: {}", line, e))
            })?;
        }

        let rules = builder
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to compile ignore rules: {}", e)))?;
        debug!(rule_count = rules.len(), "Compiled ignore rules");
        Ok(IgnoreMatcher {
            rules,
            protected: self.protected,
        })
    }
}
