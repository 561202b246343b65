//! CLI route: single route table and run context. Dispatches to the scan API and presentation.

use crate::api::{DiffTarget, ScanApi, ScanOutcome, ScanReport};
use crate::cli::output::CommandOutput;
use crate::cli::parse::{Commands, DiffFormat, ScanFormat, TreeFormat};
use crate::cli::presentation::{format_diff_json, format_diff_text};
use crate::config::{ConfigLoader, MercatorConfig};
use crate::diff;
use crate::error::ApiError;
use crate::manifest::{self, Manifest};
use crate::render::{self, RenderOptions};
use crate::tree::path;
use std::io::IsTerminal;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: root, loaded configuration and the scan API.
pub struct RunContext {
    root: PathBuf,
    config: MercatorConfig,
    api: ScanApi,
    color: bool,
}

impl RunContext {
    /// Create run context from the root and optional config path. Uses ConfigLoader only.
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&root)?
        };

        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(messages.join("; "))
        })?;

        debug!(root = %root.display(), "Configuration loaded");
        let api = ScanApi::new(config.scan.clone())
            .with_protected_paths(manifest_exclusions(&root, &config.manifest.path));
        Ok(Self {
            root,
            config,
            api,
            color: std::io::stdout().is_terminal(),
        })
    }

    /// Force colored output on or off.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn api(&self) -> &ScanApi {
        &self.api
    }

    /// Where the manifest lives for this root.
    pub fn manifest_path(&self) -> PathBuf {
        self.config.manifest.resolve(&self.root)
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Scan {
                format,
                show_fingerprints,
                write,
            } => self.handle_scan(*format, *show_fingerprints, *write),
            Commands::Diff {
                manifest,
                new,
                depth,
                format,
                update,
            } => self.handle_diff(manifest.as_deref(), new.as_deref(), *depth, *format, *update),
            Commands::Tree { format } => self.handle_tree(*format),
        }
    }

    fn handle_scan(
        &self,
        format: ScanFormat,
        show_fingerprints: bool,
        write: bool,
    ) -> Result<CommandOutput, ApiError> {
        let report = self.api.scan(&self.root)?;
        let root_name = root_name(&report.root_path);

        let stdout = match format {
            ScanFormat::Json => report.manifest.to_json()?,
            ScanFormat::Tree => render::render_tree(
                &report.tree,
                &RenderOptions {
                    show_fingerprints,
                    root_name,
                },
            ),
            ScanFormat::Compact => {
                render::render_compact(&report.tree, &report.root_path.display().to_string())
            }
            ScanFormat::Summary => to_pretty_json(&render::summarize(&report.tree, &root_name))?,
        };

        let mut output = with_scan_notices(CommandOutput::new(stdout, ScanOutcome::NoChanges), &report);
        if write {
            let path = self.config.manifest.resolve(&report.root_path);
            report.manifest.save(&path)?;
            info!(path = %path.display(), "Manifest saved");
            output = output.notice(format!("Manifest written to {}", path.display()));
        }
        Ok(output)
    }

    fn handle_diff(
        &self,
        manifest: Option<&Path>,
        new: Option<&Path>,
        depth: Option<usize>,
        format: DiffFormat,
        update: bool,
    ) -> Result<CommandOutput, ApiError> {
        let manifest_path = manifest
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.manifest_path());

        let mut notices = Vec::new();
        let old = Manifest::load_or_none(&manifest_path)?;
        if old.is_none() {
            notices.push(format!(
                "No usable manifest at {}; comparing against an empty tree",
                manifest_path.display()
            ));
        }

        let target = match new {
            Some(path) => DiffTarget::Manifest(Manifest::load(path)?),
            None => DiffTarget::Root(self.root.clone()),
        };
        let new_manifest = match &target {
            DiffTarget::Manifest(m) => Some(m.clone()),
            DiffTarget::Root(_) => None,
        };

        let (result, report) = self.api.diff(old.as_ref(), target)?;
        let current = match (&new_manifest, &report) {
            (Some(m), _) => m,
            (None, Some(report)) => &report.manifest,
            (None, None) => {
                return Err(ApiError::OutputError(
                    "Diff produced neither a manifest nor a scan".to_string(),
                ))
            }
        };

        let subtrees = match depth {
            Some(depth) => {
                let previous = old.clone().unwrap_or_else(crate::api::empty_manifest);
                Some(diff::localize(&previous, current, depth)?)
            }
            None => None,
        };

        let stdout = match format {
            DiffFormat::Text => format_diff_text(&result, subtrees.as_deref(), self.color),
            DiffFormat::Json => format_diff_json(&result, subtrees.as_deref())?,
        };

        let mut output = CommandOutput::new(stdout, ScanOutcome::from_diff(&result));
        for notice in notices {
            output = output.notice(notice);
        }
        if let Some(report) = &report {
            output = with_scan_notices(output, report);
            if update {
                report.manifest.save(&manifest_path)?;
                output = output.notice(format!("Manifest updated at {}", manifest_path.display()));
            }
        } else if update {
            output = output.notice("--update ignored when comparing two manifests");
        }
        Ok(output)
    }

    fn handle_tree(&self, format: TreeFormat) -> Result<CommandOutput, ApiError> {
        let report = self.api.scan(&self.root)?;
        let root_name = root_name(&report.root_path);
        let stdout = match format {
            TreeFormat::Text => render::render_tree(
                &report.tree,
                &RenderOptions {
                    show_fingerprints: true,
                    root_name,
                },
            ),
            TreeFormat::Json => to_pretty_json(&render::summarize(&report.tree, &root_name))?,
        };
        Ok(with_scan_notices(
            CommandOutput::new(stdout, ScanOutcome::NoChanges),
            &report,
        ))
    }
}

fn with_scan_notices(mut output: CommandOutput, report: &ScanReport) -> CommandOutput {
    for err in &report.errors {
        output = output.notice(format!("warning: {}", err));
    }
    output
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::OutputError(format!("Failed to serialize output: {}", e)))
}

/// Root-relative paths of the manifest and its staging file.
///
/// Empty when the manifest lives outside `root`.
fn manifest_exclusions(root: &Path, manifest_path: &Path) -> Vec<String> {
    let relative = if manifest_path.is_absolute() {
        let Ok(root) = dunce::canonicalize(root) else {
            return Vec::new();
        };
        let located = match (manifest_path.parent(), manifest_path.file_name()) {
            (Some(dir), Some(name)) => dunce::canonicalize(dir)
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| manifest_path.to_path_buf()),
            _ => manifest_path.to_path_buf(),
        };
        match located.strip_prefix(&root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => return Vec::new(),
        }
    } else {
        manifest_path.to_path_buf()
    };

    if relative.components().any(|c| matches!(c, Component::ParentDir)) {
        return Vec::new();
    }

    [manifest::temp_path(&relative), relative]
        .iter()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(path::normalize_name(name)),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/")
        })
        .filter(|p| !p.is_empty())
        .collect()
}
