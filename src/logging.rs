//! Logging System
//!
//! Structured logging implementation using the `tracing` crate. Provides configurable
//! log levels, output formats, and destinations. Stdout carries manifests and diffs,
//! so logs default to stderr.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Resolve the log file path with precedence: CLI, MERCATOR_LOG_FILE env, config file, default.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    if let Some(p) = cli_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    if let Ok(env_path) = std::env::var("MERCATOR_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, ApiError> {
    let project_dirs = directories::ProjectDirs::from("", "mercator", "mercator").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform directories for log file".to_string())
    })?;
    // state_dir is Linux-only; other platforms log under the local data dir.
    let dir: &Path = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir());
    Ok(dir.join("mercator.log"))
}

/// Log line encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LogOutput {
    stdout: bool,
    stderr: bool,
    file: bool,
}

impl FromStr for LogOutput {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (stdout, stderr, file) = match s {
            "stdout" => (true, false, false),
            "stderr" => (false, true, false),
            "file" => (false, false, true),
            "file+stderr" => (false, true, true),
            "both" => (true, true, false),
            other => {
                return Err(ApiError::ConfigError(format!(
                    "Invalid log output: {} (expected stdout, stderr, file, file+stderr or both)",
                    other
                )))
            }
        };
        Ok(LogOutput {
            stdout,
            stderr,
            file,
        })
    }
}

/// Install the global subscriber.
///
/// Environment variables (`MERCATOR_LOG`, `MERCATOR_LOG_FORMAT`,
/// `MERCATOR_LOG_OUTPUT`, `MERCATOR_LOG_MODULES`) take priority over `config`;
/// CLI flags are expected to be folded into `config` by the caller.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    if config.is_some_and(|c| !c.enabled) {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .try_init()
            .map_err(install_error);
    }

    let filter = env_filter(config)?;
    let format = resolve_setting("MERCATOR_LOG_FORMAT", config.map(|c| c.format.as_str()), "text")?;
    let output: LogOutput =
        resolve_setting("MERCATOR_LOG_OUTPUT", config.map(|c| c.output.as_str()), "stderr")?;
    let writer = make_writer(output, config)?;
    let ansi = config.map_or(true, |c| c.color) && !output.file;

    let registry = Registry::default().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    }
    .map_err(install_error)
}

fn install_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::ConfigError(format!("Failed to install logger: {}", e))
}

/// A valid environment value wins; otherwise the configured value, then `default`.
fn resolve_setting<T>(env_var: &str, configured: Option<&str>, default: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = ApiError>,
{
    if let Some(parsed) = std::env::var(env_var).ok().and_then(|v| v.parse().ok()) {
        return Ok(parsed);
    }
    configured.unwrap_or(default).parse()
}

fn make_writer(output: LogOutput, config: Option<&LoggingConfig>) -> Result<BoxMakeWriter, ApiError> {
    if !output.file {
        return Ok(match (output.stdout, output.stderr) {
            (true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
            (true, false) => BoxMakeWriter::new(std::io::stdout),
            _ => BoxMakeWriter::new(std::io::stderr),
        });
    }

    let log_file = resolve_log_file_path(None, config.and_then(|c| c.file.clone()))?;
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::ConfigError(format!("Failed to create log directory: {}", e)))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| ApiError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e)))?;
    let file = std::sync::Mutex::new(file);
    Ok(if output.stderr {
        BoxMakeWriter::new(file.and(std::io::stderr))
    } else {
        BoxMakeWriter::new(file)
    })
}

/// Level filter: `MERCATOR_LOG` replaces everything, otherwise the configured
/// level plus per-module directives from config and `MERCATOR_LOG_MODULES`.
fn env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env("MERCATOR_LOG") {
        return Ok(filter);
    }

    let level = config.map_or("info", |c| c.level.as_str());
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let configured = config
        .into_iter()
        .flat_map(|c| c.modules.iter())
        .map(|(module, module_level)| format!("{}={}", module, module_level));
    let from_env: Vec<String> = std::env::var("MERCATOR_LOG_MODULES")
        .map(|raw| {
            raw.split(',')
                .filter_map(|spec| spec.split_once('='))
                .map(|(module, module_level)| format!("{}={}", module.trim(), module_level.trim()))
                .collect()
        })
        .unwrap_or_default();

    configured
        .chain(from_env)
        .try_fold(EnvFilter::new(level), |filter, directive| {
            let parsed = directive.parse().map_err(|e| {
                ApiError::ConfigError(format!("Invalid log directive {:?}: {}", directive, e))
            })?;
            Ok(filter.add_directive(parsed))
        })
}
