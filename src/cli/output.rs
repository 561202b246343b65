//! CLI output: command results and error mapping to a stable CLI surface.

use crate::api::ScanOutcome;
use crate::error::{ApiError, ScanError};

/// What a command produced
#[derive(Debug)]
pub struct CommandOutput {
    /// Printed to stdout
    pub stdout: String,
    /// Printed to stderr, one line each
    pub notices: Vec<String>,
    pub outcome: ScanOutcome,
}

impl CommandOutput {
    pub fn new(stdout: String, outcome: ScanOutcome) -> Self {
        Self {
            stdout,
            notices: Vec::new(),
            outcome,
        }
    }

    pub fn notice(mut self, line: impl Into<String>) -> Self {
        self.notices.push(line.into());
        self
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Scan(ScanError::RootNotFound(path)) => {
            format!("error: root directory does not exist: {}", path.display())
        }
        ApiError::Scan(ScanError::RootNotDirectory(path)) => {
            format!("error: root is not a directory: {}", path.display())
        }
        ApiError::Scan(ScanError::PermissionDenied(path)) => {
            format!("error: permission denied: {}", path.display())
        }
        other => format!("error: {}", other),
    }
}
