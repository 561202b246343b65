//! CLI parse: clap types for Mercator. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mercator CLI - Merkle snapshots of a directory and change detection
#[derive(Parser)]
#[command(name = "mercator")]
#[command(about = "Fingerprint a directory as a Merkle tree and diff it against a saved manifest")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory to scan
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the root and print the result
    Scan {
        /// Output format
        #[arg(long, value_enum, default_value_t = ScanFormat::Json)]
        format: ScanFormat,
        /// Show fingerprints in tree output
        #[arg(long)]
        show_fingerprints: bool,
        /// Save the manifest to the configured manifest path
        #[arg(long)]
        write: bool,
    },
    /// Compare a saved manifest against the live tree or another manifest
    Diff {
        /// Previous manifest (default: configured manifest path)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Compare against this manifest instead of scanning the root
        #[arg(long)]
        new: Option<PathBuf>,
        /// Report changed subtrees at this depth
        #[arg(long)]
        depth: Option<usize>,
        /// Output format
        #[arg(long, value_enum, default_value_t = DiffFormat::Text)]
        format: DiffFormat,
        /// Replace the saved manifest with the fresh scan
        #[arg(long)]
        update: bool,
    },
    /// Print the hierarchy with fingerprints only
    Tree {
        /// Output format
        #[arg(long, value_enum, default_value_t = TreeFormat::Text)]
        format: TreeFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanFormat {
    /// The manifest
    Json,
    /// Box-drawing hierarchy
    Tree,
    /// One line per entry
    Compact,
    /// Nested hierarchy with fingerprints as JSON
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiffFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TreeFormat {
    Text,
    Json,
}
