//! Mercator CLI Binary
//!
//! Command-line interface for Merkle snapshots and change detection.
//! Exit status: 0 no changes, 1 changes found, 2 failure.

use anyhow::Context;
use clap::Parser;
use mercator::api::ScanOutcome;
use mercator::cli::{Cli, CommandOutput, RunContext};
use mercator::config::ConfigLoader;
use mercator::error::ApiError;
use mercator::logging::{init_logging, resolve_log_file_path, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = match build_logging_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to configure logging: {:#}", e);
            process::exit(ScanOutcome::Failed.exit_code());
        }
    };

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(ScanOutcome::Failed.exit_code());
    }

    info!("Mercator CLI starting");

    match run(&cli) {
        Ok(output) => {
            for notice in &output.notices {
                eprintln!("{}", notice);
            }
            if !output.stdout.is_empty() {
                println!("{}", output.stdout.trim_end_matches('\n'));
            }
            info!(exit_code = output.outcome.exit_code(), "Command completed");
            process::exit(output.outcome.exit_code());
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", mercator::cli::map_error(&e));
            process::exit(ScanOutcome::Failed.exit_code());
        }
    }
}

fn run(cli: &Cli) -> Result<CommandOutput, ApiError> {
    let context = RunContext::new(cli.root.clone(), cli.config.clone())?;
    info!("CLI context initialized");
    context.execute(&cli.command)
}

/// Build logging configuration from CLI args, environment, and config file
fn build_logging_config(cli: &Cli) -> anyhow::Result<LoggingConfig> {
    // Silent unless asked
    if !cli.verbose && cli.log_level.is_none() {
        return Ok(LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        });
    }

    // Config errors surface later through RunContext; logging falls back to defaults
    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path)
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(&cli.root)
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    // Override with CLI arguments (highest priority)
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    } else if config.level == "off" {
        config.level = "info".to_string();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if config.output.contains("file") {
        let path = resolve_log_file_path(cli.log_file.clone(), config.file.clone())
            .context("resolving log file path")?;
        config.file = Some(path);
    }

    Ok(config)
}
