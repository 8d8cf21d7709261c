//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for batch-export using clap.

pub mod commands;

use crate::config::{BatchExportConfig, LoggingConfig};
use crate::domain::{ErrorKind, ExportError};
use clap::{Parser, Subcommand};

/// Process exit codes
pub mod exit_codes {
    /// Command succeeded
    pub const SUCCESS: i32 = 0;
    /// Invalid configuration or workflow inputs
    pub const CONFIGURATION: i32 = 2;
    /// An external system could not be reached
    pub const CONNECTIVITY: i32 = 4;
    /// Any other failure
    pub const FATAL: i32 = 5;
    /// Interrupted by SIGINT or SIGTERM
    pub const CANCELLED: i32 = 130;
}

/// Exit code for a command that failed with `error`
pub fn exit_code_for(error: &ExportError) -> i32 {
    match error.kind() {
        ErrorKind::Configuration => exit_codes::CONFIGURATION,
        ErrorKind::Connectivity => exit_codes::CONNECTIVITY,
        ErrorKind::Cancelled => exit_codes::CANCELLED,
        ErrorKind::Integrity | ErrorKind::Transient | ErrorKind::Internal => exit_codes::FATAL,
    }
}

/// batch-export - ClickHouse to S3 batch exports
#[derive(Parser, Debug)]
#[command(name = "batch-export")]
#[command(version, about, long_about = None)]
#[command(author = "Batch Export Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "batch-export.toml", env = "BATCH_EXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BATCH_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level and logging settings for this invocation
    ///
    /// `--log-level` wins over `application.log_level`. Without a loadable
    /// configuration, logging goes to the console only at `info`.
    pub fn logging_settings(&self, config: Option<&BatchExportConfig>) -> (String, LoggingConfig) {
        let log_level = self
            .log_level
            .clone()
            .or_else(|| config.map(|c| c.application.log_level.clone()))
            .unwrap_or_else(|| "info".to_string());
        let logging = config.map(|c| c.logging.clone()).unwrap_or_default();

        (log_level, logging)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export one window to object storage
    Export(commands::export::ExportArgs),

    /// Export every window of a historical range
    Backfill(commands::backfill::BackfillArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show recent export runs
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
