//! Configuration management.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `BATCH_EXPORT_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use batch_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("batch-export.toml")?;
//!
//! println!("ClickHouse URL: {}", config.clickhouse.url);
//! println!("Attempts per step: {}", config.workflow.retry.maximum_attempts);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ClickHouseConfig`] - Analytical store HTTP interface
//! - [`ObjectStorageConfig`] - Local object storage endpoint
//! - [`PostgreSQLConfig`] - Run ledger database
//! - [`WorkflowConfig`] / [`RetryConfig`] - Step timeouts, retries, worker pool size
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! ledger_backend = "postgresql"
//!
//! [clickhouse]
//! url = "https://clickhouse.internal:8443"
//! user = "exporter"
//! password = "${CLICKHOUSE_PASSWORD}"
//! database = "posthog"
//!
//! [postgresql]
//! connection_string = "${EXPORT_LEDGER_URL}"
//!
//! [workflow]
//! start_to_close_timeout_secs = 1200
//! schedule_to_close_timeout_secs = 300
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, BatchExportConfig, ClickHouseConfig, Environment, LedgerBackend,
    LoggingConfig, ObjectStorageConfig, PostgreSQLConfig, RetryConfig, WorkflowConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
