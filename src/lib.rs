// batch-export - ClickHouse to S3 batch exports
// Copyright (c) 2025 Batch Export Contributors
// Licensed under the MIT License

//! # batch-export - scheduled ClickHouse to S3 exports
//!
//! batch-export moves a bounded time window of event data out of ClickHouse
//! and into S3-compatible object storage, one window per run, and records
//! every run in a ledger.
//!
//! ## Overview
//!
//! Each run:
//! - **Resolves** its window `[end - batch_window_size, end)` from explicit inputs or
//!   the scheduler's `ScheduledStartTime` attribute
//! - **Records** the run as `Starting` in the run ledger
//! - **Counts** the rows in the window and skips empty windows
//! - **Exports** with `INSERT INTO FUNCTION s3(...)`, executed by ClickHouse itself
//! - **Finalizes** the run as `Completed` or `Failed`
//!
//! Every step has its own timeouts and retry policy and runs on a bounded
//! worker pool shared by concurrent runs.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Window resolution, query building, the export activity and the workflow engine
//! - [`adapters`] - ClickHouse HTTP client and run ledger stores
//! - [`domain`] - Workflow inputs, intervals, run records and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_export::adapters::clickhouse::ClickHouseConnector;
//! use batch_export::adapters::ledger::create_run_store;
//! use batch_export::config::load_config;
//! use batch_export::core::ledger::RunLedger;
//! use batch_export::core::workflow::{ExportWorkflow, WorkflowContext};
//! use batch_export::domain::ExportSpec;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("batch-export.toml")?;
//!     let ledger = RunLedger::new(create_run_store(&config).await?);
//!     let connector = Arc::new(ClickHouseConnector::new(config.clickhouse.clone()));
//!     let workflow = ExportWorkflow::from_config(&config, ledger, connector);
//!
//!     let spec = ExportSpec::parse_inputs(r#"{
//!         "bucket_name": "exports",
//!         "region": "us-east-1",
//!         "key_template": "{table_name}/{partition_id}.csv",
//!         "batch_window_size": 3600,
//!         "team_id": 2,
//!         "destination_id": "s3-main",
//!         "data_interval_end": "2024-01-01T01:00:00Z"
//!     }"#)?;
//!
//!     let outcome = workflow.run(&spec, &WorkflowContext::manual()).await?;
//!     println!("Exported {} rows", outcome.rows());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`]. Each
//! [`domain::ExportError`] carries an [`domain::ErrorKind`]; only transient
//! kinds are ever retried.
//!
//! ```rust
//! use batch_export::domain::{ErrorKind, ExportError};
//!
//! let err = ExportError::UnsupportedTable("persons".to_string());
//! assert_eq!(err.kind(), ErrorKind::Configuration);
//! assert!(!err.is_retryable());
//! ```
//!
//! ## Logging
//!
//! batch-export uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(team_id = 2, rows = 1200, "Exporting rows to object storage");
//! warn!(step = "insert_into_s3_activity", attempt = 2, "Retrying step");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
