//! Core export logic.
//!
//! # Modules
//!
//! - [`window`] - Data interval resolution from inputs or scheduler attributes
//! - [`query`] - Extraction statements and destination addressing
//! - [`guard`] - Row-count check that skips empty windows
//! - [`activity`] - A single export attempt
//! - [`ledger`] - Run lifecycle records
//! - [`workflow`] - Run state machine, worker pool and retry policies
//! - [`backfill`] - Historical ranges split into consecutive windows
//!
//! # Export Workflow
//!
//! 1. **Resolve window**: `[end - batch_window_size, end)` from the inputs or the
//!    `ScheduledStartTime` attribute, and validate the extraction query
//! 2. **Create run**: record the run as `Starting`
//! 3. **Export**: count rows in the window; if any, `INSERT INTO FUNCTION s3(...)`
//! 4. **Finalize**: mark the run `Completed` or `Failed`
//!
//! # Example
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
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("batch-export.toml")?;
//! let ledger = RunLedger::new(create_run_store(&config).await?);
//! let connector = Arc::new(ClickHouseConnector::new(config.clickhouse.clone()));
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let workflow = ExportWorkflow::from_config(&config, ledger, connector).with_shutdown(shutdown_rx);
//!
//! let spec = ExportSpec::parse_inputs(&std::fs::read_to_string("inputs.json")?)?;
//! let report = workflow
//!     .execute(&spec, &WorkflowContext::scheduled("sched-1", "2024-01-01T01:00:00Z"))
//!     .await;
//!
//! println!("Final state: {}", report.final_state);
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod backfill;
pub mod guard;
pub mod ledger;
pub mod query;
pub mod window;
pub mod workflow;
