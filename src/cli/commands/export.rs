//! Export command implementation
//!
//! This module implements the `export` command, which runs one export
//! workflow for one window.

use super::InputArgs;
use crate::adapters::clickhouse::ClickHouseConnector;
use crate::adapters::ledger::create_run_store;
use crate::cli::{exit_code_for, exit_codes};
use crate::config::{load_config, BatchExportConfig};
use crate::core::activity::ExportOutcome;
use crate::core::ledger::RunLedger;
use crate::core::window::SearchAttributes;
use crate::core::workflow::{ExportWorkflow, WorkflowContext, WorkflowReport};
use crate::domain::{ErrorKind, ExportError, Result};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Scheduled start time of the tick that triggered this run
    #[arg(long, env = "BATCH_EXPORT_SCHEDULED_START_TIME")]
    pub scheduled_start_time: Option<String>,

    /// Identifier of the schedule that triggered this run
    #[arg(long, env = "BATCH_EXPORT_SCHEDULE_ID")]
    pub schedule_id: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration validation failed");
                eprintln!("Configuration validation failed: {e}");
                return Ok(exit_codes::CONFIGURATION);
            }
        };

        let spec = match self.inputs.load() {
            Ok(spec) => spec,
            Err(e) => {
                tracing::error!(error = %e, "Invalid workflow inputs");
                eprintln!("Invalid workflow inputs: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let workflow = match build_workflow(&config).await {
            Ok(workflow) => workflow.with_shutdown(shutdown_signal),
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize run ledger");
                eprintln!("Failed to initialize run ledger: {e}");
                return Ok(ledger_exit_code(&e));
            }
        };

        println!("🚀 Starting export...");
        println!();

        let report = workflow.execute(&spec, &self.context()).await;
        print_report(&report);

        Ok(match &report.outcome {
            Ok(_) => exit_codes::SUCCESS,
            Err(e) => exit_code_for(e),
        })
    }

    fn context(&self) -> WorkflowContext {
        match (&self.schedule_id, &self.scheduled_start_time) {
            (Some(schedule_id), Some(scheduled)) => WorkflowContext::scheduled(schedule_id, scheduled),
            (schedule_id, scheduled) => WorkflowContext {
                schedule_id: schedule_id.clone(),
                search_attributes: scheduled
                    .as_ref()
                    .map(SearchAttributes::scheduled)
                    .unwrap_or_default(),
                ..WorkflowContext::manual()
            },
        }
    }
}

/// Workflow over the configured ledger and analytical store
///
/// Prepares the ledger schema before returning.
pub(crate) async fn build_workflow(config: &BatchExportConfig) -> Result<ExportWorkflow> {
    let store = create_run_store(config).await?;
    store.ensure_schema().await?;

    let connector = Arc::new(ClickHouseConnector::new(config.clickhouse.clone()));
    Ok(ExportWorkflow::from_config(config, RunLedger::new(store), connector))
}

/// Setup failures are configuration faults or an unreachable ledger
pub(crate) fn ledger_exit_code(error: &ExportError) -> i32 {
    match error.kind() {
        ErrorKind::Configuration => exit_codes::CONFIGURATION,
        _ => exit_codes::CONNECTIVITY,
    }
}

fn print_report(report: &WorkflowReport) {
    println!("📊 Export Summary:");
    println!("  Workflow: {}", report.workflow_id);
    if let Some(run_id) = report.run_id {
        println!("  Run: {run_id}");
    }
    if let Some(interval) = report.interval {
        println!("  Interval: {interval}");
    }
    println!("  Final state: {}", report.final_state);
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());

    match &report.outcome {
        Ok(ExportOutcome::Exported {
            rows,
            destination_url,
        }) => {
            println!("  Rows: {rows}");
            println!("  Destination: {destination_url}");
            println!();
            println!("✅ Export completed successfully!");
        }
        Ok(ExportOutcome::Skipped) => {
            println!();
            println!("✅ Nothing to export in this window");
        }
        Err(e) => {
            println!();
            println!("❌ Export failed ({}): {e}", e.kind());
        }
    }
}
