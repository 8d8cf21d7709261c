//! Backfill command implementation
//!
//! Runs one export workflow per window of a historical range.

use super::export::{build_workflow, ledger_exit_code};
use super::InputArgs;
use crate::cli::{exit_code_for, exit_codes};
use crate::config::load_config;
use crate::core::backfill::{run_backfill, BackfillSummary};
use crate::domain::{parse_instant, ErrorKind};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the backfill command
#[derive(Args, Debug)]
pub struct BackfillArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Start of the range (inclusive)
    #[arg(long)]
    pub start: String,

    /// End of the range (exclusive)
    #[arg(long)]
    pub end: String,

    /// Windows exported at the same time
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,
}

impl BackfillArgs {
    /// Execute the backfill command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(start = %self.start, end = %self.end, "Starting backfill command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration validation failed: {e}");
                return Ok(exit_codes::CONFIGURATION);
            }
        };

        let bounds = self
            .inputs
            .load()
            .and_then(|spec| Ok((spec, parse_instant(&self.start)?, parse_instant(&self.end)?)));
        let (spec, start, end) = match bounds {
            Ok(bounds) => bounds,
            Err(e) => {
                eprintln!("Invalid backfill arguments: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let workflow = match build_workflow(&config).await {
            Ok(workflow) => workflow.with_shutdown(shutdown_signal),
            Err(e) => {
                eprintln!("Failed to initialize run ledger: {e}");
                return Ok(ledger_exit_code(&e));
            }
        };

        println!("🚀 Starting backfill...");
        println!();

        let summary = match run_backfill(&workflow, &spec, start, end, self.concurrency).await {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("Backfill failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_summary(&summary);
        Ok(summary_exit_code(&summary))
    }
}

fn print_summary(summary: &BackfillSummary) {
    println!("📊 Backfill Summary:");
    println!("  Windows: {}", summary.total_windows());
    println!("  Exported: {}", summary.exported());
    println!("  Empty: {}", summary.skipped());
    println!("  Failed: {}", summary.failed());
    println!("  Rows: {}", summary.total_rows());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    for report in summary.failures() {
        let interval = report
            .interval
            .map(|interval| interval.to_string())
            .unwrap_or_else(|| "unresolved".to_string());
        if let Err(e) = &report.outcome {
            println!("  ❌ {interval}: {e}");
        }
    }
}

/// Cancellation wins, then the first failed window decides
fn summary_exit_code(summary: &BackfillSummary) -> i32 {
    let errors: Vec<_> = summary
        .failures()
        .filter_map(|report| report.outcome.as_ref().err())
        .collect();

    if errors.iter().any(|e| e.kind() == ErrorKind::Cancelled) {
        return exit_codes::CANCELLED;
    }

    errors
        .first()
        .map(|e| exit_code_for(e))
        .unwrap_or(exit_codes::SUCCESS)
}
