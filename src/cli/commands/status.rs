//! Status command implementation
//!
//! This module implements the `status` command for displaying recent export
//! runs of a destination.

use crate::adapters::ledger::create_run_store;
use crate::cli::exit_codes;
use crate::config::load_config;
use crate::core::ledger::RunLedger;
use crate::domain::{DestinationId, ExportRun, RunStatus, TeamId};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Team owning the destination
    #[arg(long)]
    pub team_id: i64,

    /// Destination to list runs for
    #[arg(long)]
    pub destination_id: String,

    /// Maximum number of runs to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(
            team_id = self.team_id,
            destination_id = %self.destination_id,
            "Checking export status"
        );

        println!("📊 Export Status");
        println!();

        let destination_id = match DestinationId::new(self.destination_id.clone()) {
            Ok(id) => id,
            Err(e) => {
                println!("❌ Invalid destination id");
                println!("   Error: {}", e);
                return Ok(exit_codes::CONFIGURATION);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(exit_codes::CONFIGURATION);
            }
        };

        let store = match create_run_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to connect to run ledger");
                println!("   Error: {}", e);
                return Ok(exit_codes::CONNECTIVITY);
            }
        };
        let ledger = RunLedger::new(store);

        let runs = match ledger
            .list_runs(TeamId::new(self.team_id), &destination_id, self.limit)
            .await
        {
            Ok(runs) => runs,
            Err(e) => {
                println!("❌ Failed to load export runs");
                println!("   Error: {}", e);
                return Ok(exit_codes::FATAL);
            }
        };

        if runs.is_empty() {
            println!("No export runs found.");
            println!("Run 'batch-export export' to start exporting data.");
            return Ok(exit_codes::SUCCESS);
        }

        println!("Found {} run(s):", runs.len());
        println!();
        println!(
            "{:<38} {:<14} {:<22} {:<22} {:<22}",
            "Run ID", "Status", "Interval Start", "Interval End", "Last Updated"
        );
        println!("{}", "-".repeat(120));

        for run in &runs {
            println!("{}", format_run(run));
        }

        println!();
        Ok(exit_codes::SUCCESS)
    }
}

fn format_run(run: &ExportRun) -> String {
    let status = match run.status {
        RunStatus::Completed => "✅ Completed",
        RunStatus::Starting => "🔄 Starting",
        RunStatus::Failed => "❌ Failed",
    };

    format!(
        "{:<38} {:<14} {:<22} {:<22} {:<22}",
        run.id.to_string(),
        status,
        run.data_interval_start.format("%Y-%m-%d %H:%M:%S"),
        run.data_interval_end.format("%Y-%m-%d %H:%M:%S"),
        run.last_updated_at.format("%Y-%m-%d %H:%M:%S")
    )
}
