//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the batch-export configuration file and, optionally, the systems it
//! points at.

use crate::adapters::clickhouse::{AnalyticalStore, ClickHouseClient};
use crate::adapters::ledger::create_run_store;
use crate::cli::exit_codes;
use crate::config::{load_config, BatchExportConfig, LedgerBackend};
use crate::core::query::ObjectStorageEndpoint;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also check that ClickHouse and the run ledger are reachable
    #[arg(long)]
    pub check_connections: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(exit_codes::CONFIGURATION);
            }
        };

        print_summary(&config);

        if !self.check_connections {
            return Ok(exit_codes::SUCCESS);
        }

        Ok(check_connections(&config).await)
    }
}

fn print_summary(config: &BatchExportConfig) {
    println!();
    println!("Configuration Summary:");
    println!("  Environment: {:?}", config.environment);
    println!("  Log Level: {}", config.application.log_level);
    println!("  ClickHouse: {}", config.clickhouse.url);
    println!("  ClickHouse Database: {}", config.clickhouse.database);
    println!(
        "  Object Storage: {}",
        ObjectStorageEndpoint::from_config(config).base_url("<region>")
    );

    match config.ledger_backend {
        LedgerBackend::Memory => println!("  Run Ledger: in-memory"),
        LedgerBackend::PostgreSQL => {
            println!("  Run Ledger: PostgreSQL");
            if let Some(ref pg_config) = config.postgresql {
                println!("  Max Connections: {}", pg_config.max_connections);
                println!("  SSL Mode: {}", pg_config.ssl_mode);
            }
        }
    }

    println!(
        "  Step Timeouts: {}s start-to-close, {}s schedule-to-close",
        config.workflow.start_to_close_timeout_secs, config.workflow.schedule_to_close_timeout_secs
    );
    println!("  Attempts per Step: {}", config.workflow.retry.maximum_attempts);
    println!(
        "  Concurrent Activities: {}",
        config.workflow.max_concurrent_activities
    );
    println!();
}

async fn check_connections(config: &BatchExportConfig) -> i32 {
    let mut healthy = true;

    match ClickHouseClient::new(config.clickhouse.clone()) {
        Ok(client) if client.is_alive().await => println!("✅ ClickHouse is reachable"),
        Ok(_) => {
            println!("❌ ClickHouse at {} is unreachable", config.clickhouse.url);
            healthy = false;
        }
        Err(e) => {
            println!("❌ ClickHouse client could not be created: {e}");
            healthy = false;
        }
    }

    match create_run_store(config).await {
        Ok(store) => match store.test_connection().await {
            Ok(()) => println!("✅ Run ledger is reachable"),
            Err(e) => {
                println!("❌ Run ledger is unreachable: {e}");
                healthy = false;
            }
        },
        Err(e) => {
            println!("❌ Run ledger could not be created: {e}");
            healthy = false;
        }
    }

    if healthy {
        exit_codes::SUCCESS
    } else {
        exit_codes::CONNECTIVITY
    }
}
