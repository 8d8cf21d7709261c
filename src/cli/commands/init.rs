//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::exit_codes;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "batch-export.toml")]
    pub output: String,

    /// Include a commented PostgreSQL ledger section and every tunable
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing batch-export configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(exit_codes::CONFIGURATION);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point [clickhouse] at your analytical store");
                println!("  3. For production, set ledger_backend = 'postgresql' and");
                println!("     export the ledger connection string, e.g. EXPORT_LEDGER_URL");
                println!("  4. Validate configuration: batch-export validate-config --check-connections");
                println!("  5. Run export: batch-export export --inputs-file inputs.json");
                println!();
                Ok(exit_codes::SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(exit_codes::FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# batch-export configuration

environment = "development"
ledger_backend = "memory"

[application]
log_level = "info"

[clickhouse]
url = "http://localhost:8123"
user = "default"
database = "default"
"#
        .to_string()
    }

    /// Generate configuration with every section spelled out
    fn generate_config_with_examples() -> String {
        r#"# batch-export configuration
#
# Values of the form ${VAR} are replaced with environment variables on load.
# Any setting can also be overridden with BATCH_EXPORT_<SECTION>_<KEY>,
# e.g. BATCH_EXPORT_CLICKHOUSE_URL.

# development | test | production
# Outside production, exports are written to [object_storage].local_endpoint
# instead of https://s3.<region>.amazonaws.com
environment = "development"

# memory | postgresql (memory is rejected in production)
ledger_backend = "memory"

[application]
# trace | debug | info | warn | error
log_level = "info"

[clickhouse]
url = "http://localhost:8123"
user = "default"
# password = "${CLICKHOUSE_PASSWORD}"
database = "default"
# Per-request timeout; exports of large windows can take a while
timeout_seconds = 1200
tls_verify = true

[object_storage]
local_endpoint = "http://object-storage:19000"

# [postgresql]
# connection_string = "${EXPORT_LEDGER_URL}"
# max_connections = 10
# connection_timeout_seconds = 30
# statement_timeout_seconds = 60
# disable | prefer | require
# ssl_mode = "prefer"

[workflow]
# Bound on a single attempt of a step
start_to_close_timeout_secs = 1200
# Bound on waiting for a free worker slot
schedule_to_close_timeout_secs = 300
max_concurrent_activities = 10

[workflow.retry]
maximum_attempts = 3
initial_interval_ms = 1000
maximum_interval_ms = 100000
backoff_coefficient = 2.0

[logging]
local_enabled = false
local_path = "/var/log/batch-export"
# daily | hourly
local_rotation = "daily"
"#
        .to_string()
    }
}
