//! Run store factory
//!
//! Creates the run store selected by `ledger_backend`.

use super::memory::MemoryRunStore;
use super::traits::RunStore;
use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLRunStore};
use crate::config::schema::{BatchExportConfig, LedgerBackend};
use crate::domain::{ExportError, Result};
use std::sync::Arc;

/// Create a run store based on the configuration
///
/// # Errors
///
/// Returns an error if the configured backend cannot be created.
pub async fn create_run_store(config: &BatchExportConfig) -> Result<Arc<dyn RunStore>> {
    match config.ledger_backend {
        LedgerBackend::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                ExportError::Configuration(
                    "postgresql configuration is required when ledger_backend = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL run store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            Ok(Arc::new(PostgreSQLRunStore::new(client)) as Arc<dyn RunStore>)
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory run store; run records are lost on exit");
            Ok(Arc::new(MemoryRunStore::new()) as Arc<dyn RunStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend() {
        let config = BatchExportConfig::default();
        let store = create_run_store(&config).await.unwrap();
        assert!(store.test_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_postgresql_backend_requires_section() {
        let config = BatchExportConfig {
            ledger_backend: LedgerBackend::PostgreSQL,
            ..Default::default()
        };
        assert!(matches!(
            create_run_store(&config).await,
            Err(ExportError::Configuration(_))
        ));
    }
}
