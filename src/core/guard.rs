//! Row-count guard
//!
//! Counting rows is cheap next to the bulk export, so every export first checks
//! whether its window holds anything at all.

use crate::adapters::clickhouse::AnalyticalStore;
use crate::core::query::ExtractionQuery;
use crate::domain::{ExportError, Result};

/// Outcome of the row-count check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The window is empty or the count was absent
    Skip,
    /// The window holds `rows` rows
    Export { rows: u64 },
}

impl GuardDecision {
    /// Whether the bulk export should run
    pub fn should_export(&self) -> bool {
        matches!(self, GuardDecision::Export { .. })
    }
}

/// Checks store liveness and counts the rows in a window
pub struct RowCountGuard;

impl RowCountGuard {
    /// Runs the check
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Connection`] if the store fails its liveness probe, or
    /// the count statement's error.
    pub async fn check(store: &dyn AnalyticalStore, query: &ExtractionQuery) -> Result<GuardDecision> {
        if !store.is_alive().await {
            return Err(ExportError::Connection(
                "Cannot establish connection to ClickHouse".to_string(),
            ));
        }

        let decision = match store.fetch_count(&query.count_statement()).await? {
            None | Some(0) => GuardDecision::Skip,
            Some(rows) => GuardDecision::Export { rows },
        };

        tracing::debug!(
            table = query.table_name(),
            interval = %query.interval(),
            decision = ?decision,
            "Row count checked"
        );

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clickhouse::Statement;
    use crate::config::schema::Environment;
    use crate::core::query::ObjectStorageEndpoint;
    use crate::domain::interval::{parse_instant, DataInterval};
    use crate::domain::ExportSpec;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CountingStore {
        alive: bool,
        count: Option<u64>,
        statements: Mutex<Vec<String>>,
    }

    impl CountingStore {
        fn new(alive: bool, count: Option<u64>) -> Self {
            Self {
                alive,
                count,
                statements: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AnalyticalStore for CountingStore {
        async fn is_alive(&self) -> bool {
            self.alive
        }

        async fn fetch_count(&self, statement: &Statement) -> Result<Option<u64>> {
            self.statements.lock().unwrap().push(statement.sql().to_string());
            Ok(self.count)
        }

        async fn execute(&self, statement: &Statement) -> Result<()> {
            self.statements.lock().unwrap().push(statement.sql().to_string());
            Ok(())
        }
    }

    fn query() -> ExtractionQuery {
        let spec = ExportSpec::parse_inputs(
            r#"{
                "bucket_name": "bucket", "region": "us-east-1",
                "key_template": "{partition_id}.csv", "batch_window_size": 3600,
                "team_id": 1, "destination_id": "d"
            }"#,
        )
        .unwrap();
        let interval =
            DataInterval::ending_at(parse_instant("2024-01-01T01:00:00Z").unwrap(), 3600).unwrap();
        let endpoint = ObjectStorageEndpoint::for_environment(Environment::Test, "http://s3:9000");
        ExtractionQuery::build(&interval, &spec, &endpoint).unwrap()
    }

    #[tokio::test]
    async fn test_zero_rows_skips() {
        let store = CountingStore::new(true, Some(0));
        let decision = RowCountGuard::check(&store, &query()).await.unwrap();
        assert_eq!(decision, GuardDecision::Skip);
        assert!(!decision.should_export());
    }

    #[tokio::test]
    async fn test_absent_count_skips() {
        let store = CountingStore::new(true, None);
        let decision = RowCountGuard::check(&store, &query()).await.unwrap();
        assert!(!decision.should_export());
    }

    #[tokio::test]
    async fn test_rows_present_exports() {
        let store = CountingStore::new(true, Some(10));
        let decision = RowCountGuard::check(&store, &query()).await.unwrap();
        assert_eq!(decision, GuardDecision::Export { rows: 10 });
        assert!(decision.should_export());

        let statements = store.statements.lock().unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("SELECT count(*)"));
    }

    #[tokio::test]
    async fn test_dead_store_is_connection_fault() {
        let store = CountingStore::new(false, Some(10));
        let err = RowCountGuard::check(&store, &query()).await.unwrap_err();
        assert!(matches!(err, ExportError::Connection(_)));
        assert!(store.statements.lock().unwrap().is_empty());
    }
}
