//! Shared fakes for workflow integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use batch_export::adapters::clickhouse::{AnalyticalStore, Statement, StoreConnector};
use batch_export::adapters::ledger::{MemoryRunStore, RunStore};
use batch_export::config::Environment;
use batch_export::core::activity::ExportActivity;
use batch_export::core::ledger::RunLedger;
use batch_export::core::query::ObjectStorageEndpoint;
use batch_export::core::workflow::{
    ActivityOptions, ExportWorkflow, RetryPolicy, StepOptions, WorkerPool,
};
use batch_export::domain::{
    CreateRunRequest, DestinationId, ErrorKind, ExportError, ExportRun, ExportSpec, Result, RunId,
    RunStatus, TeamId,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LOCAL_ENDPOINT: &str = "http://object-storage:19000";

/// Inputs for an hourly export of team 2 ending at 2024-01-01T01:00:00Z
pub fn hourly_spec() -> ExportSpec {
    spec_with(r#""data_interval_end": "2024-01-01T01:00:00+00:00""#)
}

/// Hourly inputs with extra JSON members appended
pub fn spec_with(extra: &str) -> ExportSpec {
    let separator = if extra.is_empty() { "" } else { "," };
    ExportSpec::parse_inputs(&format!(
        r#"{{
            "bucket_name": "exports",
            "region": "us-east-1",
            "key_template": "{{table_name}}/{{partition_id}}.csv",
            "batch_window_size": 3600,
            "team_id": 2,
            "destination_id": "s3-main"{separator}
            {extra}
        }}"#
    ))
    .unwrap()
}

/// Behaviour of the fake analytical store
#[derive(Debug)]
pub struct StoreBehaviour {
    pub alive: bool,
    pub count: Option<u64>,
    /// Errors returned by the first export statements, in order
    pub export_failures: Vec<ExportError>,
    pub export_panics: bool,
    pub export_delay: Option<Duration>,
}

impl Default for StoreBehaviour {
    fn default() -> Self {
        Self {
            alive: true,
            count: Some(0),
            export_failures: Vec::new(),
            export_panics: false,
            export_delay: None,
        }
    }
}

impl StoreBehaviour {
    pub fn with_rows(rows: u64) -> Self {
        Self {
            count: Some(rows),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            alive: false,
            ..Self::default()
        }
    }
}

/// Records every statement sent by every session
pub struct FakeStore {
    behaviour: StoreBehaviour,
    export_failures: Mutex<VecDeque<ExportError>>,
    statements: Mutex<Vec<Statement>>,
    connections: AtomicU32,
}

impl FakeStore {
    pub fn new(mut behaviour: StoreBehaviour) -> Arc<Self> {
        let failures = std::mem::take(&mut behaviour.export_failures).into();
        Arc::new(Self {
            behaviour,
            export_failures: Mutex::new(failures),
            statements: Mutex::new(Vec::new()),
            connections: AtomicU32::new(0),
        })
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    pub fn export_statements(&self) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|statement| statement.sql().starts_with("INSERT INTO FUNCTION s3("))
            .collect()
    }

    pub fn count_statements(&self) -> usize {
        self.statements()
            .iter()
            .filter(|statement| statement.sql().starts_with("SELECT count(*)"))
            .count()
    }

    pub fn connections(&self) -> u32 {
        self.connections.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    store: Arc<FakeStore>,
}

#[async_trait]
impl AnalyticalStore for FakeSession {
    async fn is_alive(&self) -> bool {
        self.store.behaviour.alive
    }

    async fn fetch_count(&self, statement: &Statement) -> Result<Option<u64>> {
        self.store.statements.lock().unwrap().push(statement.clone());
        Ok(self.store.behaviour.count)
    }

    async fn execute(&self, statement: &Statement) -> Result<()> {
        self.store.statements.lock().unwrap().push(statement.clone());

        if let Some(delay) = self.store.behaviour.export_delay {
            tokio::time::sleep(delay).await;
        }
        if self.store.behaviour.export_panics {
            panic!("export session crashed");
        }

        let failure = self.store.export_failures.lock().unwrap().pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Opens sessions on a [`FakeStore`]
pub struct FakeConnector {
    pub store: Arc<FakeStore>,
}

#[async_trait]
impl StoreConnector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn AnalyticalStore>> {
        self.store.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            store: Arc::clone(&self.store),
        }))
    }
}

/// Memory store that can fail calls before delegating
#[derive(Default)]
pub struct FlakyRunStore {
    pub inner: MemoryRunStore,
    create_failures: Mutex<VecDeque<ExportError>>,
    fail_create_after_insert: AtomicU32,
    update_failures: Mutex<VecDeque<ExportError>>,
    pub create_calls: AtomicU32,
    pub update_calls: AtomicU32,
}

impl FlakyRunStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_creates(self: Arc<Self>, errors: Vec<ExportError>) -> Arc<Self> {
        self.create_failures.lock().unwrap().extend(errors);
        self
    }

    /// The first `times` creates insert the run, then report a lost response
    pub fn lose_create_responses(self: Arc<Self>, times: u32) -> Arc<Self> {
        self.fail_create_after_insert.store(times, Ordering::SeqCst);
        self
    }

    pub fn fail_updates(self: Arc<Self>, errors: Vec<ExportError>) -> Arc<Self> {
        self.update_failures.lock().unwrap().extend(errors);
        self
    }

    pub async fn runs(&self) -> Vec<ExportRun> {
        self.inner.runs().await
    }
}

#[async_trait]
impl RunStore for FlakyRunStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn create_run(&self, request: &CreateRunRequest) -> Result<RunId> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let failure = self.create_failures.lock().unwrap().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        let run_id = self.inner.create_run(request).await?;

        let lost = self
            .fail_create_after_insert
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            return Err(ExportError::LedgerUnavailable(
                "connection reset before response".to_string(),
            ));
        }

        Ok(run_id)
    }

    async fn update_run_status(&self, run_id: &RunId, status: RunStatus) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let failure = self.update_failures.lock().unwrap().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        self.inner.update_run_status(run_id, status).await
    }

    async fn get_run(&self, run_id: &RunId) -> Result<Option<ExportRun>> {
        self.inner.get_run(run_id).await
    }

    async fn list_runs(
        &self,
        team_id: TeamId,
        destination_id: &DestinationId,
        limit: usize,
    ) -> Result<Vec<ExportRun>> {
        self.inner.list_runs(team_id, destination_id, limit).await
    }
}

/// Step options with millisecond backoff so retries finish quickly
pub fn fast_step_options() -> StepOptions {
    let base = ActivityOptions {
        start_to_close_timeout: Duration::from_secs(5),
        schedule_to_close_timeout: Duration::from_secs(5),
        retry_policy: RetryPolicy {
            initial_interval: Duration::from_millis(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_millis(5),
            maximum_attempts: 3,
            non_retryable: Vec::new(),
        },
    };
    let with = |kinds: &[ErrorKind]| {
        base.clone()
            .with_retry_policy(base.retry_policy.clone().with_non_retryable(kinds))
    };

    StepOptions {
        resolve_window: with(&[ErrorKind::Configuration]),
        create_run: with(&[ErrorKind::Integrity]),
        export: with(&[ErrorKind::Configuration, ErrorKind::Connectivity]),
        finalize: base.clone(),
    }
}

/// Workflow over a fake store and `run_store`
pub fn workflow(store: &Arc<FakeStore>, run_store: Arc<dyn RunStore>) -> ExportWorkflow {
    workflow_with_options(store, run_store, fast_step_options())
}

pub fn workflow_with_options(
    store: &Arc<FakeStore>,
    run_store: Arc<dyn RunStore>,
    options: StepOptions,
) -> ExportWorkflow {
    let endpoint = ObjectStorageEndpoint::for_environment(Environment::Test, LOCAL_ENDPOINT);
    let activity = ExportActivity::new(
        Arc::new(FakeConnector {
            store: Arc::clone(store),
        }),
        endpoint,
    );

    ExportWorkflow::new(RunLedger::new(run_store), activity, WorkerPool::new(4), options)
}
