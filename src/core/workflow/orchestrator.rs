//! Export workflow orchestrator
//!
//! Drives one run through `ResolvingWindow -> CreatingRun -> Exporting ->
//! Finalizing`, dispatching every step through the shared [`WorkerPool`] with
//! that step's timeouts and retry policy.

use super::options::StepOptions;
use super::pool::WorkerPool;
use super::state::{StateTracker, WorkflowState};
use crate::adapters::clickhouse::StoreConnector;
use crate::config::BatchExportConfig;
use crate::core::activity::{ExportActivity, ExportActivityInputs, ExportOutcome};
use crate::core::ledger::RunLedger;
use crate::core::query::{ExtractionQuery, ObjectStorageEndpoint};
use crate::core::window::{resolve_data_interval, SearchAttributes};
use crate::domain::{
    CreateRunRequest, DataInterval, ErrorKind, ExportSpec, Result, RunId, RunStatus,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use uuid::Uuid;

/// How a run was triggered
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    /// Identifier of this workflow execution, used in logs
    pub workflow_id: String,

    /// Parent schedule, recorded on the run
    pub schedule_id: Option<String>,

    /// Scheduler-provided attributes
    pub search_attributes: SearchAttributes,
}

impl WorkflowContext {
    /// Context of a manually triggered run
    ///
    /// The inputs must carry an explicit `data_interval_end`.
    pub fn manual() -> Self {
        Self {
            workflow_id: format!("batch-export-{}", Uuid::new_v4()),
            schedule_id: None,
            search_attributes: SearchAttributes::new(),
        }
    }

    /// Context of a run started by `schedule_id` for its `scheduled_start_time` tick
    pub fn scheduled(schedule_id: impl Into<String>, scheduled_start_time: impl Into<String>) -> Self {
        let schedule_id = schedule_id.into();
        let scheduled_start_time = scheduled_start_time.into();

        Self {
            workflow_id: format!("{schedule_id}-{scheduled_start_time}"),
            schedule_id: Some(schedule_id),
            search_attributes: SearchAttributes::scheduled(scheduled_start_time),
        }
    }

    /// Override the workflow identifier
    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = workflow_id.into();
        self
    }
}

/// What happened during one run
#[derive(Debug)]
pub struct WorkflowReport {
    /// Workflow execution identifier
    pub workflow_id: String,

    /// Ledger entry, if one was created
    pub run_id: Option<RunId>,

    /// Resolved window, if resolution succeeded
    pub interval: Option<DataInterval>,

    /// `Done` or `DoneFailed`
    pub final_state: WorkflowState,

    /// States visited, in order
    pub transitions: Vec<WorkflowState>,

    /// Export outcome, or the error returned to the caller
    pub outcome: Result<ExportOutcome>,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl WorkflowReport {
    /// Whether the run ended in `Done`
    pub fn is_success(&self) -> bool {
        self.final_state == WorkflowState::Done && self.outcome.is_ok()
    }

    /// The outcome as a plain result
    pub fn into_result(self) -> Result<ExportOutcome> {
        self.outcome
    }
}

#[derive(Debug, Default)]
struct RunProgress {
    run_id: Option<RunId>,
    interval: Option<DataInterval>,
}

/// Runs export workflows
#[derive(Clone)]
pub struct ExportWorkflow {
    ledger: RunLedger,
    activity: Arc<ExportActivity>,
    pool: WorkerPool,
    options: StepOptions,
    shutdown: Option<watch::Receiver<bool>>,
}

impl ExportWorkflow {
    /// Create a workflow from its collaborators
    pub fn new(
        ledger: RunLedger,
        activity: ExportActivity,
        pool: WorkerPool,
        options: StepOptions,
    ) -> Self {
        Self {
            ledger,
            activity: Arc::new(activity),
            pool,
            options,
            shutdown: None,
        }
    }

    /// Workflow wired from configuration
    pub fn from_config(
        config: &BatchExportConfig,
        ledger: RunLedger,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        let endpoint = ObjectStorageEndpoint::from_config(config);
        Self::new(
            ledger,
            ExportActivity::new(connector, endpoint),
            WorkerPool::new(config.workflow.max_concurrent_activities),
            StepOptions::from_config(&config.workflow),
        )
    }

    /// Observe `shutdown`; a `true` value cancels in-flight steps
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Shared worker pool
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Per-step options
    pub fn options(&self) -> &StepOptions {
        &self.options
    }

    /// Run the workflow and return its outcome
    ///
    /// # Errors
    ///
    /// The export error if the export failed, otherwise the finalization
    /// error if finalization failed, or the error that stopped the run earlier.
    pub async fn run(&self, spec: &ExportSpec, context: &WorkflowContext) -> Result<ExportOutcome> {
        self.execute(spec, context).await.into_result()
    }

    /// Run the workflow and report every step
    pub async fn execute(&self, spec: &ExportSpec, context: &WorkflowContext) -> WorkflowReport {
        let started = Instant::now();
        let mut tracker = StateTracker::new(context.workflow_id.clone());
        let mut progress = RunProgress::default();

        tracing::info!(
            workflow_id = %context.workflow_id,
            team_id = %spec.team_id,
            destination_id = %spec.destination_id,
            "Starting batch export workflow"
        );

        let outcome = self.drive(spec, context, &mut tracker, &mut progress).await;

        if !tracker.current().is_terminal() {
            advance(&mut tracker, WorkflowState::DoneFailed);
        }

        let duration = started.elapsed();
        match &outcome {
            Ok(result) => tracing::info!(
                workflow_id = %context.workflow_id,
                rows = result.rows(),
                duration_ms = duration.as_millis() as u64,
                "Batch export workflow finished"
            ),
            Err(e) => tracing::error!(
                workflow_id = %context.workflow_id,
                error = %e,
                error_kind = %e.kind(),
                duration_ms = duration.as_millis() as u64,
                "Batch export workflow failed"
            ),
        }

        WorkflowReport {
            workflow_id: context.workflow_id.clone(),
            run_id: progress.run_id,
            interval: progress.interval,
            final_state: tracker.current(),
            transitions: tracker.into_history(),
            outcome,
            duration,
        }
    }

    async fn drive(
        &self,
        spec: &ExportSpec,
        context: &WorkflowContext,
        tracker: &mut StateTracker,
        progress: &mut RunProgress,
    ) -> Result<ExportOutcome> {
        let interval = match self.resolve_window(spec, &context.search_attributes).await {
            Ok(interval) => interval,
            Err(e) => {
                crate::log_error_with_context!(e, "Failed to resolve data interval");
                advance(tracker, WorkflowState::DoneFailed);
                return Err(e);
            }
        };
        progress.interval = Some(interval);
        advance(tracker, WorkflowState::CreatingRun);

        let request = CreateRunRequest::new(
            spec.team_id,
            spec.destination_id.clone(),
            context.schedule_id.clone(),
            interval,
        );
        let run_id = match self.create_run(&request).await {
            Ok(run_id) => run_id,
            Err(e) if e.kind() == ErrorKind::Cancelled => {
                crate::log_error_with_context!(e, "Export run creation cancelled");
                self.fail_cancelled_creation(&request, tracker, progress).await;
                advance(tracker, WorkflowState::DoneFailed);
                return Err(e);
            }
            Err(e) => {
                crate::log_error_with_context!(e, "Failed to create export run");
                advance(tracker, WorkflowState::DoneFailed);
                return Err(e);
            }
        };
        progress.run_id = Some(run_id);
        advance(tracker, WorkflowState::Exporting);

        let inputs = ExportActivityInputs {
            spec: spec.clone(),
            interval,
        };
        let exported = self.export(&inputs).await;
        if let Err(ref e) = exported {
            crate::log_error_with_context!(e, "Batch export failed");
        }

        advance(tracker, WorkflowState::Finalizing);
        let status = if exported.is_ok() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        let finalized = self.finalize(&run_id, status).await;
        if let Err(ref e) = finalized {
            crate::log_error_with_context!(e, "Failed to finalize export run");
        }

        match (exported, finalized) {
            (Ok(outcome), Ok(())) => {
                advance(tracker, WorkflowState::Done);
                Ok(outcome)
            }
            (Err(e), _) | (Ok(_), Err(e)) => {
                advance(tracker, WorkflowState::DoneFailed);
                Err(e)
            }
        }
    }

    async fn resolve_window(
        &self,
        spec: &ExportSpec,
        attributes: &SearchAttributes,
    ) -> Result<DataInterval> {
        let endpoint = self.activity.endpoint();

        self.pool
            .execute_activity(
                "resolve_window",
                &self.options.resolve_window,
                self.shutdown.clone(),
                move |_| async move {
                    let interval = resolve_data_interval(spec, attributes)?;
                    ExtractionQuery::build(&interval, spec, endpoint)?;
                    Ok(interval)
                },
            )
            .await
    }

    async fn create_run(&self, request: &CreateRunRequest) -> Result<RunId> {
        let ledger = &self.ledger;

        self.pool
            .execute_activity(
                "create_export_run",
                &self.options.create_run,
                self.shutdown.clone(),
                move |_| ledger.create_run(request),
            )
            .await
    }

    /// Marks the run of an interrupted creation as Failed
    ///
    /// The creation may already have been committed. Replaying the request without
    /// the shutdown signal returns that run, or creates it, so it can be finalized.
    async fn fail_cancelled_creation(
        &self,
        request: &CreateRunRequest,
        tracker: &mut StateTracker,
        progress: &mut RunProgress,
    ) {
        let ledger = &self.ledger;
        let recovered = self
            .pool
            .execute_activity(
                "create_export_run",
                &self.options.create_run,
                None,
                move |_| ledger.create_run(request),
            )
            .await;

        let run_id = match recovered {
            Ok(run_id) => run_id,
            Err(e) => {
                crate::log_error_with_context!(e, "Failed to recover cancelled export run");
                return;
            }
        };
        progress.run_id = Some(run_id);

        advance(tracker, WorkflowState::Finalizing);
        if let Err(e) = self.finalize(&run_id, RunStatus::Failed).await {
            crate::log_error_with_context!(e, "Failed to finalize export run");
        }
    }

    async fn export(&self, inputs: &ExportActivityInputs) -> Result<ExportOutcome> {
        let activity = self.activity.as_ref();

        self.pool
            .execute_activity(
                "insert_into_s3_activity",
                &self.options.export,
                self.shutdown.clone(),
                move |_| activity.execute(inputs),
            )
            .await
    }

    async fn finalize(&self, run_id: &RunId, status: RunStatus) -> Result<()> {
        let ledger = &self.ledger;

        self.pool
            .execute_activity(
                "update_export_run_status",
                &self.options.finalize,
                None,
                move |_| ledger.update_run_status(run_id, status),
            )
            .await
    }
}

fn advance(tracker: &mut StateTracker, next: WorkflowState) {
    if let Err(e) = tracker.transition(next) {
        tracing::error!(error = %e, "Workflow state machine rejected transition");
    }
}
