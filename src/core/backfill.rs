//! Historical backfills
//!
//! A backfill splits `[start, end)` into consecutive full windows of
//! `batch_window_size` seconds and runs one manual workflow per window.

use crate::core::activity::ExportOutcome;
use crate::core::workflow::{ExportWorkflow, WorkflowContext, WorkflowReport};
use crate::domain::{DataInterval, ExportError, ExportSpec, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};

/// Splits `[start, end)` into consecutive windows of `window_size_seconds`
///
/// A trailing partial window is dropped; it belongs to a later run.
///
/// # Errors
///
/// Returns [`ExportError::Configuration`] if the range is empty, the window
/// size is zero or not representable, or the range holds no full window.
pub fn plan_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_size_seconds: u64,
) -> Result<Vec<DataInterval>> {
    if start >= end {
        return Err(ExportError::Configuration(format!(
            "Backfill start {} must be before end {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }

    let step = i64::try_from(window_size_seconds)
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(ChronoDuration::try_seconds)
        .ok_or_else(|| {
            ExportError::Configuration(format!("Invalid window size: {window_size_seconds}"))
        })?;

    let mut windows = Vec::new();
    let mut window_start = start;
    while let Some(window_end) = window_start.checked_add_signed(step) {
        if window_end > end {
            break;
        }
        windows.push(DataInterval::ending_at(window_end, window_size_seconds)?);
        window_start = window_end;
    }

    if windows.is_empty() {
        return Err(ExportError::Configuration(format!(
            "Backfill range [{}, {}) is shorter than one {window_size_seconds}s window",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }

    Ok(windows)
}

/// Totals of a backfill
#[derive(Debug)]
pub struct BackfillSummary {
    /// One report per window, ordered by window start
    pub reports: Vec<WorkflowReport>,

    /// Wall-clock duration of the whole backfill
    pub duration: Duration,
}

impl BackfillSummary {
    /// Windows attempted
    pub fn total_windows(&self) -> usize {
        self.reports.len()
    }

    /// Windows that exported rows
    pub fn exported(&self) -> usize {
        self.count(|outcome| matches!(outcome, Ok(ExportOutcome::Exported { .. })))
    }

    /// Empty windows
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Ok(ExportOutcome::Skipped)))
    }

    /// Windows whose run failed
    pub fn failed(&self) -> usize {
        self.count(|outcome| outcome.is_err())
    }

    /// Rows written across all windows
    pub fn total_rows(&self) -> u64 {
        self.reports
            .iter()
            .filter_map(|report| report.outcome.as_ref().ok())
            .map(ExportOutcome::rows)
            .sum()
    }

    /// Reports of failed windows
    pub fn failures(&self) -> impl Iterator<Item = &WorkflowReport> {
        self.reports.iter().filter(|report| report.outcome.is_err())
    }

    /// Whether every window succeeded
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&Result<ExportOutcome>) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Runs one workflow per planned window, at most `concurrency` at a time
///
/// Every window runs to completion; a failed window does not stop the others.
///
/// # Errors
///
/// Only planning errors; per-window failures are reported in the summary.
pub async fn run_backfill(
    workflow: &ExportWorkflow,
    spec: &ExportSpec,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    concurrency: usize,
) -> Result<BackfillSummary> {
    let started = Instant::now();
    let windows = plan_windows(start, end, spec.batch_window_size)?;

    tracing::info!(
        team_id = %spec.team_id,
        destination_id = %spec.destination_id,
        windows = windows.len(),
        concurrency = concurrency,
        "Starting backfill"
    );

    let mut reports: Vec<WorkflowReport> = stream::iter(windows)
        .map(|window| {
            let window_spec = spec.with_data_interval_end(window.end().to_rfc3339());
            let context = WorkflowContext::manual().with_workflow_id(format!(
                "backfill-{}-{}-{}",
                spec.team_id,
                spec.destination_id,
                window.end().to_rfc3339()
            ));
            async move { workflow.execute(&window_spec, &context).await }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    reports.sort_by_key(|report| report.interval.map(|interval| interval.start()));

    let summary = BackfillSummary {
        reports,
        duration: started.elapsed(),
    };

    tracing::info!(
        windows = summary.total_windows(),
        exported = summary.exported(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        rows = summary.total_rows(),
        duration_ms = summary.duration.as_millis() as u64,
        "Backfill finished"
    );

    Ok(summary)
}
