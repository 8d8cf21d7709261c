//! Worker pool
//!
//! Every workflow step runs through [`WorkerPool::execute_activity`]. The pool
//! bounds how many attempts run at once across all workflows, applies the
//! step's timeouts to each attempt, retries by policy, and turns panics and
//! cancellation into errors.

use super::options::ActivityOptions;
use crate::domain::{ExportError, Result};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};

/// Bounded set of activity slots shared by concurrent workflows
#[derive(Debug, Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool with `size` slots (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Total number of slots
    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently held by an attempt
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Runs `operation` under `options`, retrying failed attempts by policy
    ///
    /// `operation` receives the 1-based attempt number. When `cancellation` is
    /// given, a `true` value interrupts the slot wait, the attempt, or the
    /// backoff sleep with [`ExportError::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt, a [`ExportError::Timeout`] if a
    /// timeout expired on the last attempt, or [`ExportError::Cancelled`].
    pub async fn execute_activity<T, F, Fut>(
        &self,
        step: &str,
        options: &ActivityOptions,
        mut cancellation: Option<watch::Receiver<bool>>,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = &options.retry_policy;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let error = match self
                .run_attempt(step, options, cancellation.as_mut(), operation(attempt))
                .await
            {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !policy.should_retry(&error, attempt) {
                if attempt > 1 || error.is_retryable() {
                    tracing::warn!(
                        step = step,
                        attempt = attempt,
                        error = %error,
                        error_kind = %error.kind(),
                        "Step failed, giving up"
                    );
                }
                return Err(error);
            }

            let delay = policy.delay_for(attempt);
            crate::log_retry_attempt!(step, attempt + 1, policy.maximum_attempts, error);
            tracing::debug!(step = step, delay_ms = delay.as_millis() as u64, "Backing off");

            with_cancellation(cancellation.as_mut(), tokio::time::sleep(delay)).await?;
        }
    }

    async fn run_attempt<T, Fut>(
        &self,
        step: &str,
        options: &ActivityOptions,
        mut cancellation: Option<&mut watch::Receiver<bool>>,
        attempt: Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let acquire = tokio::time::timeout(options.schedule_to_close_timeout, self.slots.acquire());
        let _permit = match with_cancellation(cancellation.as_deref_mut(), acquire).await? {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return Err(ExportError::Internal("Worker pool is closed".to_string()));
            }
            Err(_) => {
                return Err(ExportError::Timeout(format!(
                    "{step} waited more than {:?} for a worker slot",
                    options.schedule_to_close_timeout
                )));
            }
        };

        let guarded = AssertUnwindSafe(attempt).catch_unwind();
        let timed = tokio::time::timeout(options.start_to_close_timeout, guarded);

        match with_cancellation(cancellation, timed).await? {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(ExportError::Internal(format!(
                "{step} panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Err(_) => Err(ExportError::Timeout(format!(
                "{step} did not finish within {:?}",
                options.start_to_close_timeout
            ))),
        }
    }
}

/// Awaits `future` unless the cancellation signal fires first
async fn with_cancellation<F: Future>(
    cancellation: Option<&mut watch::Receiver<bool>>,
    future: F,
) -> Result<F::Output> {
    let receiver = match cancellation {
        Some(receiver) => receiver,
        None => return Ok(future.await),
    };

    if *receiver.borrow() {
        return Err(ExportError::Cancelled("Shutdown requested".to_string()));
    }

    tokio::select! {
        output = future => Ok(output),
        _ = cancelled(receiver) => Err(ExportError::Cancelled("Shutdown requested".to_string())),
    }
}

/// Resolves once the signal is `true`; never resolves if the sender is gone
async fn cancelled(receiver: &mut watch::Receiver<bool>) {
    loop {
        if *receiver.borrow_and_update() {
            return;
        }
        if receiver.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
