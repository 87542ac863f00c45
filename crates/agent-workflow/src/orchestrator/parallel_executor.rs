//! Concurrent execution of flat batches of tasks.
//!
//! Every request handed to a [`ParallelTaskExecutor`] yields exactly one
//! [`TaskResult`], in input order. Executor errors, timeouts, panics and
//! cancellation are all turned into failed results; only invalid arguments
//! are reported as [`OrchestratorError`].

use super::config::OrchestratorConfig;
use super::error::OrchestratorError;
use crate::executor::TaskExecutor;
use crate::task::{FailureKind, TaskRequest, TaskResult};
use futures::future::join_all;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// Runs [`TaskRequest`]s concurrently against one [`TaskExecutor`].
///
/// No pool is shared between calls: each call spawns its own tasks and, when
/// bounded, creates its own semaphore.
///
/// # Examples
///
/// ```ignore
/// use agent_workflow::{ParallelTaskExecutor, TaskRequest};
/// use std::sync::Arc;
///
/// let parallel = ParallelTaskExecutor::new(Arc::new(MyExecutor));
/// let results = parallel
///     .execute_parallel_with_limit(
///         vec![
///             TaskRequest::new("a", "Reviewer", "Review module a"),
///             TaskRequest::new("b", "Reviewer", "Review module b"),
///         ],
///         2,
///     )
///     .await?;
/// assert_eq!(results[0].request_id(), "a");
/// ```
#[derive(Clone)]
pub struct ParallelTaskExecutor {
    executor: Arc<dyn TaskExecutor>,
    config: OrchestratorConfig,
    cancellation_token: CancellationToken,
}

/// A request's place in the output: either a running task or a result that
/// was settled without spawning.
enum Slot {
    Spawned {
        request_id: String,
        started: Instant,
        handle: JoinHandle<TaskResult>,
    },
    Settled(TaskResult),
}

impl ParallelTaskExecutor {
    /// Creates an executor with the default configuration.
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self::with_config(executor, OrchestratorConfig::default())
    }

    pub fn with_config(executor: Arc<dyn TaskExecutor>, config: OrchestratorConfig) -> Self {
        Self {
            executor,
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Uses the given token to cancel queued and in-flight tasks.
    ///
    /// Once the token fires, every unfinished request resolves to a result
    /// with [`FailureKind::Cancelled`].
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    /// Dispatches every request at once and waits for all of them.
    ///
    /// The returned results are in input order, one per request.
    pub async fn execute_parallel(&self, requests: Vec<TaskRequest>) -> Vec<TaskResult> {
        self.dispatch(requests, None).await
    }

    /// Like [`execute_parallel`](Self::execute_parallel), with at most
    /// `max_concurrency` executor calls in flight. Queued requests are admitted
    /// in input order as slots free up.
    pub async fn execute_parallel_with_limit(
        &self,
        requests: Vec<TaskRequest>,
        max_concurrency: usize,
    ) -> Result<Vec<TaskResult>, OrchestratorError> {
        if max_concurrency == 0 {
            return Err(OrchestratorError::InvalidConcurrency(max_concurrency));
        }
        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        Ok(self.dispatch(requests, Some(semaphore)).await)
    }

    /// Splits `requests` into consecutive chunks of at most `batch_size` and
    /// runs them one after another, each chunk fully parallel.
    pub async fn execute_batched(
        &self,
        requests: Vec<TaskRequest>,
        batch_size: usize,
    ) -> Result<Vec<Vec<TaskResult>>, OrchestratorError> {
        if batch_size == 0 {
            return Err(OrchestratorError::InvalidBatchSize(batch_size));
        }

        let total_batches = requests.len().div_ceil(batch_size);
        let mut remaining = requests.into_iter().peekable();
        let mut batches = Vec::with_capacity(total_batches);

        while remaining.peek().is_some() {
            let batch: Vec<TaskRequest> = remaining.by_ref().take(batch_size).collect();
            info!(
                batch_number = batches.len() + 1,
                total_batches,
                batch_len = batch.len(),
                "Executing batch"
            );
            batches.push(self.execute_parallel(batch).await);
        }

        Ok(batches)
    }

    /// Runs [`execute_parallel`](Self::execute_parallel) and folds the results
    /// with `aggregate`.
    pub async fn execute_and_aggregate<R, F>(&self, requests: Vec<TaskRequest>, aggregate: F) -> R
    where
        F: FnOnce(Vec<TaskResult>) -> R,
    {
        let results = self.execute_parallel(requests).await;
        aggregate(results)
    }

    async fn dispatch(
        &self,
        requests: Vec<TaskRequest>,
        limit: Option<Arc<Semaphore>>,
    ) -> Vec<TaskResult> {
        if requests.is_empty() {
            return Vec::new();
        }

        let total = requests.len();
        debug!(
            total_tasks = total,
            max_concurrency = ?limit.as_ref().map(|s| s.available_permits()),
            "Dispatching tasks"
        );

        let mut slots = Vec::with_capacity(total);

        for request in requests {
            let permit = match &limit {
                Some(semaphore) => {
                    let acquired = tokio::select! {
                        biased;
                        _ = self.cancellation_token.cancelled() => None,
                        permit = Arc::clone(semaphore).acquire_owned() => permit.ok(),
                    };
                    match acquired {
                        Some(permit) => Some(permit),
                        None => {
                            warn!(request_id = %request.id(), "Task cancelled before dispatch");
                            slots.push(Slot::Settled(TaskResult::cancelled(
                                request.id(),
                                Duration::ZERO,
                            )));
                            continue;
                        }
                    }
                }
                None => None,
            };

            let timeout = request.timeout().unwrap_or(self.config.step_timeout);
            let task_span = info_span!(
                "task",
                request_id = %request.id(),
                executor = %request.executor_name(),
            );
            let request_id = request.id().to_string();
            let executor = Arc::clone(&self.executor);
            let cancel_token = self.cancellation_token.clone();

            let handle = tokio::spawn(
                async move {
                    let result = Self::run_one(executor, request, timeout, cancel_token).await;
                    drop(permit);
                    result
                }
                .instrument(task_span),
            );

            slots.push(Slot::Spawned {
                request_id,
                started: Instant::now(),
                handle,
            });
        }

        let results = join_all(slots.into_iter().map(|slot| async move {
            match slot {
                Slot::Settled(result) => result,
                Slot::Spawned {
                    request_id,
                    started,
                    handle,
                } => match handle.await {
                    Ok(result) => result,
                    Err(join_error) => Self::join_failure(request_id, started, join_error),
                },
            }
        }))
        .await;

        let failed = results.iter().filter(|r| !r.is_success()).count();
        debug!(
            total_tasks = total,
            succeeded = total - failed,
            failed,
            "All tasks finished"
        );

        results
    }

    async fn run_one(
        executor: Arc<dyn TaskExecutor>,
        request: TaskRequest,
        timeout: Duration,
        cancel_token: CancellationToken,
    ) -> TaskResult {
        let started = Instant::now();
        debug!("Task started");

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                warn!("Task cancelled");
                TaskResult::cancelled(request.id(), started.elapsed())
            }
            outcome = tokio::time::timeout(timeout, executor.execute(&request)) => {
                match outcome {
                    Ok(Ok(output)) => {
                        debug!(duration = ?started.elapsed(), "Task completed");
                        TaskResult::success(request.id(), output, started.elapsed())
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Task failed");
                        TaskResult::failure(
                            request.id(),
                            FailureKind::Executor,
                            e.to_string(),
                            started.elapsed(),
                        )
                    }
                    Err(_) => {
                        warn!(timeout = ?timeout, "Task timed out");
                        TaskResult::timed_out(request.id(), timeout)
                    }
                }
            }
        }
    }

    fn join_failure(request_id: String, started: Instant, join_error: JoinError) -> TaskResult {
        if join_error.is_panic() {
            let message = panic_message(join_error.into_panic());
            warn!(request_id = %request_id, panic = %message, "Task panicked");
            TaskResult::failure(
                request_id,
                FailureKind::Panicked,
                format!("Task panicked: {}", message),
                started.elapsed(),
            )
        } else {
            warn!(request_id = %request_id, "Task was aborted");
            TaskResult::cancelled(request_id, started.elapsed())
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for ParallelTaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelTaskExecutor")
            .field("executor", &self.executor.name())
            .field("config", &self.config)
            .finish()
    }
}
