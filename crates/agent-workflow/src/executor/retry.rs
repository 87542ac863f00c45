//! Opt-in retry decorator for executors.
//!
//! The orchestration core never retries on its own. An embedding application
//! that wants retries wraps its executor in a [`RetryExecutor`] before handing
//! it to the engine; the engine then sees a single, slower call.

use super::{ExecutorError, TaskExecutor};
use crate::task::TaskRequest;
use async_trait::async_trait;
use std::future::Future;
use tracing::{error, info, warn};

/// Executes an operation with retry logic.
///
/// Only errors for which [`ExecutorError::is_retryable`] returns `true` are
/// retried, waiting [`ExecutorError::retry_delay`] between attempts.
///
/// # Arguments
///
/// * `max_retries` - Maximum number of retry attempts (not including the first attempt)
/// * `request` - The request to pass to the operation
/// * `operation` - An async function that performs the operation
pub async fn retry_execution<F, Fut, T>(
    max_retries: u32,
    request: &TaskRequest,
    operation: F,
) -> Result<T, ExecutorError>
where
    F: Fn(&TaskRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ExecutorError>> + Send,
    T: Send,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation(request).await {
            Ok(output) => {
                if attempts > 1 {
                    info!(
                        request_id = %request.id(),
                        "Operation succeeded on attempt {}/{}",
                        attempts,
                        max_retries + 1
                    );
                }
                return Ok(output);
            }
            Err(e) if e.is_retryable() && attempts <= max_retries => {
                let delay = e.retry_delay(attempts);
                warn!(
                    request_id = %request.id(),
                    "Operation failed (attempt {}/{}): {}. Retrying in {:?}",
                    attempts,
                    max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    error!(
                        request_id = %request.id(),
                        "Operation failed after {} attempts: {}", attempts, e
                    );
                } else {
                    error!(request_id = %request.id(), "Operation failed with non-retryable error: {}", e);
                }
                return Err(e);
            }
        }
    }
}

/// A wrapper executor that adds retry logic to any underlying executor.
///
/// ```ignore
/// use agent_workflow::executor::RetryExecutor;
///
/// let executor = RetryExecutor::new(MyLlmExecutor::new(), 2); // up to 3 attempts
/// ```
pub struct RetryExecutor<E: TaskExecutor> {
    inner: E,
    max_retries: u32,
}

impl<E: TaskExecutor> RetryExecutor<E> {
    /// * `inner` - The executor to wrap
    /// * `max_retries` - Maximum number of retry attempts (not including the first attempt)
    pub fn new(inner: E, max_retries: u32) -> Self {
        Self { inner, max_retries }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[async_trait]
impl<E: TaskExecutor> TaskExecutor for RetryExecutor<E> {
    async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
        let inner = &self.inner;
        retry_execution(self.max_retries, request, move |_| inner.execute(request)).await
    }

    fn name(&self) -> String {
        self.inner.name()
    }
}
