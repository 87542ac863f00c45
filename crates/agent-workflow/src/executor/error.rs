//! Error types for the executor module.

use std::time::Duration;
use thiserror::Error;

/// Errors a [`TaskExecutor`](super::TaskExecutor) may report for one request.
///
/// The orchestration core never propagates these: every error is turned into a
/// failed [`TaskResult`](crate::TaskResult) for the request that produced it.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The task ran but did not produce a usable result.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Spawning or talking to the backing process/service failed.
    #[error("Process error: {0}")]
    ProcessError(String),

    /// The embedding application could not resolve the requested executor name.
    #[error("No executor registered under name: {0}")]
    UnknownExecutor(String),

    /// I/O error occurred during execution.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A generic error for other cases.
    #[error("Executor error: {0}")]
    Other(String),
}

impl ExecutorError {
    /// Check if this error should trigger an automatic retry.
    ///
    /// Returns `true` for errors that are likely transient:
    /// - `ProcessError`: process or network communication issues
    /// - `IoError`: temporary I/O failures
    ///
    /// Everything else is reported straight back to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutorError::ProcessError(_) | ExecutorError::IoError(_))
    }

    /// Delay before the given retry attempt (1-based).
    ///
    /// Exponential backoff starting at 200ms, capped at 10s, with up to 25%
    /// random jitter added.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let exponent = attempt.saturating_sub(1).min(16);
        let base_ms = (200u64 << exponent).min(10_000);
        let jitter_ms = rand::thread_rng().gen_range(0..=base_ms / 4);
        Duration::from_millis(base_ms + jitter_ms)
    }
}
