//! The capability the orchestration core needs from the embedding application.
//!
//! A [`TaskExecutor`] turns one [`TaskRequest`] into an output string or an
//! [`ExecutorError`]. What sits behind it (an LLM agent, a cache, a mock) is
//! opaque to the core, and so is the mapping from
//! [`TaskRequest::executor_name`] to a concrete backend: the embedding
//! application resolves names itself, typically by keeping a map of agents and
//! dispatching on the name inside its `execute` implementation.
//!
//! # Example
//!
//! ```ignore
//! use agent_workflow::executor::{ExecutorError, TaskExecutor};
//! use agent_workflow::TaskRequest;
//!
//! struct EchoExecutor;
//!
//! #[async_trait::async_trait]
//! impl TaskExecutor for EchoExecutor {
//!     async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
//!         Ok(format!("{} handled: {}", request.executor_name(), request.description()))
//!     }
//! }
//! ```

pub mod error;
pub mod retry;

pub use error::ExecutorError;
pub use retry::{RetryExecutor, retry_execution};

use crate::task::TaskRequest;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Performs the actual work of a task.
///
/// Implementations may be slow (network calls) and may fail; the core applies
/// timeouts, converts errors and panics into failed results, and never retries.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute one request and return its output.
    ///
    /// The request's `context` carries the caller's base context plus, inside a
    /// workflow, the outputs of every step this one (transitively) depends on,
    /// keyed by step id.
    async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError>;

    /// Returns the name of this executor, used for logging.
    ///
    /// By default, this returns the type name.
    fn name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("UnknownExecutor")
            .to_string()
    }
}

#[async_trait]
impl<T: TaskExecutor + ?Sized> TaskExecutor for Arc<T> {
    async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
        (**self).execute(request).await
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Adapter that turns an async closure into a [`TaskExecutor`].
///
/// The closure receives an owned copy of the request.
///
/// ```ignore
/// use agent_workflow::executor::FnExecutor;
///
/// let executor = FnExecutor::new("upper", |request| async move {
///     Ok(request.description().to_uppercase())
/// });
/// ```
pub struct FnExecutor<F> {
    name: String,
    func: F,
}

impl<F> FnExecutor<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> TaskExecutor for FnExecutor<F>
where
    F: Fn(TaskRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ExecutorError>> + Send + 'static,
{
    async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
        (self.func)(request.clone()).await
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoExecutor;

    #[async_trait]
    impl TaskExecutor for EchoExecutor {
        async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
            Ok(request.description().to_string())
        }
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert_eq!(EchoExecutor.name(), "EchoExecutor");
    }

    #[tokio::test]
    async fn test_arc_delegates() {
        let executor: Arc<dyn TaskExecutor> = Arc::new(EchoExecutor);
        let request = TaskRequest::new("t1", "Echo", "hello");

        assert_eq!(executor.execute(&request).await.unwrap(), "hello");
        assert_eq!(executor.name(), "EchoExecutor");
    }

    #[tokio::test]
    async fn test_fn_executor() {
        let executor = FnExecutor::new("shout", |request: TaskRequest| async move {
            if request.description().is_empty() {
                Err(ExecutorError::ExecutionFailed("empty".to_string()))
            } else {
                Ok(request.description().to_uppercase())
            }
        });

        assert_eq!(executor.name(), "shout");
        let ok = executor.execute(&TaskRequest::new("a", "x", "hi")).await;
        assert_eq!(ok.unwrap(), "HI");
        let err = executor.execute(&TaskRequest::new("b", "x", "")).await;
        assert!(matches!(err, Err(ExecutorError::ExecutionFailed(_))));
    }
}
