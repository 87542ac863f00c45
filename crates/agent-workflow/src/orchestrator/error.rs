//! Error types for orchestrator operations.
//!
//! Only usage errors live here. Task failures, timeouts and failed workflows
//! are reported as values ([`TaskResult`](crate::TaskResult),
//! [`WorkflowResult`](super::WorkflowResult)), never as errors.

use super::workflow::ValidationErrors;
use thiserror::Error;

/// Errors caused by invalid arguments to an orchestrator call.
///
/// These are rejected before any task is dispatched.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A concurrency limit of zero was requested.
    #[error("max_concurrency must be greater than zero, got {0}")]
    InvalidConcurrency(usize),

    /// A batch size of zero was requested.
    #[error("batch_size must be greater than zero, got {0}")]
    InvalidBatchSize(usize),

    /// A workflow assembled by a convenience pattern is malformed.
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(#[from] ValidationErrors),

    /// `execute_chain` was called without any step.
    #[error("A chain needs at least one step")]
    EmptyChain,

    /// `execute_fan_out_fan_in` was called without any fan-out executor.
    #[error("Fan-out needs at least one executor")]
    EmptyFanOut,
}
