//! 'agent-workflow' - Orchestration of independent task executors.
//!
//! This crate composes black-box executors (LLM agents, tools, services) into
//! larger jobs without knowing how any of them works. An executor only has to
//! turn a [`TaskRequest`] into an output string; the crate takes care of
//! running requests concurrently, ordering them by their dependencies, passing
//! outputs along as context, and turning every error, timeout or panic into a
//! [`TaskResult`].
//!
//! - [`ParallelTaskExecutor`]: flat batches, with optional concurrency limit,
//!   sequential batching and aggregation.
//! - [`WorkflowEngine`]: dependency graphs in topological waves, sequential
//!   chains and fan-out/fan-in.
//!
//! The crate emits [`tracing`] spans and events but installs no subscriber.

pub mod executor;
pub mod orchestrator;
pub mod task;

pub use executor::{ExecutorError, FnExecutor, RetryExecutor, TaskExecutor};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, ParallelTaskExecutor, ValidationError,
    ValidationErrors, Workflow, WorkflowBuilder, WorkflowEngine, WorkflowFailure, WorkflowResult,
    WorkflowStep,
};
pub use task::{FailureKind, TaskContext, TaskRequest, TaskResult};

pub use tokio_util::sync::CancellationToken;
