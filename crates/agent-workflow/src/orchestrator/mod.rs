//! Orchestrator - composition of independent task executors.
//!
//! Two components live here:
//!
//! - [`ParallelTaskExecutor`] runs a flat batch of [`TaskRequest`](crate::TaskRequest)s
//!   concurrently (unbounded, bounded by a semaphore, or in sequential batches)
//!   and returns one [`TaskResult`](crate::TaskResult) per request, in input order.
//! - [`WorkflowEngine`] runs a dependency graph of [`WorkflowStep`]s in
//!   topological waves, plus two shorthands built on it: sequential chains and
//!   fan-out/fan-in.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_workflow::orchestrator::{Workflow, WorkflowEngine, WorkflowStep};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = WorkflowEngine::new(Arc::new(MyExecutor));
//!
//!     let workflow = Workflow::builder("feature")
//!         .step(WorkflowStep::new("gather", "Analyst", "Gather requirements"))
//!         .step(WorkflowStep::new("design_ui", "Designer", "Design the UI").depends_on("gather"))
//!         .step(WorkflowStep::new("design_api", "Architect", "Design the API").depends_on("gather"))
//!         .step(
//!             WorkflowStep::new("implement", "Developer", "Implement it")
//!                 .depends_on_all(["design_ui", "design_api"]),
//!         )
//!         .build();
//!
//!     let result = engine.execute_workflow(&workflow).await?;
//!     println!("success: {}, waves: {}", result.success, result.waves_executed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod parallel_executor;
pub mod result;
pub mod workflow;
pub mod workflow_engine;

pub use config::{DEFAULT_STEP_TIMEOUT, OrchestratorConfig};
pub use error::OrchestratorError;
pub use parallel_executor::ParallelTaskExecutor;
pub use result::{WorkflowFailure, WorkflowResult};
pub use workflow::{
    DependencyGraph, ValidationError, ValidationErrors, Workflow, WorkflowBuilder, WorkflowStep,
};
pub use workflow_engine::{FAN_IN_STEP_ID, WorkflowEngine};
