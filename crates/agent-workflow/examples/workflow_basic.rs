//! Workflow example with mock executors resolved by name.
//!
//! This example demonstrates:
//! - Resolving `executor_name` to a concrete backend inside the embedding application
//! - Running a dependency graph in waves
//! - Reading step outputs and the early-stop report
//!
//! Run with: cargo run --example workflow_basic
//! Set RUST_LOG=debug to see every step transition.

use agent_workflow::{
    ExecutorError, FnExecutor, TaskExecutor, TaskRequest, Workflow, WorkflowEngine, WorkflowStep,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Routes each request to the executor registered under its name.
struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn TaskExecutor>>,
}

impl ExecutorRegistry {
    fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    fn register(mut self, name: &str, executor: impl TaskExecutor + 'static) -> Self {
        self.executors.insert(name.to_string(), Arc::new(executor));
        self
    }
}

#[async_trait]
impl TaskExecutor for ExecutorRegistry {
    async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
        let executor = self
            .executors
            .get(request.executor_name())
            .ok_or_else(|| ExecutorError::UnknownExecutor(request.executor_name().to_string()))?;
        executor.execute(request).await
    }
}

/// A mock agent that answers after a short pause, mentioning what it was given.
fn mock_agent(role: &'static str) -> impl TaskExecutor {
    FnExecutor::new(role, move |request: TaskRequest| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let inputs: Vec<&String> = request.context().keys().collect();
        Ok::<_, ExecutorError>(format!(
            "[{}] {} (inputs: {:?})",
            role,
            request.description(),
            inputs
        ))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let registry = ExecutorRegistry::new()
        .register("Analyst", mock_agent("Analyst"))
        .register("Designer", mock_agent("Designer"))
        .register("Architect", mock_agent("Architect"))
        .register("Developer", mock_agent("Developer"))
        .register("Tester", mock_agent("Tester"));

    let engine = WorkflowEngine::new(Arc::new(registry));

    let workflow = Workflow::builder("feature")
        .name("Feature delivery")
        .step(WorkflowStep::new("gather", "Analyst", "Gather requirements"))
        .step(WorkflowStep::new("design_ui", "Designer", "Design the UI").depends_on("gather"))
        .step(WorkflowStep::new("design_api", "Architect", "Design the API").depends_on("gather"))
        .step(
            WorkflowStep::new("implement", "Developer", "Implement the feature")
                .depends_on_all(["design_ui", "design_api"]),
        )
        .step(WorkflowStep::new("test", "Tester", "Test the feature").depends_on("implement"))
        .build();

    println!("Waves: {:?}\n", workflow.topological_waves()?);

    let result = engine.execute_workflow(&workflow).await?;
    println!(
        "success: {}, waves executed: {}",
        result.success, result.waves_executed
    );
    for (step_id, step_result) in &result.step_results {
        println!(
            "  {:<10} {:>4}ms  {}",
            step_id,
            step_result.duration_ms(),
            step_result.output().unwrap_or("-")
        );
    }

    // A step routed to an unregistered executor stops the run after its wave.
    let broken = Workflow::builder("broken")
        .step(WorkflowStep::new("gather", "Analyst", "Gather requirements"))
        .step(WorkflowStep::new("deploy", "Operator", "Deploy").depends_on("gather"))
        .step(WorkflowStep::new("announce", "Analyst", "Announce").depends_on("deploy"))
        .build();

    let result = engine.execute_workflow(&broken).await?;
    println!("\nsuccess: {}", result.success);
    println!("failed step: {:?}", result.failed_step_id);
    println!("skipped: {:?}", result.skipped_steps);
    if let Some(message) = result.error_message() {
        println!("reason: {}", message);
    }

    Ok(())
}
