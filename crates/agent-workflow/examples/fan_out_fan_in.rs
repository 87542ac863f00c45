//! Fan-out/fan-in and flat parallel execution example.
//!
//! This example demonstrates:
//! - Sending one task to several reviewers and summarizing their answers
//! - Running a flat batch with a concurrency limit
//! - Aggregating batch results
//!
//! Run with: cargo run --example fan_out_fan_in

use agent_workflow::{
    ExecutorError, OrchestratorConfig, ParallelTaskExecutor, TaskExecutor, TaskRequest,
    WorkflowEngine,
};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Reviewers comment on the task; the summarizer joins what it received.
struct ReviewBoard;

#[async_trait]
impl TaskExecutor for ReviewBoard {
    async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
        let delay_ms = rand::thread_rng().gen_range(20..120);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        if request.executor_name() == "Summarizer" {
            let notes: Vec<String> = request
                .context()
                .iter()
                .map(|(reviewer, note)| format!("{}: {}", reviewer, note.as_str().unwrap_or("")))
                .collect();
            return Ok(format!("Summary of {} reviews\n  {}", notes.len(), notes.join("\n  ")));
        }

        Ok(format!("looks fine after {}ms", delay_ms))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let executor: Arc<dyn TaskExecutor> = Arc::new(ReviewBoard);
    let config = OrchestratorConfig::new().with_step_timeout(Duration::from_secs(10));

    let engine = WorkflowEngine::with_config(Arc::clone(&executor), config.clone());
    let summary = engine
        .execute_fan_out_fan_in(
            "Review pull request #42",
            ["SecurityReviewer", "StyleReviewer", "PerfReviewer"],
            "Summarizer",
        )
        .await?;
    println!("{}\n", summary.output().unwrap_or("no summary"));

    let parallel = ParallelTaskExecutor::with_config(executor, config);
    let requests: Vec<TaskRequest> = (1..=8)
        .map(|i| TaskRequest::new(format!("file_{}", i), "LintReviewer", format!("Lint file {}", i)))
        .collect();

    let results = parallel.execute_parallel_with_limit(requests.clone(), 3).await?;
    for result in &results {
        println!("{:<8} {}", result.request_id(), result.output().unwrap_or("failed"));
    }

    let total_ms = parallel
        .execute_and_aggregate(requests, |results| {
            results.iter().map(|r| r.duration_ms()).sum::<u64>()
        })
        .await;
    println!("\ncumulative review time: {}ms", total_ms);

    Ok(())
}
