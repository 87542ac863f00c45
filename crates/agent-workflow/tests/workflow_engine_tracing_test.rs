//! Tracing tests for WorkflowEngine
//!
//! These tests verify that structured tracing events and spans are properly
//! emitted during workflow execution.

use agent_workflow::executor::{ExecutorError, TaskExecutor};
use agent_workflow::orchestrator::{Workflow, WorkflowEngine, WorkflowStep};
use agent_workflow::TaskRequest;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Captures tracing output to a string for verification
#[derive(Clone)]
struct TestWriter {
    output: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl TestWriter {
    fn new() -> Self {
        Self {
            output: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    fn get_output(&self) -> String {
        let bytes = self.output.lock().unwrap();
        String::from_utf8_lossy(&bytes).to_string()
    }
}

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.output.lock().unwrap().flush()
    }
}

impl<'a> MakeWriter<'a> for TestWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture() -> (TestWriter, tracing::subscriber::DefaultGuard) {
    let writer = TestWriter::new();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_ansi(false)
        .with_writer(writer.clone())
        .finish();

    let guard = tracing::subscriber::set_default(subscriber);
    (writer, guard)
}

// ============================================================================
// Mock Executors
// ============================================================================

/// Succeeds unless the description is "fail".
struct SimpleExecutor;

#[async_trait::async_trait]
impl TaskExecutor for SimpleExecutor {
    async fn execute(&self, request: &TaskRequest) -> Result<String, ExecutorError> {
        if request.description() == "fail" {
            Err(ExecutorError::ExecutionFailed("simulated failure".to_string()))
        } else {
            Ok(format!("{} ok", request.id()))
        }
    }
}

fn step(id: &str, description: &str) -> WorkflowStep {
    WorkflowStep::new(id, "Simple", description)
}

// ============================================================================
// Tracing Tests
// ============================================================================

#[tokio::test]
async fn test_top_level_span_created() {
    let (writer, _guard) = capture();

    let engine = WorkflowEngine::new(Arc::new(SimpleExecutor));
    let workflow = Workflow::new("traced_flow", vec![step("step_1", "work")]);
    engine.execute_workflow(&workflow).await.unwrap();

    let output = writer.get_output();

    assert!(
        output.contains("workflow_execute"),
        "Top-level span 'workflow_execute' not found in output:\n{}",
        output
    );
    assert!(
        output.contains("workflow_id=traced_flow"),
        "Span should include workflow_id attribute in output:\n{}",
        output
    );
    assert!(
        output.contains("total_steps=1"),
        "Span should include total_steps attribute in output:\n{}",
        output
    );
}

#[tokio::test]
async fn test_wave_and_task_spans_created() {
    let (writer, _guard) = capture();

    let engine = WorkflowEngine::new(Arc::new(SimpleExecutor));
    let workflow = Workflow::new(
        "waves",
        vec![
            step("step_1", "work"),
            step("step_2", "work"),
            step("step_3", "work").depends_on("step_1"),
        ],
    );
    let result = engine.execute_workflow(&workflow).await.unwrap();
    assert_eq!(result.waves_executed, 2);

    let output = writer.get_output();

    assert!(
        output.contains("wave_number=1") && output.contains("wave_number=2"),
        "Both wave spans should be present in output:\n{}",
        output
    );
    assert!(
        output.contains("ready_steps=2"),
        "First wave should report two ready steps in output:\n{}",
        output
    );
    assert!(
        output.contains("request_id=step_3") && output.contains("executor=Simple"),
        "Task span should carry request_id and executor in output:\n{}",
        output
    );
}

#[tokio::test]
async fn test_step_failure_is_logged() {
    let (writer, _guard) = capture();

    let engine = WorkflowEngine::new(Arc::new(SimpleExecutor));
    let workflow = Workflow::new(
        "failing",
        vec![step("broken", "fail"), step("after", "work").depends_on("broken")],
    );
    let result = engine.execute_workflow(&workflow).await.unwrap();
    assert!(!result.success);

    let output = writer.get_output();

    assert!(
        output.contains("WARN") && output.contains("Step failed"),
        "Step failure warning not found in output:\n{}",
        output
    );
    assert!(
        output.contains("simulated failure"),
        "Failure message should be logged in output:\n{}",
        output
    );
    assert!(
        output.contains("Workflow stopped after failed wave"),
        "Early stop should be logged in output:\n{}",
        output
    );
}

#[tokio::test]
async fn test_validation_failure_is_logged() {
    let (writer, _guard) = capture();

    let engine = WorkflowEngine::new(Arc::new(SimpleExecutor));
    let workflow = Workflow::new("cyclic", vec![step("loop", "work").depends_on("loop")]);
    engine.execute_workflow(&workflow).await.unwrap();

    let output = writer.get_output();

    assert!(
        output.contains("Workflow validation failed"),
        "Validation warning not found in output:\n{}",
        output
    );
    assert!(
        output.contains("Dependency cycle: loop -> loop"),
        "Cycle should be described in output:\n{}",
        output
    );
    assert!(
        !output.contains("wave_number"),
        "No wave should start for an invalid workflow:\n{}",
        output
    );
}
