//! Dependency-aware workflow execution.
//!
//! The [`WorkflowEngine`] validates a [`Workflow`], groups its steps into
//! topological waves and runs each wave through a [`ParallelTaskExecutor`].
//! A wave starts only after the previous one has fully completed, and the run
//! stops after the first wave containing a failure.
//!
//! Each step receives its own context snapshot: the caller's base context
//! plus the output of every step it transitively depends on, stored as a JSON
//! string under that step's id. Sibling and unrelated outputs are never
//! visible.

use super::config::OrchestratorConfig;
use super::error::OrchestratorError;
use super::parallel_executor::ParallelTaskExecutor;
use super::result::{WorkflowFailure, WorkflowResult};
use super::workflow::{
    DependencyGraph, ExecutionStateManager, StepState, Workflow, WorkflowStep,
};
use crate::executor::TaskExecutor;
use crate::task::{TaskContext, TaskResult};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// Step id given to the aggregator step of
/// [`WorkflowEngine::execute_fan_out_fan_in`].
pub const FAN_IN_STEP_ID: &str = "fan_in";

/// Runs workflows, chains and fan-out/fan-in patterns against a
/// [`TaskExecutor`].
///
/// # Examples
///
/// ```ignore
/// use agent_workflow::{Workflow, WorkflowEngine, WorkflowStep};
/// use std::sync::Arc;
///
/// let engine = WorkflowEngine::new(Arc::new(MyExecutor));
/// let workflow = Workflow::builder("feature")
///     .step(WorkflowStep::new("design", "Architect", "Design the feature"))
///     .step(WorkflowStep::new("implement", "Developer", "Implement it").depends_on("design"))
///     .build();
///
/// let result = engine.execute_workflow(&workflow).await?;
/// if !result.success {
///     eprintln!("{}", result.error_message().unwrap_or_default());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    parallel: ParallelTaskExecutor,
}

impl WorkflowEngine {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self::with_config(executor, OrchestratorConfig::default())
    }

    pub fn with_config(executor: Arc<dyn TaskExecutor>, config: OrchestratorConfig) -> Self {
        Self {
            parallel: ParallelTaskExecutor::with_config(executor, config),
        }
    }

    /// Uses the given token to stop a run.
    ///
    /// When the token fires, in-flight steps resolve as cancelled, no further
    /// wave is dispatched and the result reports [`WorkflowFailure::Cancelled`].
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.parallel = self.parallel.with_cancellation_token(token);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        self.parallel.config()
    }

    /// The executor used to dispatch each wave.
    pub fn parallel_executor(&self) -> &ParallelTaskExecutor {
        &self.parallel
    }

    /// Executes a workflow with an empty base context.
    pub async fn execute_workflow(
        &self,
        workflow: &Workflow,
    ) -> Result<WorkflowResult, OrchestratorError> {
        self.execute_workflow_with_context(workflow, TaskContext::new())
            .await
    }

    /// Executes a workflow, seeding every step's context with `base_context`.
    ///
    /// Only invalid configuration is returned as an error. An invalid workflow
    /// or a failing step yields `Ok` with `success == false`.
    pub async fn execute_workflow_with_context(
        &self,
        workflow: &Workflow,
        base_context: TaskContext,
    ) -> Result<WorkflowResult, OrchestratorError> {
        self.config().validate()?;

        let total_steps = workflow.steps().len();
        self.run(workflow, base_context)
            .instrument(info_span!(
                "workflow_execute",
                workflow_id = %workflow.id(),
                total_steps = total_steps,
            ))
            .await
    }

    /// Runs `steps` one after another, each depending only on the previous.
    ///
    /// Any `depends_on` already set on the steps is replaced. Returns the last
    /// step's result, or the result of the first step that failed.
    pub async fn execute_chain(
        &self,
        steps: Vec<WorkflowStep>,
    ) -> Result<TaskResult, OrchestratorError> {
        let mut chained: Vec<WorkflowStep> = Vec::with_capacity(steps.len());
        for step in steps {
            let step = step.without_dependencies();
            let step = match chained.last() {
                Some(previous) => step.depends_on(previous.id()),
                None => step,
            };
            chained.push(step);
        }

        let last_id = match chained.last() {
            Some(step) => step.id().to_string(),
            None => return Err(OrchestratorError::EmptyChain),
        };

        let workflow = Workflow::new("chain", chained);
        workflow.validate()?;

        let result = self.execute_workflow(&workflow).await?;
        Ok(Self::into_step_result(result, &last_id))
    }

    /// Sends the same task to every executor in `executor_names`, then hands
    /// all of their outputs to `aggregator_executor_name`.
    ///
    /// Fan-out steps are identified by executor name, which is also the
    /// context key their output appears under for the aggregator. The
    /// aggregator step is [`FAN_IN_STEP_ID`]. Returns the aggregator's result,
    /// or the result of the first fan-out step that failed.
    pub async fn execute_fan_out_fan_in<I, S>(
        &self,
        task: impl Into<String>,
        executor_names: I,
        aggregator_executor_name: impl Into<String>,
    ) -> Result<TaskResult, OrchestratorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let task = task.into();
        let fan_out: Vec<WorkflowStep> = executor_names
            .into_iter()
            .map(|name| {
                let name = name.into();
                WorkflowStep::new(name.clone(), name, task.clone())
            })
            .collect();

        if fan_out.is_empty() {
            return Err(OrchestratorError::EmptyFanOut);
        }

        let aggregator = WorkflowStep::new(FAN_IN_STEP_ID, aggregator_executor_name, task)
            .depends_on_all(fan_out.iter().map(WorkflowStep::id));

        let workflow = Workflow::builder("fan_out_fan_in")
            .steps(fan_out)
            .step(aggregator)
            .build();
        workflow.validate()?;

        let result = self.execute_workflow(&workflow).await?;
        Ok(Self::into_step_result(result, FAN_IN_STEP_ID))
    }

    async fn run(
        &self,
        workflow: &Workflow,
        base_context: TaskContext,
    ) -> Result<WorkflowResult, OrchestratorError> {
        info!("Starting workflow execution");

        if let Err(errors) = workflow.validate() {
            warn!(errors = %errors, "Workflow validation failed");
            return Ok(WorkflowResult::invalid(workflow.id(), errors));
        }

        let graph = workflow.graph();
        let waves = graph.topological_waves();
        let mut state = ExecutionStateManager::new(workflow.steps().iter().map(WorkflowStep::id));
        let mut step_results = BTreeMap::new();
        let mut waves_executed = 0usize;

        for (index, wave) in waves.iter().enumerate() {
            let wave_number = index + 1;

            if self.parallel.cancellation_token().is_cancelled() {
                warn!(wave_number, "Workflow cancelled before wave started");
                return Ok(Self::stopped(
                    workflow,
                    state,
                    step_results,
                    None,
                    WorkflowFailure::Cancelled,
                    waves_executed,
                ));
            }

            let wave_span = info_span!("wave", wave_number = wave_number, ready_steps = wave.len());
            self.run_wave(
                workflow,
                &graph,
                wave,
                &base_context,
                &mut state,
                &mut step_results,
            )
            .instrument(wave_span)
            .await?;
            waves_executed += 1;

            if let Some((failed_step_id, message)) = state.get_failed_steps().into_iter().next() {
                warn!(
                    failed_step_id = %failed_step_id,
                    waves_executed,
                    "Workflow stopped after failed wave"
                );
                let cancelled = step_results
                    .get(&failed_step_id)
                    .is_some_and(TaskResult::is_cancelled);
                let failure = if cancelled {
                    WorkflowFailure::Cancelled
                } else {
                    WorkflowFailure::StepFailed {
                        step_id: failed_step_id.clone(),
                        message,
                    }
                };
                return Ok(Self::stopped(
                    workflow,
                    state,
                    step_results,
                    Some(failed_step_id),
                    failure,
                    waves_executed,
                ));
            }
        }

        info!(waves_executed, "Workflow completed successfully");
        Ok(WorkflowResult::completed(
            workflow.id(),
            step_results,
            waves_executed,
        ))
    }

    /// Dispatches one wave and records every result and step state.
    async fn run_wave(
        &self,
        workflow: &Workflow,
        graph: &DependencyGraph,
        wave: &[String],
        base_context: &TaskContext,
        state: &mut ExecutionStateManager,
        step_results: &mut BTreeMap<String, TaskResult>,
    ) -> Result<(), OrchestratorError> {
        info!("Executing wave with {} steps", wave.len());

        let requests: Vec<_> = wave
            .iter()
            .filter_map(|step_id| workflow.get_step(step_id))
            .map(|step| step.to_request(Self::step_context(step.id(), graph, base_context, step_results)))
            .collect();

        for step_id in wave {
            state.set_state(step_id, StepState::Running);
            debug!(step_id = %step_id, "Step execution started");
        }

        let results = match self.config().max_concurrent_tasks {
            Some(limit) => {
                self.parallel
                    .execute_parallel_with_limit(requests, limit)
                    .await?
            }
            None => self.parallel.execute_parallel(requests).await,
        };

        let mut failed = 0usize;
        for result in results {
            let step_id = result.request_id().to_string();
            if result.is_success() {
                state.set_state(&step_id, StepState::Completed);
                debug!(step_id = %step_id, "Step completed");
            } else {
                let message = result.error_message().unwrap_or_default().to_string();
                warn!(step_id = %step_id, error = %message, "Step failed");
                state.set_state(&step_id, StepState::Failed(message));
                failed += 1;
            }
            step_results.insert(step_id, result);
        }

        info!(failed, "Wave finished");
        Ok(())
    }

    /// Base context plus the output of every transitive dependency of `step_id`.
    fn step_context(
        step_id: &str,
        graph: &DependencyGraph,
        base_context: &TaskContext,
        step_results: &BTreeMap<String, TaskResult>,
    ) -> TaskContext {
        let mut context = base_context.clone();
        for ancestor in graph.ancestors(step_id) {
            if let Some(output) = step_results.get(&ancestor).and_then(TaskResult::output) {
                context.insert(ancestor, JsonValue::String(output.to_string()));
            }
        }
        context
    }

    fn stopped(
        workflow: &Workflow,
        mut state: ExecutionStateManager,
        step_results: BTreeMap<String, TaskResult>,
        failed_step_id: Option<String>,
        failure: WorkflowFailure,
        waves_executed: usize,
    ) -> WorkflowResult {
        state.skip_pending();
        let skipped_steps = state.get_skipped_steps();
        if !skipped_steps.is_empty() {
            debug!(skipped = ?skipped_steps, "Steps skipped");
        }

        WorkflowResult::stopped(
            workflow.id(),
            step_results,
            failed_step_id,
            failure,
            skipped_steps,
            waves_executed,
        )
    }

    /// Picks the result a convenience pattern returns: the failing step's if
    /// there is one, otherwise the `target` step's.
    fn into_step_result(mut result: WorkflowResult, target: &str) -> TaskResult {
        let key = result
            .failed_step_id
            .clone()
            .unwrap_or_else(|| target.to_string());

        match result.step_results.remove(&key) {
            Some(step_result) => step_result,
            // Only reachable when the run was cancelled before `target` started.
            None => TaskResult::cancelled(target, Duration::ZERO),
        }
    }
}
