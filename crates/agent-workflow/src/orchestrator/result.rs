//! Outcome of a workflow run.

use super::workflow::ValidationErrors;
use crate::task::TaskResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a workflow run did not succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowFailure {
    /// The workflow was malformed; no step was attempted.
    Validation { errors: ValidationErrors },
    /// A step failed and no further wave was dispatched.
    StepFailed { step_id: String, message: String },
    /// The run was cancelled.
    Cancelled,
}

impl fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowFailure::Validation { errors } => write!(f, "Invalid workflow: {}", errors),
            WorkflowFailure::StepFailed { step_id, message } => {
                write!(f, "Step '{}' failed: {}", step_id, message)
            }
            WorkflowFailure::Cancelled => write!(f, "Workflow was cancelled"),
        }
    }
}

/// Result of running a [`Workflow`](super::workflow::Workflow).
///
/// Always check `success`: a run that returned normally may still have
/// failed. Results of the steps that did run are kept even on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    /// True iff every step succeeded
    pub success: bool,
    /// Results of attempted steps only, keyed by step id
    pub step_results: BTreeMap<String, TaskResult>,
    /// First failing step, in wave-then-declaration order
    pub failed_step_id: Option<String>,
    pub failure: Option<WorkflowFailure>,
    /// Declared steps that were never dispatched, in declaration order
    pub skipped_steps: Vec<String>,
    pub waves_executed: usize,
}

impl WorkflowResult {
    pub(crate) fn completed(
        workflow_id: impl Into<String>,
        step_results: BTreeMap<String, TaskResult>,
        waves_executed: usize,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            success: true,
            step_results,
            failed_step_id: None,
            failure: None,
            skipped_steps: Vec::new(),
            waves_executed,
        }
    }

    pub(crate) fn invalid(workflow_id: impl Into<String>, errors: ValidationErrors) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            success: false,
            step_results: BTreeMap::new(),
            failed_step_id: None,
            failure: Some(WorkflowFailure::Validation { errors }),
            skipped_steps: Vec::new(),
            waves_executed: 0,
        }
    }

    pub(crate) fn stopped(
        workflow_id: impl Into<String>,
        step_results: BTreeMap<String, TaskResult>,
        failed_step_id: Option<String>,
        failure: WorkflowFailure,
        skipped_steps: Vec<String>,
        waves_executed: usize,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            success: false,
            step_results,
            failed_step_id,
            failure: Some(failure),
            skipped_steps,
            waves_executed,
        }
    }

    /// Output of a step that ran successfully.
    pub fn output(&self, step_id: &str) -> Option<&str> {
        self.step_results.get(step_id).and_then(TaskResult::output)
    }

    pub fn step_result(&self, step_id: &str) -> Option<&TaskResult> {
        self.step_results.get(step_id)
    }

    /// The result of the first failing step, if a step failed.
    pub fn failed_step_result(&self) -> Option<&TaskResult> {
        self.failed_step_id
            .as_deref()
            .and_then(|id| self.step_results.get(id))
    }

    /// The validation violations, if the workflow was rejected before running.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match &self.failure {
            Some(WorkflowFailure::Validation { errors }) => Some(errors),
            _ => None,
        }
    }

    pub fn is_validation_failure(&self) -> bool {
        self.validation_errors().is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.failure, Some(WorkflowFailure::Cancelled))
    }

    /// Human-readable failure reason, if the run failed.
    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::workflow::ValidationError;
    use crate::task::FailureKind;
    use std::time::Duration;

    #[test]
    fn test_invalid_result_has_no_attempted_steps() {
        let errors = ValidationErrors::new(vec![ValidationError::Cycle {
            path: vec!["a".to_string()],
        }]);
        let result = WorkflowResult::invalid("wf", errors);

        assert!(!result.success);
        assert!(result.step_results.is_empty());
        assert!(result.is_validation_failure());
        assert_eq!(
            result.error_message().unwrap(),
            "Invalid workflow: Dependency cycle: a -> a"
        );
    }

    #[test]
    fn test_stopped_result_exposes_failed_step() {
        let mut step_results = BTreeMap::new();
        step_results.insert(
            "a".to_string(),
            TaskResult::success("a", "ok", Duration::from_millis(1)),
        );
        step_results.insert(
            "b".to_string(),
            TaskResult::failure("b", FailureKind::Executor, "boom", Duration::from_millis(1)),
        );

        let result = WorkflowResult::stopped(
            "wf",
            step_results,
            Some("b".to_string()),
            WorkflowFailure::StepFailed {
                step_id: "b".to_string(),
                message: "boom".to_string(),
            },
            vec!["c".to_string()],
            2,
        );

        assert_eq!(result.output("a"), Some("ok"));
        assert_eq!(result.output("b"), None);
        assert_eq!(result.failed_step_result().unwrap().error_message(), Some("boom"));
        assert_eq!(result.error_message().unwrap(), "Step 'b' failed: boom");
        assert!(!result.is_cancelled());
    }
}
