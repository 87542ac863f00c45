//! Execution state tracking for a single workflow run.
//!
//! This module provides a small state machine that records where each step
//! stands while the engine walks the waves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The execution state of one workflow step.
///
/// Steps progress through states as follows:
/// - `Pending` -> `Running` (when its wave is dispatched)
/// - `Running` -> `Completed` (on success)
/// - `Running` -> `Failed` (on error, timeout or cancellation)
/// - `Pending` -> `Skipped` (when the run stops before its wave)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepState {
    /// Step is waiting for its wave
    Pending,
    /// Step is currently executing
    Running,
    /// Step completed successfully
    Completed,
    /// Step failed with the given error message
    Failed(String),
    /// Step was never dispatched because the run stopped early
    Skipped,
}

/// Tracks the state of every step in a workflow run, in declaration order.
///
/// # Examples
///
/// ```ignore
/// use agent_workflow::orchestrator::workflow::{ExecutionStateManager, StepState};
///
/// let mut manager = ExecutionStateManager::new(["step_1", "step_2"]);
/// manager.set_state("step_1", StepState::Completed);
/// manager.skip_pending();
///
/// assert_eq!(manager.get_skipped_steps(), vec!["step_2"]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionStateManager {
    states: HashMap<String, StepState>,
    order: Vec<String>,
}

impl ExecutionStateManager {
    /// Creates a manager with every given step `Pending`.
    pub fn new<I, S>(step_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manager = Self::default();
        for id in step_ids {
            let id = id.into();
            if manager.states.insert(id.clone(), StepState::Pending).is_none() {
                manager.order.push(id);
            }
        }
        manager
    }

    /// Sets the state of a step.
    ///
    /// If the step doesn't exist yet, it will be added.
    pub fn set_state(&mut self, step_id: &str, state: StepState) {
        if self.states.insert(step_id.to_string(), state).is_none() {
            self.order.push(step_id.to_string());
        }
    }

    /// Marks every still-pending step as skipped.
    pub fn skip_pending(&mut self) {
        for state in self.states.values_mut() {
            if *state == StepState::Pending {
                *state = StepState::Skipped;
            }
        }
    }

    fn ids_matching(&self, predicate: impl Fn(&StepState) -> bool) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.states.get(id.as_str()).is_some_and(&predicate))
            .cloned()
            .collect()
    }

    /// Returns the failed steps with their error messages, in declaration
    /// order.
    pub fn get_failed_steps(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .filter_map(|id| match self.states.get(id.as_str()) {
                Some(StepState::Failed(message)) => Some((id.clone(), message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn get_skipped_steps(&self) -> Vec<String> {
        self.ids_matching(|s| matches!(s, StepState::Skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(id: &str, message: &str) -> (String, String) {
        (id.to_string(), message.to_string())
    }

    #[test]
    fn test_new_ignores_duplicate_ids() {
        let mut manager = ExecutionStateManager::new(["a", "b", "a"]);
        manager.skip_pending();

        assert_eq!(manager.get_skipped_steps(), vec!["a", "b"]);
    }

    #[test]
    fn test_state_transitions() {
        let mut manager = ExecutionStateManager::new(["a", "b", "c"]);
        manager.set_state("a", StepState::Running);
        manager.set_state("b", StepState::Running);
        assert!(manager.get_failed_steps().is_empty());

        manager.set_state("a", StepState::Completed);
        manager.set_state("b", StepState::Failed("boom".to_string()));
        manager.skip_pending();

        assert_eq!(manager.get_failed_steps(), vec![failed("b", "boom")]);
        assert_eq!(manager.get_skipped_steps(), vec!["c"]);
    }

    #[test]
    fn test_failed_steps_follow_declaration_order() {
        let mut manager = ExecutionStateManager::new(["first", "second", "third"]);
        manager.set_state("third", StepState::Failed("late".to_string()));
        manager.set_state("second", StepState::Completed);
        manager.set_state("first", StepState::Failed("early".to_string()));

        assert_eq!(
            manager.get_failed_steps(),
            vec![failed("first", "early"), failed("third", "late")]
        );
    }

    #[test]
    fn test_skip_pending_keeps_order() {
        let mut manager = ExecutionStateManager::new(["a", "b", "c", "d"]);
        manager.set_state("b", StepState::Completed);
        manager.skip_pending();

        assert_eq!(manager.get_skipped_steps(), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_set_state_adds_unknown_step() {
        let mut manager = ExecutionStateManager::default();
        manager.set_state("late", StepState::Failed("lost".to_string()));

        assert_eq!(manager.get_failed_steps(), vec![failed("late", "lost")]);
    }
}
