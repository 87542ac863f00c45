//! Configuration for orchestrator execution.
//!
//! This module provides configuration options for controlling concurrency
//! and per-task timeouts.

use super::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-task timeout: 5 minutes.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration shared by the [`ParallelTaskExecutor`](super::ParallelTaskExecutor)
/// and the [`WorkflowEngine`](super::WorkflowEngine).
///
/// # Examples
///
/// ```ignore
/// use agent_workflow::orchestrator::OrchestratorConfig;
/// use std::time::Duration;
///
/// let config = OrchestratorConfig::new()
///     .with_max_concurrent_tasks(4)
///     .with_step_timeout(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Timeout applied to each individual task.
    ///
    /// A task exceeding it yields a failed result with a timeout error; its
    /// siblings keep running. A [`TaskRequest`](crate::TaskRequest) may carry
    /// its own override.
    ///
    /// **Default:** 5 minutes
    #[serde(default = "default_step_timeout")]
    pub step_timeout: Duration,

    /// Maximum number of workflow steps executing at once within a wave.
    ///
    /// If `None`, every step of a wave is dispatched at once. `Some(0)` is a
    /// usage error reported when the engine runs.
    ///
    /// **Default:** `None` (unlimited)
    #[serde(default)]
    pub max_concurrent_tasks: Option<usize>,
}

fn default_step_timeout() -> Duration {
    DEFAULT_STEP_TIMEOUT
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorConfig {
    /// Creates a configuration with a 5 minute step timeout and no
    /// concurrency limit.
    pub fn new() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            max_concurrent_tasks: None,
        }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_tasks(mut self, max: usize) -> Self {
        self.max_concurrent_tasks = Some(max);
        self
    }

    /// Removes the concurrency limit, allowing unlimited parallel tasks.
    pub fn with_unlimited_concurrency(mut self) -> Self {
        self.max_concurrent_tasks = None;
        self
    }

    /// Rejects settings that can never run.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        match self.max_concurrent_tasks {
            Some(0) => Err(OrchestratorError::InvalidConcurrency(0)),
            _ => Ok(()),
        }
    }
}
