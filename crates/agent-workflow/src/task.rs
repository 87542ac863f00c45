//! Executor-agnostic units of work and their outcomes.
//!
//! A [`TaskRequest`] describes what should be done and by which executor; a
//! [`TaskResult`] records what happened. Both are immutable once built: the
//! orchestration core only ever reads requests and produces results.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::Duration;

/// Read-only input handed to an executor alongside the task description.
///
/// Keys are kept sorted so that two contexts built from the same inputs
/// always iterate (and serialize) identically.
pub type TaskContext = BTreeMap<String, JsonValue>;

/// A single unit of work for a [`TaskExecutor`](crate::executor::TaskExecutor).
///
/// # Examples
///
/// ```ignore
/// use agent_workflow::TaskRequest;
///
/// let request = TaskRequest::new("review-1", "Reviewer", "Review the patch")
///     .with_context_value("language", "rust");
/// assert_eq!(request.executor_name(), "Reviewer");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    id: String,
    executor_name: String,
    description: String,
    #[serde(default)]
    context: TaskContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout: Option<Duration>,
}

impl TaskRequest {
    /// Creates a request with an empty context.
    pub fn new(
        id: impl Into<String>,
        executor_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            executor_name: executor_name.into(),
            description: description.into(),
            context: TaskContext::new(),
            timeout: None,
        }
    }

    /// Replaces the whole context.
    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    /// Adds (or overwrites) a single context entry.
    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Overrides the configured per-task timeout for this request only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn executor_name(&self) -> &str {
        &self.executor_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn context(&self) -> &TaskContext {
        &self.context
    }

    /// Looks up a context entry as a string slice, if it is a JSON string.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(JsonValue::as_str)
    }

    /// The per-request timeout override, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Why a task did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The executor returned an error.
    Executor,
    /// The executor did not answer within the task timeout.
    Timeout,
    /// The executor panicked while running the task.
    Panicked,
    /// The run was cancelled before the task finished.
    Cancelled,
}

/// The outcome of exactly one [`TaskRequest`].
///
/// `output` is present iff the task succeeded and `error_message` is present
/// iff it failed; the constructors are the only way to build a result, which
/// keeps the two mutually exclusive. Deserialization rejects any other shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTaskResult")]
pub struct TaskResult {
    request_id: String,
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure_kind: Option<FailureKind>,
    duration_ms: u64,
}

#[derive(Deserialize)]
struct RawTaskResult {
    request_id: String,
    success: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    failure_kind: Option<FailureKind>,
    duration_ms: u64,
}

impl TryFrom<RawTaskResult> for TaskResult {
    type Error = String;

    fn try_from(raw: RawTaskResult) -> Result<Self, Self::Error> {
        let consistent = if raw.success {
            raw.output.is_some() && raw.error_message.is_none() && raw.failure_kind.is_none()
        } else {
            raw.output.is_none() && raw.error_message.is_some() && raw.failure_kind.is_some()
        };
        if !consistent {
            return Err(format!(
                "task result '{}' must carry {}",
                raw.request_id,
                if raw.success {
                    "an output and no error"
                } else {
                    "an error message and failure kind but no output"
                }
            ));
        }

        Ok(Self {
            request_id: raw.request_id,
            success: raw.success,
            output: raw.output,
            error_message: raw.error_message,
            failure_kind: raw.failure_kind,
            duration_ms: raw.duration_ms,
        })
    }
}

impl TaskResult {
    /// Creates a successful result.
    pub fn success(request_id: impl Into<String>, output: impl Into<String>, duration: Duration) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            output: Some(output.into()),
            error_message: None,
            failure_kind: None,
            duration_ms: duration_to_ms(duration),
        }
    }

    /// Creates a failed result.
    pub fn failure(
        request_id: impl Into<String>,
        kind: FailureKind,
        error_message: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            output: None,
            error_message: Some(error_message.into()),
            failure_kind: Some(kind),
            duration_ms: duration_to_ms(duration),
        }
    }

    /// Creates a failed result for a task that timed out.
    pub fn timed_out(request_id: impl Into<String>, timeout: Duration) -> Self {
        Self::failure(
            request_id,
            FailureKind::Timeout,
            format!("Task timed out after {:?}", timeout),
            timeout,
        )
    }

    /// Creates a failed result for a task that was cancelled.
    pub fn cancelled(request_id: impl Into<String>, duration: Duration) -> Self {
        Self::failure(request_id, FailureKind::Cancelled, "Task was cancelled", duration)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure_kind
    }

    /// Returns true if this task failed because it exceeded its timeout.
    pub fn is_timeout(&self) -> bool {
        self.failure_kind == Some(FailureKind::Timeout)
    }

    /// Returns true if this task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.failure_kind == Some(FailureKind::Cancelled)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
