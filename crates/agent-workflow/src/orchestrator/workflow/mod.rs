//! Workflow graph model.
//!
//! A [`Workflow`] is an ordered list of [`WorkflowStep`]s whose `depends_on`
//! lists form a dependency graph. Workflows are plain values: build one,
//! validate it, hand it to the [`WorkflowEngine`](super::WorkflowEngine).

pub mod dependency_graph;
pub mod execution_state;
pub mod validation;

pub use dependency_graph::DependencyGraph;
pub use execution_state::{ExecutionStateManager, StepState};
pub use validation::{ValidationError, ValidationErrors};

use crate::task::{TaskContext, TaskRequest};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// One node of a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    id: String,
    executor_name: String,
    description: String,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_dependencies"
    )]
    depends_on: Vec<String>,
}

/// Drops repeated entries, keeping the first occurrence of each.
fn deserialize_dependencies<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let listed = Vec::<String>::deserialize(deserializer)?;
    let mut seen = HashSet::new();
    Ok(listed
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect())
}

impl WorkflowStep {
    pub fn new(
        id: impl Into<String>,
        executor_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            executor_name: executor_name.into(),
            description: description.into(),
            depends_on: Vec::new(),
        }
    }

    /// Adds a dependency. Listing the same step twice has no effect.
    pub fn depends_on(mut self, step_id: impl Into<String>) -> Self {
        let step_id = step_id.into();
        if !self.depends_on.contains(&step_id) {
            self.depends_on.push(step_id);
        }
        self
    }

    /// Adds several dependencies at once.
    pub fn depends_on_all<I, S>(self, step_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        step_ids.into_iter().fold(self, |step, id| step.depends_on(id))
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

    /// The ids of the steps this step depends on directly.
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub(crate) fn without_dependencies(mut self) -> Self {
        self.depends_on.clear();
        self
    }

    /// Builds the request that runs this step with the given context.
    pub fn to_request(&self, context: TaskContext) -> TaskRequest {
        TaskRequest::new(&self.id, &self.executor_name, &self.description).with_context(context)
    }
}

/// An immutable, named collection of steps.
///
/// # Examples
///
/// ```ignore
/// use agent_workflow::orchestrator::workflow::{Workflow, WorkflowStep};
///
/// let workflow = Workflow::builder("release")
///     .step(WorkflowStep::new("design", "Architect", "Design the feature"))
///     .step(WorkflowStep::new("implement", "Developer", "Implement it").depends_on("design"))
///     .build();
///
/// assert!(workflow.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    id: String,
    name: String,
    #[serde(default)]
    steps: Vec<WorkflowStep>,
}

impl Workflow {
    /// Creates a workflow whose name equals its id.
    pub fn new(id: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            steps,
        }
    }

    pub fn builder(id: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn get_step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Builds the dependency graph for traversal.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_workflow(self)
    }

    /// Checks the workflow's structure and reports every violation found.
    ///
    /// In order: duplicate step ids, dependencies on unknown steps, then
    /// dependency cycles. An empty workflow is valid.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) && reported.insert(step.id.as_str()) {
                errors.push(ValidationError::DuplicateStepId {
                    step_id: step.id.clone(),
                });
            }
        }

        for step in &self.steps {
            for dependency in &step.depends_on {
                if !seen.contains(dependency.as_str()) {
                    errors.push(ValidationError::UnknownDependency {
                        step_id: step.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        for path in self.graph().find_cycles() {
            errors.push(ValidationError::Cycle { path });
        }

        errors.into_result()
    }

    /// Validates the workflow and groups its step ids into execution waves.
    pub fn topological_waves(&self) -> Result<Vec<Vec<String>>, ValidationErrors> {
        self.validate()?;
        Ok(self.graph().topological_waves())
    }
}

/// Builder for [`Workflow`].
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    id: String,
    name: Option<String>,
    steps: Vec<WorkflowStep>,
}

impl WorkflowBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            steps: Vec::new(),
        }
    }

    /// Sets a human-readable name; defaults to the id.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = WorkflowStep>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Finishes the workflow. Structure is checked by [`Workflow::validate`],
    /// not here.
    pub fn build(self) -> Workflow {
        Workflow {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            steps: self.steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str) -> WorkflowStep {
        WorkflowStep::new(id, "Agent", format!("Do {}", id))
    }

    #[test]
    fn test_builder_defaults_name_to_id() {
        let workflow = Workflow::builder("wf").step(step("a")).build();
        assert_eq!(workflow.name(), "wf");

        let named = Workflow::builder("wf").name("My Flow").build();
        assert_eq!(named.name(), "My Flow");
        assert!(named.is_empty());
    }

    #[test]
    fn test_depends_on_deduplicates() {
        let s = step("b").depends_on("a").depends_on("a").depends_on_all(["a", "c"]);
        assert_eq!(s.dependencies(), ["a", "c"]);
    }

    #[test]
    fn test_empty_workflow_is_valid() {
        let workflow = Workflow::new("empty", Vec::new());
        assert!(workflow.validate().is_ok());
        assert!(workflow.topological_waves().unwrap().is_empty());
    }

    #[test]
    fn test_valid_chain() {
        let workflow = Workflow::new(
            "chain",
            vec![step("a"), step("b").depends_on("a"), step("c").depends_on("b")],
        );

        assert!(workflow.validate().is_ok());
        assert_eq!(
            workflow.topological_waves().unwrap(),
            vec![vec!["a"], vec!["b"], vec!["c"]]
        );
    }

    #[test]
    fn test_duplicate_id_reported_once() {
        let workflow = Workflow::new("dup", vec![step("a"), step("a"), step("a")]);

        let errors = workflow.validate().unwrap_err();
        assert_eq!(
            errors.errors(),
            [ValidationError::DuplicateStepId {
                step_id: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_dependency_names_step_and_reference() {
        let workflow = Workflow::new("dangling", vec![step("a"), step("b").depends_on("ghost")]);

        let errors = workflow.validate().unwrap_err();
        assert_eq!(
            errors.errors(),
            [ValidationError::UnknownDependency {
                step_id: "b".to_string(),
                dependency: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let workflow = Workflow::new("self", vec![step("a").depends_on("a")]);

        let errors = workflow.validate().unwrap_err();
        assert_eq!(
            errors.errors(),
            [ValidationError::Cycle {
                path: vec!["a".to_string()]
            }]
        );
    }

    #[test]
    fn test_all_violations_are_reported() {
        let workflow = Workflow::new(
            "broken",
            vec![
                step("a").depends_on("b"),
                step("b").depends_on("a"),
                step("b"),
                step("c").depends_on("missing"),
            ],
        );

        let errors = workflow.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors.errors()[0], ValidationError::DuplicateStepId { .. }));
        assert!(matches!(errors.errors()[1], ValidationError::UnknownDependency { .. }));
        assert!(errors.has_cycle());
        assert!(workflow.topological_waves().is_err());
    }

    #[test]
    fn test_to_request_carries_step_fields() {
        let s = WorkflowStep::new("review", "Reviewer", "Review the code");
        let mut context = TaskContext::new();
        context.insert("design".to_string(), "the design".into());

        let request = s.to_request(context);
        assert_eq!(request.id(), "review");
        assert_eq!(request.executor_name(), "Reviewer");
        assert_eq!(request.description(), "Review the code");
        assert_eq!(request.context_str("design"), Some("the design"));
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "id": "release",
            "name": "Release",
            "steps": [
                {"id": "build", "executor_name": "Builder", "description": "Build"},
                {"id": "ship", "executor_name": "Shipper", "description": "Ship", "depends_on": ["build"]}
            ]
        }"#;

        let workflow: Workflow = serde_json::from_str(json).unwrap();
        assert_eq!(workflow.steps().len(), 2);
        assert_eq!(workflow.get_step("ship").unwrap().dependencies(), ["build"]);
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn test_deserialize_drops_repeated_dependencies() {
        let json = r#"{
            "id": "twice",
            "name": "Twice",
            "steps": [
                {"id": "a", "executor_name": "E", "description": "A"},
                {"id": "b", "executor_name": "E", "description": "B", "depends_on": ["a", "a"]},
                {"id": "c", "executor_name": "E", "description": "C", "depends_on": ["ghost", "b", "ghost"]}
            ]
        }"#;

        let workflow: Workflow = serde_json::from_str(json).unwrap();
        assert_eq!(workflow.get_step("b").unwrap().dependencies(), ["a"]);
        assert_eq!(workflow.get_step("c").unwrap().dependencies(), ["ghost", "b"]);

        let errors = workflow.validate().unwrap_err();
        assert_eq!(
            errors.errors(),
            [ValidationError::UnknownDependency {
                step_id: "c".to_string(),
                dependency: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_validate_deep_chain_declared_in_reverse() {
        const LEN: usize = 50_000;
        let steps: Vec<WorkflowStep> = (0..LEN)
            .rev()
            .map(|i| match i {
                0 => step("s0"),
                _ => step(&format!("s{i}")).depends_on(format!("s{}", i - 1)),
            })
            .collect();
        let workflow = Workflow::new("deep", steps);

        assert!(workflow.validate().is_ok());
        let waves = workflow.topological_waves().unwrap();
        assert_eq!(waves.len(), LEN);
        assert_eq!(waves[0], ["s0"]);
        assert_eq!(waves[LEN - 1], [format!("s{}", LEN - 1)]);
    }
}
