//! Structural problems a workflow can have.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single structural violation found while validating a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Two or more steps share the same id.
    #[error("Duplicate step id '{step_id}'")]
    DuplicateStepId { step_id: String },

    /// A step lists a dependency that is not a step of the workflow.
    #[error("Step '{step_id}' depends on unknown step '{dependency}'")]
    UnknownDependency { step_id: String, dependency: String },

    /// The listed steps depend on each other in a loop.
    ///
    /// `path[i]` depends on `path[i + 1]`, and the last entry depends on the
    /// first. A step depending on itself yields a single-entry path.
    #[error("Dependency cycle: {}", format_cycle(.path))]
    Cycle { path: Vec<String> },
}

fn format_cycle(path: &[String]) -> String {
    match path.first() {
        Some(first) => {
            let mut rendered = path.join(" -> ");
            rendered.push_str(" -> ");
            rendered.push_str(first);
            rendered
        }
        None => String::new(),
    }
}

/// Every violation found in one validation pass.
///
/// Validation never stops at the first problem, so a caller can fix a
/// workflow in one go.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Returns true if any violation is a dependency cycle.
    pub fn has_cycle(&self) -> bool {
        self.0
            .iter()
            .any(|e| matches!(e, ValidationError::Cycle { .. }))
    }

    pub(crate) fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
