//! Dependency graph representation for wave-based execution.
//!
//! This module provides a directed graph over step ids, used to validate a
//! workflow (cycle detection) and to group its steps into waves of mutually
//! independent steps.

use super::Workflow;
use std::collections::{HashMap, HashSet, VecDeque};

/// A directed graph representing step dependencies.
///
/// The graph maintains both forward edges (dependencies) and reverse edges
/// (dependents) for efficient traversal in both directions, and remembers the
/// order in which nodes were added so that every query answers in declaration
/// order.
///
/// # Examples
///
/// ```ignore
/// use agent_workflow::orchestrator::workflow::DependencyGraph;
///
/// let mut graph = DependencyGraph::new();
/// graph.add_node("step_1");
/// graph.add_node("step_2");
/// graph.add_dependency("step_2", "step_1"); // step_2 depends on step_1
///
/// assert_eq!(graph.get_dependencies("step_2"), ["step_1"]);
/// assert_eq!(graph.get_dependents("step_1"), ["step_2"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Forward edges: step_id -> step_ids it depends on
    nodes: HashMap<String, Vec<String>>,
    /// Reverse edges: step_id -> step_ids that depend on it
    reverse_edges: HashMap<String, Vec<String>>,
    /// Node ids in insertion order
    order: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Creates a new empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of a workflow.
    ///
    /// Duplicate step ids collapse into one node and dependencies on unknown
    /// steps are left out; [`Workflow::validate`] reports both.
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let mut graph = Self::new();
        for step in workflow.steps() {
            graph.add_node(step.id());
        }

        let mut seen = HashSet::new();
        for step in workflow.steps() {
            if !seen.insert(step.id()) {
                continue;
            }
            for dependency in step.dependencies() {
                if graph.contains(dependency) {
                    graph.add_dependency(step.id(), dependency);
                }
            }
        }

        graph
    }

    /// Adds a node to the graph without any dependencies.
    ///
    /// If the node already exists, this is a no-op.
    pub fn add_node(&mut self, step_id: &str) {
        if self.nodes.contains_key(step_id) {
            return;
        }
        self.nodes.insert(step_id.to_string(), Vec::new());
        self.reverse_edges.insert(step_id.to_string(), Vec::new());
        self.order.push(step_id.to_string());
    }

    /// Adds a dependency edge: `step_id` depends on `depends_on`.
    ///
    /// Both nodes are added if they don't exist yet. Adding the same edge
    /// twice has no effect.
    pub fn add_dependency(&mut self, step_id: &str, depends_on: &str) {
        self.add_node(step_id);
        self.add_node(depends_on);

        let dependencies = self.nodes.entry(step_id.to_string()).or_default();
        if dependencies.iter().any(|d| d == depends_on) {
            return;
        }
        dependencies.push(depends_on.to_string());

        self.reverse_edges
            .entry(depends_on.to_string())
            .or_default()
            .push(step_id.to_string());
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.nodes.contains_key(step_id)
    }

    /// Returns the step ids the given step depends on directly.
    ///
    /// Returns an empty slice if the step has no dependencies or is unknown.
    pub fn get_dependencies(&self, step_id: &str) -> &[String] {
        self.nodes.get(step_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the step ids that depend directly on the given step.
    pub fn get_dependents(&self, step_id: &str) -> &[String] {
        self.reverse_edges
            .get(step_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns every step the given step transitively depends on, in
    /// declaration order.
    pub fn ancestors(&self, step_id: &str) -> Vec<String> {
        let mut found: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(step_id);

        while let Some(current) = queue.pop_front() {
            for dependency in self.get_dependencies(current) {
                if found.insert(dependency.as_str()) {
                    queue.push_back(dependency.as_str());
                }
            }
        }

        self.order
            .iter()
            .filter(|id| id.as_str() != step_id && found.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Returns the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Returns all step ids that have zero dependencies, in declaration order.
    ///
    /// These steps form the first wave.
    pub fn get_zero_dependency_steps(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.get_dependencies(id).is_empty())
            .cloned()
            .collect()
    }

    /// Returns `true` if the graph contains at least one cycle.
    pub fn has_cycle(&self) -> bool {
        !self.find_cycles().is_empty()
    }

    /// Finds dependency cycles with a three-color depth-first search.
    ///
    /// Each cycle is reported once, as the list of step ids on it where every
    /// entry depends on the next and the last depends on the first. Roots are
    /// visited in declaration order, so the output is deterministic.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut colors: HashMap<&str, Color> = self
            .order
            .iter()
            .map(|id| (id.as_str(), Color::Unvisited))
            .collect();
        let mut cycles = Vec::new();

        for node in &self.order {
            if colors.get(node.as_str()) == Some(&Color::Unvisited) {
                self.find_cycles_from(node, &mut colors, &mut cycles);
            }
        }

        cycles
    }

    /// Walks everything reachable from `root` with an explicit stack of
    /// `(node, next dependency index)` frames, so chain depth is bounded by
    /// heap rather than call stack.
    fn find_cycles_from<'a>(
        &'a self,
        root: &'a str,
        colors: &mut HashMap<&'a str, Color>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        let mut frames: Vec<(&'a str, usize)> = vec![(root, 0)];
        colors.insert(root, Color::InProgress);

        while let Some(frame) = frames.last_mut() {
            let (node, next) = *frame;
            let dependencies = self.get_dependencies(node);
            if next == dependencies.len() {
                colors.insert(node, Color::Done);
                frames.pop();
                continue;
            }
            frame.1 += 1;

            let dependency = dependencies[next].as_str();
            match colors.get(dependency).copied().unwrap_or(Color::Unvisited) {
                Color::Unvisited => {
                    colors.insert(dependency, Color::InProgress);
                    frames.push((dependency, 0));
                }
                // Back edge: every frame from `dependency` up to `node` forms
                // the cycle.
                Color::InProgress => {
                    if let Some(start) = frames.iter().position(|(id, _)| *id == dependency) {
                        cycles.push(frames[start..].iter().map(|(id, _)| id.to_string()).collect());
                    }
                }
                Color::Done => {}
            }
        }
    }

    /// Groups the steps into waves with Kahn's algorithm.
    ///
    /// Wave `n` holds every step whose dependencies all sit in waves `0..n`.
    /// Within a wave, steps keep their declaration order. Steps on a cycle
    /// (and everything depending on them) never become ready and are absent
    /// from the output, so callers validate first.
    pub fn topological_waves(&self) -> Vec<Vec<String>> {
        let position: HashMap<&str, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mut remaining: HashMap<&str, usize> = self
            .order
            .iter()
            .map(|id| (id.as_str(), self.get_dependencies(id).len()))
            .collect();

        let mut waves = Vec::new();
        let mut current: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|id| remaining.get(id) == Some(&0))
            .collect();

        while !current.is_empty() {
            let mut next: Vec<&str> = Vec::new();
            for id in &current {
                for dependent in self.get_dependents(id) {
                    if let Some(count) = remaining.get_mut(dependent.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent.as_str());
                        }
                    }
                }
            }

            waves.push(current.iter().map(|id| id.to_string()).collect());
            next.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
            current = next;
        }

        waves
    }
}
