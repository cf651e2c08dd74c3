//! Input validation for scheduling problems.
//!
//! Checks structural integrity of tasks, activities, and resources
//! before a CP model is built. Detects:
//! - Duplicate IDs
//! - Missing resource references
//! - Resources that are not unary
//! - Unknown or cross-task predecessors
//! - Non-positive durations
//! - Circular precedence dependencies (DAG validation)
//! - Empty tasks
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::models::{Resource, Task};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An activity references a resource that doesn't exist.
    InvalidResourceReference,
    /// Precedence graph contains a cycle.
    CyclicDependency,
    /// A task has no activities.
    EmptyTask,
    /// An activity references a predecessor that doesn't exist.
    InvalidPredecessor,
    /// An activity waits on an activity of another task.
    CrossTaskPredecessor,
    /// An activity has zero or negative duration.
    NonPositiveDuration,
    /// A resource can run more than one activity at a time; only unary
    /// stations can be modeled.
    UnsupportedCapacity,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data for a scheduling problem.
///
/// Checks:
/// 1. No duplicate task, activity or resource IDs, and every resource unary
/// 2. All tasks have at least one activity
/// 3. Every activity has a positive duration
/// 4. Every activity runs on an existing resource
/// 5. Predecessors exist and belong to the same task
/// 6. No circular precedence dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(tasks: &[Task], resources: &[Resource]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut resource_ids = HashSet::new();
    for r in resources {
        if !resource_ids.insert(r.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate resource ID: {}", r.id),
            ));
        }
        if !r.is_unary() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnsupportedCapacity,
                format!("Resource '{}' has capacity {}, expected 1", r.id, r.capacity),
            ));
        }
    }

    // activity id → owning task id
    let mut owner: HashMap<&str, &str> = HashMap::new();
    let mut task_ids = HashSet::new();

    for task in tasks {
        if !task_ids.insert(task.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }

        if task.activities.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyTask,
                format!("Task '{}' has no activities", task.id),
            ));
        }

        for act in &task.activities {
            if owner.insert(act.id.as_str(), task.id.as_str()).is_some() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate activity ID: {}", act.id),
                ));
            }
            if act.duration <= 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NonPositiveDuration,
                    format!("Activity '{}' has duration {}", act.id, act.duration),
                ));
            }
            if !resource_ids.contains(act.resource_id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidResourceReference,
                    format!(
                        "Activity '{}' references unknown resource '{}'",
                        act.id, act.resource_id
                    ),
                ));
            }
        }
    }

    for task in tasks {
        for act in &task.activities {
            for pred in &act.predecessors {
                match owner.get(pred.as_str()) {
                    None => errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidPredecessor,
                        format!(
                            "Activity '{}' references unknown predecessor '{}'",
                            act.id, pred
                        ),
                    )),
                    Some(&other) if other != task.id => errors.push(ValidationError::new(
                        ValidationErrorKind::CrossTaskPredecessor,
                        format!(
                            "Activity '{}' waits on '{}' from task '{}'",
                            act.id, pred, other
                        ),
                    )),
                    Some(_) => {}
                }
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(tasks) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the precedence graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(tasks: &[Task]) -> Option<ValidationError> {
    // activity_id → successors
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        for act in &task.activities {
            for pred in &act.predecessors {
                adj.entry(pred.as_str()).or_default().push(act.id.as_str());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    let nodes = tasks
        .iter()
        .flat_map(|t| t.activities.iter().map(|a| a.id.as_str()));
    for node in nodes {
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving activity '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}
