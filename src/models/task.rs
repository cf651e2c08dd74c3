//! Task (unit of work) model.
//!
//! A task is one physical unit moving through the line, made of activities
//! linked by precedence.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};

use super::Activity;

/// A task to be scheduled.
///
/// `category` groups units of the same product model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Product model name.
    pub category: String,
    /// Activities that compose this task.
    pub activities: Vec<Activity>,
}

impl Task {
    /// Creates a new task with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            category: String::new(),
            activities: Vec::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the task category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Adds an activity to this task.
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// Total processing duration across all activities.
    pub fn total_duration(&self) -> i64 {
        self.activities.iter().map(|a| a.duration).sum()
    }

    /// Activities no other activity of this task waits on.
    pub fn final_activities(&self) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| {
                !self
                    .activities
                    .iter()
                    .any(|other| other.predecessors.contains(&a.id))
            })
            .collect()
    }

    /// Whether this task has any activities.
    pub fn has_activities(&self) -> bool {
        !self.activities.is_empty()
    }

    /// Number of activities.
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }
}
