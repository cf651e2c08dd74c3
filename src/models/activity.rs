//! Activity (assembly step) model.
//!
//! An activity is the smallest schedulable unit of work. It belongs to a
//! task, occupies exactly one station for a fixed duration, and may wait on
//! other activities of the same task.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2

use serde::{Deserialize, Serialize};

/// A step to be scheduled.
///
/// Durations are in abstract time units. Predecessors refer to activity ids
/// within the same task and form a DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity identifier.
    pub id: String,
    /// Parent task identifier.
    pub task_id: String,
    /// Step name shown in reports (e.g. `InstallCPU`).
    pub label: String,
    /// Position within the task (0-indexed).
    pub sequence: i32,
    /// Processing time.
    pub duration: i64,
    /// Station that performs this step.
    pub resource_id: String,
    /// IDs of activities that must complete before this one starts.
    pub predecessors: Vec<String>,
}

impl Activity {
    /// Creates a new activity. The label defaults to the id.
    pub fn new(id: impl Into<String>, task_id: impl Into<String>, sequence: i32) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            task_id: task_id.into(),
            sequence,
            duration: 0,
            resource_id: String::new(),
            predecessors: Vec::new(),
        }
    }

    /// Sets the report label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the processing time.
    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the station.
    pub fn on_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = resource_id.into();
        self
    }

    /// Adds a predecessor activity ID.
    pub fn with_predecessor(mut self, predecessor_id: impl Into<String>) -> Self {
        self.predecessors.push(predecessor_id.into());
        self
    }

    /// Whether this activity waits on nothing.
    pub fn is_source(&self) -> bool {
        self.predecessors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_builder() {
        let act = Activity::new("U1_Test", "U1", 5)
            .with_label("Test")
            .with_duration(30)
            .on_resource("Tester")
            .with_predecessor("U1_Bluetooth");

        assert_eq!(act.id, "U1_Test");
        assert_eq!(act.task_id, "U1");
        assert_eq!(act.label, "Test");
        assert_eq!(act.sequence, 5);
        assert_eq!(act.duration, 30);
        assert_eq!(act.resource_id, "Tester");
        assert_eq!(act.predecessors, vec!["U1_Bluetooth".to_string()]);
        assert!(!act.is_source());
    }

    #[test]
    fn test_label_defaults_to_id() {
        let act = Activity::new("O1", "J1", 0);
        assert_eq!(act.label, "O1");
        assert!(act.is_source());
    }

    #[test]
    fn test_activity_serde() {
        let act = Activity::new("O1", "J1", 0)
            .with_duration(12)
            .on_resource("M1");
        let json = serde_json::to_string(&act).unwrap();
        let back: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, act);
    }
}
