//! Schedule (solution) model.
//!
//! A schedule is a complete assignment of activities to stations and time
//! slots. [`Schedule::check`] re-verifies it against the task data and
//! records any violations.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Task;

/// A complete schedule (solution to a scheduling problem).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Activity assignments (activity → resource × time).
    pub assignments: Vec<Assignment>,
    /// Constraint violations detected in this schedule.
    pub violations: Vec<Violation>,
}

/// An activity-resource-time assignment over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned activity ID.
    pub activity_id: String,
    /// Parent task ID (denormalized for query convenience).
    pub task_id: String,
    /// Assigned resource ID.
    pub resource_id: String,
    /// Start time.
    pub start: i64,
    /// End time.
    pub end: i64,
}

/// A constraint violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (resource or activity).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Activity started before its predecessor finished.
    PrecedenceViolation,
    /// Two activities overlap on a unary resource.
    CapacityExceeded,
    /// Activity ends after the planning horizon.
    HorizonExceeded,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(
        activity_id: impl Into<String>,
        task_id: impl Into<String>,
        resource_id: impl Into<String>,
        start: i64,
        end: i64,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            task_id: task_id.into(),
            resource_id: resource_id.into(),
            start,
            end,
        }
    }

    /// Duration (end - start).
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether two assignments share any instant.
    pub fn overlaps(&self, other: &Assignment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl Violation {
    /// Creates a capacity exceeded violation.
    pub fn capacity_exceeded(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::CapacityExceeded,
            entity_id: resource_id.into(),
            message: message.into(),
            severity: 90,
        }
    }

    /// Creates a precedence violation.
    pub fn precedence_violation(
        activity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type: ViolationType::PrecedenceViolation,
            entity_id: activity_id.into(),
            message: message.into(),
            severity: 95,
        }
    }

    /// Creates a horizon violation.
    pub fn horizon_exceeded(activity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::HorizonExceeded,
            entity_id: activity_id.into(),
            message: message.into(),
            severity: 70,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Makespan: latest end time across all assignments.
    pub fn makespan(&self) -> i64 {
        self.assignments.iter().map(|a| a.end).max().unwrap_or(0)
    }

    /// Finds the assignment for a given activity.
    pub fn assignment_for_activity(&self, activity_id: &str) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|a| a.activity_id == activity_id)
    }

    /// Returns all assignments for a given task.
    pub fn assignments_for_task(&self, task_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.task_id == task_id)
            .collect()
    }

    /// Returns all assignments for a given resource.
    pub fn assignments_for_resource(&self, resource_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.resource_id == resource_id)
            .collect()
    }

    /// Computes resource utilization: busy_time / horizon.
    ///
    /// Returns `None` if `horizon` is not positive.
    pub fn resource_utilization(&self, resource_id: &str, horizon: i64) -> Option<f64> {
        if horizon <= 0 {
            return None;
        }
        let busy: i64 = self
            .assignments_for_resource(resource_id)
            .iter()
            .map(|a| a.duration())
            .sum();
        Some(busy as f64 / horizon as f64)
    }

    /// Computes utilization for all resources that have assignments.
    ///
    /// Uses makespan as the horizon.
    pub fn all_utilizations(&self) -> HashMap<String, f64> {
        let horizon = self.makespan();
        if horizon <= 0 {
            return HashMap::new();
        }

        let mut resource_busy: HashMap<String, i64> = HashMap::new();
        for a in &self.assignments {
            *resource_busy.entry(a.resource_id.clone()).or_insert(0) += a.duration();
        }

        resource_busy
            .into_iter()
            .map(|(id, busy)| (id, busy as f64 / horizon as f64))
            .collect()
    }

    /// Completion time for a task (latest end of its assignments).
    pub fn task_completion_time(&self, task_id: &str) -> Option<i64> {
        self.assignments_for_task(task_id)
            .iter()
            .map(|a| a.end)
            .max()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Re-checks precedence, station exclusivity and the horizon, recording
    /// a violation for each breach. Returns the number of violations added.
    ///
    /// Activities without an assignment are not checked.
    pub fn check(&mut self, tasks: &[Task], horizon: i64) -> usize {
        let mut found = Vec::new();

        for task in tasks {
            for activity in &task.activities {
                let Some(current) = self.assignment_for_activity(&activity.id) else {
                    continue;
                };
                for pred in &activity.predecessors {
                    if let Some(before) = self.assignment_for_activity(pred) {
                        if before.end > current.start {
                            found.push(Violation::precedence_violation(
                                &activity.id,
                                format!(
                                    "{} starts at {} before {pred} ends at {}",
                                    activity.id, current.start, before.end
                                ),
                            ));
                        }
                    }
                }
            }
        }

        let mut by_resource: HashMap<&str, Vec<&Assignment>> = HashMap::new();
        for a in &self.assignments {
            by_resource.entry(a.resource_id.as_str()).or_default().push(a);
            if a.end > horizon {
                found.push(Violation::horizon_exceeded(
                    &a.activity_id,
                    format!("{} ends at {} after horizon {horizon}", a.activity_id, a.end),
                ));
            }
        }
        for (resource_id, mut list) in by_resource {
            list.sort_by_key(|a| (a.start, a.end));
            for pair in list.windows(2) {
                if pair[0].overlaps(pair[1]) {
                    found.push(Violation::capacity_exceeded(
                        resource_id,
                        format!(
                            "{} and {} overlap on {resource_id}",
                            pair[0].activity_id, pair[1].activity_id
                        ),
                    ));
                }
            }
        }

        let added = found.len();
        self.violations.extend(found);
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Activity;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(Assignment::new("O1", "J1", "M1", 0, 50));
        s.add_assignment(Assignment::new("O2", "J1", "M2", 50, 80));
        s.add_assignment(Assignment::new("O3", "J2", "M1", 50, 80));
        s
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task::new("J1")
                .with_activity(Activity::new("O1", "J1", 0).with_duration(50).on_resource("M1"))
                .with_activity(
                    Activity::new("O2", "J1", 1)
                        .with_duration(30)
                        .on_resource("M2")
                        .with_predecessor("O1"),
                ),
            Task::new("J2")
                .with_activity(Activity::new("O3", "J2", 0).with_duration(30).on_resource("M1")),
        ]
    }

    #[test]
    fn test_schedule_makespan() {
        assert_eq!(sample_schedule().makespan(), 80);
    }

    #[test]
    fn test_assignment_for_activity() {
        let s = sample_schedule();
        let a = s.assignment_for_activity("O1").unwrap();
        assert_eq!(a.resource_id, "M1");
        assert_eq!(a.duration(), 50);
        assert!(s.assignment_for_activity("O99").is_none());
    }

    #[test]
    fn test_assignments_by_task_and_resource() {
        let s = sample_schedule();
        assert_eq!(s.assignments_for_task("J1").len(), 2);
        assert_eq!(s.assignments_for_task("J2").len(), 1);
        assert_eq!(s.assignments_for_resource("M1").len(), 2);
    }

    #[test]
    fn test_resource_utilization() {
        let s = sample_schedule();
        // M1: busy 50 + 30 = 80 over horizon 80 → 1.0
        let util = s.resource_utilization("M1", 80).unwrap();
        assert!((util - 1.0).abs() < 1e-10);

        // M2: busy 30 over horizon 80 → 0.375
        let util2 = s.resource_utilization("M2", 80).unwrap();
        assert!((util2 - 0.375).abs() < 1e-10);
        assert!(s.resource_utilization("M2", 0).is_none());
    }

    #[test]
    fn test_task_completion_time() {
        let s = sample_schedule();
        assert_eq!(s.task_completion_time("J1"), Some(80));
        assert_eq!(s.task_completion_time("J2"), Some(80));
        assert_eq!(s.task_completion_time("J99"), None);
    }

    #[test]
    fn test_all_utilizations() {
        let utils = sample_schedule().all_utilizations();
        assert!((utils["M1"] - 1.0).abs() < 1e-10);
        assert!((utils["M2"] - 0.375).abs() < 1e-10);
    }

    #[test]
    fn test_check_clean_schedule() {
        let mut s = sample_schedule();
        assert_eq!(s.check(&sample_tasks(), 100), 0);
        assert!(s.is_valid());
    }

    #[test]
    fn test_check_records_each_kind() {
        let mut s = Schedule::new();
        s.add_assignment(Assignment::new("O1", "J1", "M1", 0, 50));
        s.add_assignment(Assignment::new("O2", "J1", "M2", 40, 70));
        s.add_assignment(Assignment::new("O3", "J2", "M1", 45, 75));

        let added = s.check(&sample_tasks(), 72);
        assert_eq!(added, 3);

        let kinds: Vec<&ViolationType> = s.violations.iter().map(|v| &v.violation_type).collect();
        assert!(kinds.contains(&&ViolationType::PrecedenceViolation));
        assert!(kinds.contains(&&ViolationType::CapacityExceeded));
        assert!(kinds.contains(&&ViolationType::HorizonExceeded));
        assert!(!s.is_valid());
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new();
        assert_eq!(s.makespan(), 0);
        assert!(s.is_valid());
        assert_eq!(s.assignment_count(), 0);
        assert!(s.all_utilizations().is_empty());
    }
}
