//! Schedule quality metrics (KPIs).
//!
//! Computes scheduling performance indicators from a completed schedule and
//! its input tasks.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Avg Utilization | Mean station busyness over the makespan |
//! | Bottleneck | Station with the highest utilization |
//! | Avg Flow Time | Mean task completion time (all tasks released at t=0) |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Schedule, Task};

/// Schedule performance indicators.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleKpi {
    /// Makespan: latest completion time.
    pub makespan: i64,
    /// Average resource utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-resource utilization.
    pub utilization_by_resource: HashMap<String, f64>,
    /// Most utilized resource; ties go to the smaller id.
    pub bottleneck: Option<String>,
    /// Average flow time over scheduled tasks.
    pub avg_flow_time: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its input tasks.
    pub fn calculate(schedule: &Schedule, tasks: &[Task]) -> Self {
        let completions: Vec<i64> = tasks
            .iter()
            .filter_map(|task| schedule.task_completion_time(&task.id))
            .collect();
        let avg_flow_time = if completions.is_empty() {
            0.0
        } else {
            completions.iter().sum::<i64>() as f64 / completions.len() as f64
        };

        let utilization_by_resource = schedule.all_utilizations();
        let avg_utilization = if utilization_by_resource.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_resource.values().sum();
            sum / utilization_by_resource.len() as f64
        };

        let bottleneck = utilization_by_resource
            .iter()
            .max_by(|(a_id, a), (b_id, b)| a.total_cmp(b).then_with(|| b_id.cmp(a_id)))
            .map(|(id, _)| id.clone());

        Self {
            makespan: schedule.makespan(),
            avg_utilization,
            utilization_by_resource,
            bottleneck,
            avg_flow_time,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_makespan: i64, min_utilization: f64) -> bool {
        self.makespan <= max_makespan && self.avg_utilization >= min_utilization
    }
}
