//! CP formulation of the scheduling domain.
//!
//! Translates tasks and resources into a [`CpModel`], solves it with any
//! [`CpSolver`], and decodes the interval values back into a [`Schedule`].
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::cp::{CpModel, CpSolution, CpSolver, IntervalVar, Objective, SolverConfig};
use crate::error::{FormulationError, Result};
use crate::models::{Assignment, Resource, Schedule, Task};
use crate::validation::validate_input;

/// Builds a CP model from scheduling domain objects.
///
/// # Example
/// ```
/// use u_formulate::cp::{PumpkinSolver, SolverConfig};
/// use u_formulate::models::{Activity, Resource, Task};
/// use u_formulate::scheduler::ScheduleCpBuilder;
///
/// let tasks = vec![Task::new("T1")
///     .with_activity(Activity::new("T1_a", "T1", 0).with_duration(5).on_resource("M1"))
///     .with_activity(
///         Activity::new("T1_b", "T1", 1)
///             .with_duration(3)
///             .on_resource("M1")
///             .with_predecessor("T1_a"),
///     )];
/// let resources = vec![Resource::new("M1")];
///
/// let builder = ScheduleCpBuilder::new(&tasks, &resources).with_horizon(100);
/// let (schedule, _) = builder
///     .solve(&PumpkinSolver::new(), &SolverConfig::default())
///     .unwrap();
/// assert_eq!(schedule.makespan(), 8);
/// ```
pub struct ScheduleCpBuilder<'a> {
    tasks: &'a [Task],
    resources: &'a [Resource],
    horizon: Option<i64>,
}

impl<'a> ScheduleCpBuilder<'a> {
    /// Creates a new CP builder.
    pub fn new(tasks: &'a [Task], resources: &'a [Resource]) -> Self {
        Self {
            tasks,
            resources,
            horizon: None,
        }
    }

    /// Sets the planning horizon. Defaults to the sum of all durations.
    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Planning horizon in effect.
    pub fn horizon(&self) -> i64 {
        self.horizon
            .unwrap_or_else(|| self.tasks.iter().map(Task::total_duration).sum())
    }

    /// Builds the CP model.
    ///
    /// Creates:
    /// - An `IntervalVar` per activity, start in `[0, horizon - duration]`
    /// - A `Precedence` per predecessor edge
    /// - A `NoOverlap` per resource used by two or more activities
    /// - `MinimizeMaxEnd` over the final activity of every task
    pub fn build(&self) -> CpModel {
        let horizon = self.horizon();
        let mut model = CpModel::new("scheduling", horizon);
        let mut targets = Vec::new();

        for task in self.tasks {
            for activity in &task.activities {
                model.add_interval(IntervalVar::within_horizon(
                    &activity.id,
                    activity.duration,
                    horizon,
                ));
                for pred in &activity.predecessors {
                    model.add_precedence(pred.clone(), activity.id.clone(), 0);
                }
            }
            targets.extend(task.final_activities().into_iter().map(|a| a.id.clone()));
        }

        for activity_ids in self.collect_resource_activities().into_values() {
            if activity_ids.len() > 1 {
                model.add_no_overlap(activity_ids);
            }
        }

        model.set_objective(Objective::MinimizeMaxEnd { intervals: targets });

        debug!(
            "built CP model: {} intervals, {} constraints, horizon {horizon}",
            model.interval_count(),
            model.constraint_count()
        );
        model
    }

    /// Validates the input, solves, and decodes the result.
    ///
    /// The schedule is empty when no solution was found; otherwise it has
    /// been re-checked and carries any violations.
    pub fn solve<S: CpSolver>(
        &self,
        solver: &S,
        config: &SolverConfig,
    ) -> Result<(Schedule, CpSolution)> {
        validate_input(self.tasks, self.resources).map_err(FormulationError::Validation)?;

        let model = self.build();
        model.validate()?;
        let solution = solver.solve(&model, config);
        info!(
            "scheduling finished: {:?}, objective {:?}, bound {:?}, {} ms",
            solution.status, solution.objective_value, solution.lower_bound, solution.solve_time_ms
        );

        let mut schedule = self.decode_solution(&solution);
        let violations = schedule.check(self.tasks, model.horizon);
        if violations > 0 {
            warn!("decoded schedule has {violations} violations");
        }
        Ok((schedule, solution))
    }

    /// Decodes a CP solution into a Schedule.
    fn decode_solution(&self, solution: &CpSolution) -> Schedule {
        let mut schedule = Schedule::new();

        if !solution.is_solution_found() {
            return schedule;
        }

        for task in self.tasks {
            for activity in &task.activities {
                if let Some(interval) = solution.intervals.get(&activity.id) {
                    schedule.add_assignment(Assignment::new(
                        &activity.id,
                        &task.id,
                        &activity.resource_id,
                        interval.start,
                        interval.end,
                    ));
                }
            }
        }

        schedule
    }

    /// Activity IDs per resource, in resource-id order.
    fn collect_resource_activities(&self) -> BTreeMap<&'a str, Vec<String>> {
        let mut map: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for task in self.tasks {
            for activity in &task.activities {
                map.entry(activity.resource_id.as_str())
                    .or_default()
                    .push(activity.id.clone());
            }
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{Constraint, ListScheduleSolver, PumpkinSolver, SolverStatus};
    use crate::models::Activity;
    use crate::validation::ValidationErrorKind;

    fn make_test_data() -> (Vec<Task>, Vec<Resource>) {
        let tasks = vec![
            Task::new("T1")
                .with_activity(Activity::new("T1_O1", "T1", 0).with_duration(10).on_resource("M1"))
                .with_activity(
                    Activity::new("T1_O2", "T1", 1)
                        .with_duration(20)
                        .on_resource("M1")
                        .with_predecessor("T1_O1"),
                ),
            Task::new("T2")
                .with_activity(Activity::new("T2_O1", "T2", 0).with_duration(15).on_resource("M1")),
        ];
        let resources = vec![Resource::new("M1")];
        (tasks, resources)
    }

    #[test]
    fn test_build_model() {
        let (tasks, resources) = make_test_data();
        let model = ScheduleCpBuilder::new(&tasks, &resources)
            .with_horizon(1000)
            .build();

        assert_eq!(model.interval_count(), 3);
        // 1 precedence (T1_O1→T1_O2) + 1 no-overlap (M1)
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.interval("T1_O2").map(|iv| iv.start_max), Some(980));
        assert_eq!(
            model.objective,
            Some(Objective::MinimizeMaxEnd {
                intervals: vec!["T1_O2".into(), "T2_O1".into()]
            })
        );
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_single_use_resource_gets_no_constraint() {
        let tasks = vec![Task::new("T1")
            .with_activity(Activity::new("a", "T1", 0).with_duration(5).on_resource("M1"))
            .with_activity(Activity::new("b", "T1", 1).with_duration(5).on_resource("M2"))];
        let resources = vec![Resource::new("M1"), Resource::new("M2")];
        let model = ScheduleCpBuilder::new(&tasks, &resources).build();

        assert!(!model
            .constraints
            .iter()
            .any(|c| matches!(c, Constraint::NoOverlap { .. })));
        assert_eq!(model.horizon, 10);
    }

    #[test]
    fn test_solve_basic() {
        let (tasks, resources) = make_test_data();
        let builder = ScheduleCpBuilder::new(&tasks, &resources).with_horizon(1000);

        let (schedule, solution) = builder
            .solve(&PumpkinSolver::new(), &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(schedule.assignment_count(), 3);
        assert_eq!(schedule.makespan(), 45);
        assert!(schedule.is_valid());
    }

    #[test]
    fn test_intra_task_precedence_and_no_overlap() {
        let (tasks, resources) = make_test_data();
        let builder = ScheduleCpBuilder::new(&tasks, &resources).with_horizon(1000);
        let (schedule, _) = builder
            .solve(&ListScheduleSolver::new(), &SolverConfig::default())
            .unwrap();

        let o1 = schedule.assignment_for_activity("T1_O1").unwrap();
        let o2 = schedule.assignment_for_activity("T1_O2").unwrap();
        assert!(o1.end <= o2.start);

        let m1 = schedule.assignments_for_resource("M1");
        for i in 0..m1.len() {
            for j in (i + 1)..m1.len() {
                assert!(!m1[i].overlaps(m1[j]), "{:?} overlaps {:?}", m1[i], m1[j]);
            }
        }
    }

    #[test]
    fn test_solve_rejects_invalid_input() {
        let tasks = vec![Task::new("T1")
            .with_activity(Activity::new("a", "T1", 0).with_duration(5).on_resource("nowhere"))];
        let resources = vec![Resource::new("M1")];

        let err = ScheduleCpBuilder::new(&tasks, &resources)
            .solve(&ListScheduleSolver::new(), &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, FormulationError::Validation(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_solve_rejects_shared_capacity() {
        let (tasks, _) = make_test_data();
        let resources = vec![Resource::new("M1").with_capacity(2)];

        let err = ScheduleCpBuilder::new(&tasks, &resources)
            .solve(&PumpkinSolver::new(), &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FormulationError::Validation(ref errors)
                if errors[0].kind == ValidationErrorKind::UnsupportedCapacity
        ));
    }

    #[test]
    fn test_horizon_too_short_gives_empty_schedule() {
        let (tasks, resources) = make_test_data();
        let (schedule, solution) = ScheduleCpBuilder::new(&tasks, &resources)
            .with_horizon(40)
            .solve(&PumpkinSolver::new(), &SolverConfig::default())
            .unwrap();

        assert!(!solution.is_solution_found());
        assert_eq!(schedule.assignment_count(), 0);
    }
}
