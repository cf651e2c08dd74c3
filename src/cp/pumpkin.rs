//! Lazy clause generation engine for interval models, backed by Pumpkin.
//!
//! Every interval becomes one integer start variable. `NoOverlap` posts a
//! strict disjunctive, `Precedence` a binary inequality between an end and a
//! start, and `MinimizeMaxEnd` a `maximum` over the target ends that is then
//! minimised with linear SAT-UNSAT search.
//!
//! # Reference
//! - Schutt et al. (2009), "Why Cumulative Decomposition Is Not as Bad as It Sounds"
//! - Vilím (2004), "O(n log n) Filtering Algorithms for Unary Resource Constraint"

use std::time::{Duration, Instant};

use log::{debug, trace};
use pumpkin_solver::constraint_arguments::ArgDisjunctiveTask;
use pumpkin_solver::constraints;
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::options::SolverOptions;
use pumpkin_solver::rand::rngs::SmallRng;
use pumpkin_solver::rand::SeedableRng;
use pumpkin_solver::results::{
    OptimisationResult, ProblemSolution, SatisfactionResult, SolutionReference,
};
use pumpkin_solver::termination::TimeBudget;
use pumpkin_solver::variables::{DomainId, TransformableVariable};
use pumpkin_solver::{DefaultBrancher, Solver};

use super::model::{Constraint, CpModel, Objective};
use super::solver::{CpSolution, CpSolver, IntervalSolution, SolverConfig, SolverStatus};

/// Exact CP solver on top of the Pumpkin engine.
///
/// Reports `Optimal` once the search proves no shorter makespan exists,
/// `Feasible` when the time limit stops it first. `max_iterations` is not
/// used; the search is bounded by `time_limit_ms` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpkinSolver;

impl PumpkinSolver {
    pub fn new() -> Self {
        Self
    }
}

/// Why a model could not be posted.
enum PostError {
    /// A value does not fit Pumpkin's `i32` domains.
    OutOfRange,
    /// Root propagation already failed.
    Infeasible,
}

/// The posted model: one start variable per interval, in insertion order.
struct Posted {
    starts: Vec<DomainId>,
    makespan: Option<DomainId>,
}

impl CpSolver for PumpkinSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let clock = Instant::now();

        if let Err(err) = model.validate() {
            debug!("model '{}' rejected: {err}", model.name);
            return CpSolution::empty(SolverStatus::ModelInvalid);
        }

        let mut solver = Solver::with_options(SolverOptions {
            random_generator: SmallRng::seed_from_u64(config.seed),
            ..Default::default()
        });

        let posted = match post(&mut solver, model) {
            Ok(posted) => posted,
            Err(PostError::OutOfRange) => {
                debug!("model '{}' does not fit 32-bit domains", model.name);
                return CpSolution::empty(SolverStatus::ModelInvalid);
            }
            Err(PostError::Infeasible) => {
                debug!("model '{}' fails at the root", model.name);
                return finish(CpSolution::empty(SolverStatus::Infeasible), clock);
            }
        };

        let mut brancher = solver.default_brancher();
        let mut termination =
            TimeBudget::starting_now(Duration::from_millis(config.time_limit_ms));

        let solution = match posted.makespan {
            Some(makespan) if !config.stop_after_first => {
                let callback: fn(&Solver, SolutionReference, &DefaultBrancher) = on_solution;
                let result = solver.optimise(
                    &mut brancher,
                    &mut termination,
                    LinearSatUnsat::new(OptimisationDirection::Minimise, makespan, callback),
                );
                match result {
                    OptimisationResult::Optimal(found) => {
                        let mut solution = decode(model, &posted, &found, SolverStatus::Optimal);
                        solution.lower_bound = solution.objective_value;
                        solution
                    }
                    OptimisationResult::Satisfiable(found) => {
                        decode(model, &posted, &found, SolverStatus::Feasible)
                    }
                    OptimisationResult::Unsatisfiable => {
                        CpSolution::empty(SolverStatus::Infeasible)
                    }
                    OptimisationResult::Unknown => CpSolution::empty(SolverStatus::Unknown),
                }
            }
            _ => match solver.satisfy(&mut brancher, &mut termination) {
                SatisfactionResult::Satisfiable(satisfiable) => {
                    decode(model, &posted, &satisfiable.solution(), SolverStatus::Feasible)
                }
                SatisfactionResult::Unsatisfiable(_, _) => {
                    CpSolution::empty(SolverStatus::Infeasible)
                }
                SatisfactionResult::Unknown(_, _) => CpSolution::empty(SolverStatus::Unknown),
            },
        };

        debug!(
            "model '{}' finished: {:?}, makespan {:?}",
            model.name, solution.status, solution.objective_value
        );
        finish(solution, clock)
    }
}

fn on_solution(_: &Solver, _: SolutionReference, _: &DefaultBrancher) {
    trace!("improving solution found");
}

fn finish(mut solution: CpSolution, clock: Instant) -> CpSolution {
    solution.iterations = 1;
    solution.solve_time_ms = clock.elapsed().as_millis() as u64;
    solution
}

fn narrow(value: i64) -> Result<i32, PostError> {
    i32::try_from(value).map_err(|_| PostError::OutOfRange)
}

fn post(solver: &mut Solver, model: &CpModel) -> Result<Posted, PostError> {
    let tag = solver.new_constraint_tag();
    let intervals = model.intervals();

    let mut starts = Vec::with_capacity(intervals.len());
    let mut durations = Vec::with_capacity(intervals.len());
    for iv in intervals {
        let latest = iv.start_max.min(iv.end_max - iv.duration);
        if latest < iv.start_min {
            return Err(PostError::Infeasible);
        }
        starts.push(solver.new_named_bounded_integer(
            narrow(iv.start_min)?,
            narrow(latest)?,
            iv.name.as_str(),
        ));
        durations.push(narrow(iv.duration)?);
    }

    // `validate` guarantees every name resolves.
    let pos = |name: &str| model.position(name).ok_or(PostError::Infeasible);

    for constraint in &model.constraints {
        match constraint {
            Constraint::NoOverlap { intervals } => {
                let tasks = intervals
                    .iter()
                    .map(|name| {
                        let i = pos(name.as_str())?;
                        Ok(ArgDisjunctiveTask {
                            start_time: starts[i],
                            processing_time: durations[i],
                        })
                    })
                    .collect::<Result<Vec<_>, PostError>>()?;
                solver
                    .add_constraint(constraints::disjunctive_strict(tasks, tag))
                    .post()
                    .map_err(|_| PostError::Infeasible)?;
            }
            Constraint::Precedence {
                before,
                after,
                min_delay,
            } => {
                let (b, a) = (pos(before.as_str())?, pos(after.as_str())?);
                let gap = narrow(i64::from(durations[b]) + min_delay)?;
                solver
                    .add_constraint(constraints::binary_less_than_or_equals(
                        starts[b].offset(gap),
                        starts[a].scaled(1),
                        tag,
                    ))
                    .post()
                    .map_err(|_| PostError::Infeasible)?;
            }
        }
    }

    let makespan = match &model.objective {
        Some(Objective::MinimizeMaxEnd { intervals: targets }) => {
            let targets = if targets.is_empty() {
                (0..intervals.len()).collect::<Vec<_>>()
            } else {
                targets
                    .iter()
                    .map(|name| pos(name.as_str()))
                    .collect::<Result<Vec<_>, PostError>>()?
            };
            let upper = intervals.iter().map(|iv| iv.end_max).max().unwrap_or(0);
            let makespan = solver.new_named_bounded_integer(0, narrow(upper.max(0))?, "makespan");
            solver
                .add_constraint(constraints::maximum(
                    targets.iter().map(|&i| starts[i].offset(durations[i])),
                    makespan,
                    tag,
                ))
                .post()
                .map_err(|_| PostError::Infeasible)?;
            Some(makespan)
        }
        None => None,
    };

    Ok(Posted { starts, makespan })
}

fn decode(
    model: &CpModel,
    posted: &Posted,
    found: &impl ProblemSolution,
    status: SolverStatus,
) -> CpSolution {
    let intervals = model
        .intervals()
        .iter()
        .zip(&posted.starts)
        .map(|(iv, &start)| {
            let start = i64::from(found.get_integer_value(start));
            (
                iv.name.clone(),
                IntervalSolution {
                    start,
                    end: start + iv.duration,
                },
            )
        })
        .collect();

    let mut solution = CpSolution::empty(status);
    solution.objective_value = posted
        .makespan
        .map(|makespan| i64::from(found.get_integer_value(makespan)));
    solution.intervals = intervals;
    solution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::IntervalVar;

    fn config() -> SolverConfig {
        SolverConfig::default().with_time_limit_ms(30_000)
    }

    fn assert_no_overlap(solution: &CpSolution, names: &[&str]) {
        let mut slots: Vec<(i64, i64)> = names
            .iter()
            .map(|n| {
                let s = solution.intervals[*n];
                (s.start, s.end)
            })
            .collect();
        slots.sort_unstable();
        for pair in slots.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "{pair:?}");
        }
    }

    #[test]
    fn test_single_machine_is_optimal() {
        let mut model = CpModel::new("single", 1000);
        for (name, d) in [("a", 30), ("b", 50), ("c", 20)] {
            model.add_interval(IntervalVar::within_horizon(name, d, 1000));
        }
        model.add_no_overlap(vec!["a".into(), "b".into(), "c".into()]);
        model.set_objective(Objective::MinimizeMaxEnd { intervals: vec![] });

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(100));
        assert_eq!(solution.lower_bound, Some(100));
        assert_eq!(solution.max_end(), 100);
        assert_no_overlap(&solution, &["a", "b", "c"]);
    }

    #[test]
    fn test_precedence_with_delay() {
        let mut model = CpModel::new("chain", 1000);
        model.add_interval(IntervalVar::within_horizon("a", 40, 1000));
        model.add_interval(IntervalVar::within_horizon("b", 30, 1000));
        model.add_precedence("a".into(), "b".into(), 20);
        model.set_objective(Objective::MinimizeMaxEnd { intervals: vec![] });

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(90));
        assert_eq!(solution.start_of("b"), Some(60));
    }

    #[test]
    fn test_two_jobs_in_opposite_order() {
        // Each job starts on the station the other one finishes on.
        let mut model = CpModel::new("flow", 100);
        for (name, d) in [("j1_m1", 1), ("j1_m2", 5), ("j2_m2", 1), ("j2_m1", 5)] {
            model.add_interval(IntervalVar::within_horizon(name, d, 100));
        }
        model.add_precedence("j1_m1".into(), "j1_m2".into(), 0);
        model.add_precedence("j2_m2".into(), "j2_m1".into(), 0);
        model.add_no_overlap(vec!["j1_m1".into(), "j2_m1".into()]);
        model.add_no_overlap(vec!["j1_m2".into(), "j2_m2".into()]);
        model.set_objective(Objective::MinimizeMaxEnd {
            intervals: vec!["j1_m2".into(), "j2_m1".into()],
        });

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(6));
        assert_no_overlap(&solution, &["j1_m1", "j2_m1"]);
        assert_no_overlap(&solution, &["j1_m2", "j2_m2"]);
    }

    #[test]
    fn test_horizon_too_short_is_infeasible() {
        let mut model = CpModel::new("tight", 50);
        model.add_interval(IntervalVar::within_horizon("a", 30, 50));
        model.add_interval(IntervalVar::within_horizon("b", 30, 50));
        model.add_no_overlap(vec!["a".into(), "b".into()]);
        model.set_objective(Objective::MinimizeMaxEnd { intervals: vec![] });

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::Infeasible);
        assert!(solution.intervals.is_empty());
    }

    #[test]
    fn test_cycle_is_infeasible() {
        let mut model = CpModel::new("cycle", 100);
        model.add_interval(IntervalVar::within_horizon("a", 10, 100));
        model.add_interval(IntervalVar::within_horizon("b", 10, 100));
        model.add_precedence("a".into(), "b".into(), 0);
        model.add_precedence("b".into(), "a".into(), 0);

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_invalid_model() {
        let mut model = CpModel::new("bad", 100);
        model.add_precedence("x".into(), "y".into(), 0);
        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::ModelInvalid);

        let mut model = CpModel::new("huge", i64::MAX);
        model.add_interval(IntervalVar::within_horizon("a", 1, i64::MAX));
        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn test_without_objective_is_feasible() {
        let mut model = CpModel::new("plain", 100);
        model.add_interval(IntervalVar::within_horizon("a", 10, 100));
        model.add_interval(IntervalVar::within_horizon("b", 10, 100));
        model.add_no_overlap(vec!["a".into(), "b".into()]);

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolverStatus::Feasible);
        assert_eq!(solution.objective_value, None);
        assert_no_overlap(&solution, &["a", "b"]);
    }

    #[test]
    fn test_first_solution_only() {
        let mut model = CpModel::new("first", 100);
        model.add_interval(IntervalVar::within_horizon("a", 10, 100));
        model.set_objective(Objective::MinimizeMaxEnd { intervals: vec![] });

        let solution = PumpkinSolver::new().solve(&model, &config().first_solution_only());
        assert_eq!(solution.status, SolverStatus::Feasible);
        assert!(solution.objective_value.is_some_and(|v| v >= 10));
    }
}
