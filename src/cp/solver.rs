//! CP solver interface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::CpModel;

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not necessarily optimal) solution found.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// No solution found within the limits.
    Unknown,
}

/// Solution for an interval variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSolution {
    /// Assigned start time.
    pub start: i64,
    /// Assigned end time.
    pub end: i64,
}

/// Solution from a CP solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective value, when the model has an objective and a solution exists.
    pub objective_value: Option<i64>,
    /// Best proven bound on the objective.
    pub lower_bound: Option<i64>,
    /// Interval assignments.
    pub intervals: HashMap<String, IntervalSolution>,
    /// Search passes performed.
    pub iterations: usize,
    /// Solve time in milliseconds.
    pub solve_time_ms: u64,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            lower_bound: None,
            intervals: HashMap::new(),
            iterations: 0,
            solve_time_ms: 0,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }

    /// Maximum end time across all intervals.
    pub fn max_end(&self) -> i64 {
        self.intervals.values().map(|s| s.end).max().unwrap_or(0)
    }

    /// Start of a named interval.
    pub fn start_of(&self, name: &str) -> Option<i64> {
        self.intervals.get(name).map(|s| s.start)
    }
}

/// Solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds.
    pub time_limit_ms: u64,
    /// Maximum number of search passes, for solvers that search in passes.
    pub max_iterations: usize,
    /// Seed for randomized search.
    pub seed: u64,
    /// Stop after finding the first feasible solution.
    pub stop_after_first: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 60_000,
            max_iterations: 2_000,
            seed: 42,
            stop_after_first: false,
        }
    }
}

impl SolverConfig {
    /// Sets the time limit.
    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Stops at the first feasible solution.
    pub fn first_solution_only(mut self) -> Self {
        self.stop_after_first = true;
        self
    }
}

/// Trait for CP solver implementations.
///
/// Implementors provide the actual search: [`PumpkinSolver`](super::PumpkinSolver)
/// hands the model to an external engine, [`ListScheduleSolver`](super::ListScheduleSolver)
/// runs a heuristic in-process.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}
