//! Constraint programming over fixed-duration intervals.
//!
//! A [`CpModel`] holds interval variables, `NoOverlap` and `Precedence`
//! constraints, and an optional makespan objective. Any [`CpSolver`] can
//! solve it. [`PumpkinSolver`] is the exact engine and the default;
//! [`ListScheduleSolver`] is a heuristic fallback that never proves more
//! than its own lower bound.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod list;
mod model;
mod pumpkin;
mod solver;
mod variables;

pub use list::ListScheduleSolver;
pub use model::{Constraint, CpModel, Objective};
pub use pumpkin::PumpkinSolver;
pub use solver::{CpSolution, CpSolver, IntervalSolution, SolverConfig, SolverStatus};
pub use variables::IntervalVar;
