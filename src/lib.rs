//! Classical operations-research formulations.
//!
//! Three textbook problems, each stated as a model and handed to a solver:
//! department location (MIP), multi-period production planning (LP), and
//! computer assembly scheduling (CP). The solvers are black boxes behind
//! small modeling layers.
//!
//! # Modules
//!
//! - **`lp`**: Linear / mixed-integer models — `LpModel` over `good_lp`,
//!   solved by `microlp`
//! - **`cp`**: Interval models — `CpModel`, `IntervalVar`, `Constraint`,
//!   the `CpSolver` trait, the `PumpkinSolver` engine and the
//!   `ListScheduleSolver` fallback
//! - **`models`**: Scheduling domain types — `Task`, `Activity`, `Resource`,
//!   `Schedule`, `Assignment`
//! - **`validation`**: Input integrity checks (duplicate IDs, DAG cycles, resource refs)
//! - **`scheduler`**: `ScheduleCpBuilder` (domain → CP model → schedule) and `ScheduleKpi`
//! - **`problems`**: The three formulations with their reference instances
//! - **`error`**: `FormulationError`
//!
//! # References
//!
//! - Williams (2013), "Model Building in Mathematical Programming"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

pub mod cp;
pub mod error;
pub mod lp;
pub mod models;
pub mod problems;
pub mod scheduler;
pub mod validation;
