//! Linear and mixed-integer programming.
//!
//! Models are written with [`good_lp`] (variables, expressions,
//! `constraint!`) and solved by its `microlp` backend. [`LpModel`] only
//! collects the pieces of one model and turns the solver's answer into an
//! [`LpOutcome`]; infeasible and unbounded models are outcomes, not errors.
//!
//! ```
//! use good_lp::{constraint, variable, Solution};
//! use u_formulate::lp::{LpModel, LpOutcome, Sense};
//!
//! let mut model = LpModel::new("toy", Sense::Maximise);
//! let x = model.vars.add(variable().min(0.0).max(4.0).name("x"));
//! let y = model.vars.add(variable().binary().name("y"));
//! model.constrain(constraint!(x + 3.0 * y <= 5.0));
//! model.objective = 2.0 * x + 5.0 * y;
//!
//! match model.solve().unwrap() {
//!     LpOutcome::Optimal(solution) => assert!((solution.value(x) - 4.0).abs() < 1e-6),
//!     other => panic!("unexpected {:?}", other.status()),
//! }
//! ```

use std::fmt;

use good_lp::{microlp, Constraint, Expression, ProblemVariables, ResolutionError, SolverModel};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{FormulationError, Result};

/// Optimisation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimise,
    Maximise,
}

/// Outcome of a solve, as printed in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LpStatus {
    /// Proven optimal.
    Optimal,
    /// No point satisfies the constraints.
    Infeasible,
    /// The objective improves without limit.
    Unbounded,
}

impl fmt::Display for LpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LpStatus::Optimal => "Optimal",
            LpStatus::Infeasible => "Infeasible",
            LpStatus::Unbounded => "Unbounded",
        };
        f.write_str(label)
    }
}

/// A solver answer: the solution when optimal, otherwise why not.
#[derive(Debug)]
pub enum LpOutcome<S> {
    Optimal(S),
    Infeasible,
    Unbounded,
}

impl<S> LpOutcome<S> {
    pub fn status(&self) -> LpStatus {
        match self {
            LpOutcome::Optimal(_) => LpStatus::Optimal,
            LpOutcome::Infeasible => LpStatus::Infeasible,
            LpOutcome::Unbounded => LpStatus::Unbounded,
        }
    }
}

/// One linear or mixed-integer model, ready for `microlp`.
pub struct LpModel {
    /// Model name, used in logs.
    pub name: String,
    pub sense: Sense,
    pub vars: ProblemVariables,
    pub objective: Expression,
    constraints: Vec<Constraint>,
}

impl LpModel {
    /// Creates an empty model with a zero objective.
    pub fn new(name: impl Into<String>, sense: Sense) -> Self {
        Self {
            name: name.into(),
            sense,
            vars: ProblemVariables::new(),
            objective: Expression::from(0.0),
            constraints: Vec::new(),
        }
    }

    /// Adds a constraint.
    pub fn constrain(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Number of constraints added so far.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Solves with `microlp`. Only engine failures are errors.
    pub fn solve(self) -> Result<LpOutcome<impl good_lp::Solution>> {
        debug!(
            "solving model '{}': {} constraints",
            self.name,
            self.constraints.len()
        );

        let unsolved = match self.sense {
            Sense::Minimise => self.vars.minimise(self.objective),
            Sense::Maximise => self.vars.maximise(self.objective),
        };
        let problem = self
            .constraints
            .into_iter()
            .fold(unsolved.using(microlp), |problem, c| problem.with(c));

        match problem.solve() {
            Ok(solution) => {
                info!("model '{}' solved: Optimal", self.name);
                Ok(LpOutcome::Optimal(solution))
            }
            Err(ResolutionError::Infeasible) => {
                info!("model '{}' is infeasible", self.name);
                Ok(LpOutcome::Infeasible)
            }
            Err(ResolutionError::Unbounded) => {
                info!("model '{}' is unbounded", self.name);
                Ok(LpOutcome::Unbounded)
            }
            Err(other) => Err(FormulationError::Solver(other.to_string())),
        }
    }
}
