//! CP model definition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::variables::IntervalVar;
use crate::error::{FormulationError, Result};

/// A constraint in the CP model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// Non-overlapping intervals on a shared unary resource.
    NoOverlap {
        /// Names of interval variables that must not overlap.
        intervals: Vec<String>,
    },

    /// `end(before) + min_delay <= start(after)`.
    Precedence {
        /// Interval that must come first.
        before: String,
        /// Interval that must come after.
        after: String,
        /// Minimum gap (non-negative).
        min_delay: i64,
    },
}

/// Objective function for the CP model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Minimize the latest end among `intervals` (all intervals when empty).
    MinimizeMaxEnd {
        /// Intervals whose ends define the makespan.
        intervals: Vec<String>,
    },
}

/// A constraint programming model over fixed-duration intervals.
///
/// Intervals keep their insertion order, which solvers use as the final
/// tie-breaker so results are reproducible.
///
/// # Examples
///
/// ```
/// use u_formulate::cp::{CpModel, IntervalVar, Objective};
///
/// let mut model = CpModel::new("example", 1000);
/// model.add_interval(IntervalVar::new("op1", 0, 100, 50, 200));
/// model.add_interval(IntervalVar::new("op2", 0, 100, 30, 200));
/// model.add_no_overlap(vec!["op1".into(), "op2".into()]);
/// model.set_objective(Objective::MinimizeMaxEnd { intervals: vec![] });
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Planning horizon (maximum time).
    pub horizon: i64,
    intervals: Vec<IntervalVar>,
    index: HashMap<String, usize>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
    /// Objective function.
    pub objective: Option<Objective>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>, horizon: i64) -> Self {
        Self {
            name: name.into(),
            horizon,
            intervals: Vec::new(),
            index: HashMap::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Adds an interval variable. A variable with the same name is replaced.
    pub fn add_interval(&mut self, var: IntervalVar) {
        match self.index.get(&var.name) {
            Some(&i) => self.intervals[i] = var,
            None => {
                self.index.insert(var.name.clone(), self.intervals.len());
                self.intervals.push(var);
            }
        }
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Convenience: add a no-overlap constraint.
    pub fn add_no_overlap(&mut self, intervals: Vec<String>) {
        self.constraints.push(Constraint::NoOverlap { intervals });
    }

    /// Convenience: add a precedence constraint.
    pub fn add_precedence(&mut self, before: String, after: String, min_delay: i64) {
        self.constraints.push(Constraint::Precedence {
            before,
            after,
            min_delay,
        });
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Intervals in insertion order.
    pub fn intervals(&self) -> &[IntervalVar] {
        &self.intervals
    }

    /// Looks up an interval by name.
    pub fn interval(&self, name: &str) -> Option<&IntervalVar> {
        self.index.get(name).map(|&i| &self.intervals[i])
    }

    /// Position of an interval in insertion order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of interval variables.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Validates the model for consistency.
    ///
    /// Checks interval domains, that every referenced name exists, and that
    /// precedence delays are non-negative.
    pub fn validate(&self) -> Result<()> {
        for iv in &self.intervals {
            if iv.duration < 0 {
                return Err(invalid(format!("interval {} has negative duration", iv.name)));
            }
            if iv.start_min > iv.start_max || iv.end_min() > iv.end_max {
                return Err(invalid(format!("interval {} has an empty start domain", iv.name)));
            }
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::NoOverlap { intervals } => {
                    for name in intervals {
                        self.require(name)?;
                    }
                }
                Constraint::Precedence {
                    before,
                    after,
                    min_delay,
                } => {
                    self.require(before)?;
                    self.require(after)?;
                    if *min_delay < 0 {
                        return Err(invalid(format!(
                            "precedence {before} -> {after} has negative delay {min_delay}"
                        )));
                    }
                }
            }
        }

        if let Some(Objective::MinimizeMaxEnd { intervals }) = &self.objective {
            for name in intervals {
                self.require(name)?;
            }
        }

        Ok(())
    }

    fn require(&self, name: &str) -> Result<()> {
        if self.index.contains_key(name) {
            Ok(())
        } else {
            Err(invalid(format!("undefined interval: {name}")))
        }
    }
}

fn invalid(message: String) -> FormulationError {
    FormulationError::InvalidModel(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_replace() {
        let mut model = CpModel::new("m", 100);
        model.add_interval(IntervalVar::new("b", 0, 90, 10, 100));
        model.add_interval(IntervalVar::new("a", 0, 90, 10, 100));
        model.add_interval(IntervalVar::new("b", 0, 80, 20, 100));

        assert_eq!(model.interval_count(), 2);
        assert_eq!(model.intervals()[0].name, "b");
        assert_eq!(model.interval("b").map(|iv| iv.duration), Some(20));
        assert_eq!(model.position("a"), Some(1));
    }

    #[test]
    fn test_validate_undefined_reference() {
        let mut model = CpModel::new("m", 100);
        model.add_interval(IntervalVar::new("a", 0, 90, 10, 100));
        model.add_precedence("a".into(), "ghost".into(), 0);

        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("undefined interval: ghost"));
    }

    #[test]
    fn test_validate_domains() {
        let mut model = CpModel::new("m", 100);
        model.add_interval(IntervalVar::new("a", 50, 40, 10, 100));
        assert!(model.validate().is_err());

        let mut model = CpModel::new("m", 100);
        model.add_interval(IntervalVar::new("a", 95, 95, 10, 100));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_negative_delay() {
        let mut model = CpModel::new("m", 100);
        model.add_interval(IntervalVar::new("a", 0, 90, 10, 100));
        model.add_interval(IntervalVar::new("b", 0, 90, 10, 100));
        model.add_precedence("a".into(), "b".into(), -1);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_objective_reference() {
        let mut model = CpModel::new("m", 100);
        model.add_interval(IntervalVar::new("a", 0, 90, 10, 100));
        model.set_objective(Objective::MinimizeMaxEnd {
            intervals: vec!["z".into()],
        });
        assert!(model.validate().is_err());
    }
}
