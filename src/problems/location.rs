//! Department location (mixed-integer program).
//!
//! A company moves departments out of London. Each department earns a
//! yearly benefit depending on its city, and each pair of departments pays
//! for the communication between their cities. Choose a city per
//! department, with at most `max_per_city` departments in a city, to
//! maximise benefit minus communication cost.
//!
//! # Formulation
//!
//! - `locate[d,c]` binary: department `d` sits in city `c`.
//! - `comm[f,j,l] >= 0`: flow `f = (i,k)` runs between `i` in `j` and `k`
//!   in `l`. Linearises `locate[i,j] * locate[k,l]` with
//!   `comm <= locate[i,j]`, `comm <= locate[k,l]`,
//!   `comm >= locate[i,j] + locate[k,l] - 1`.
//! - maximise `Σ benefit·locate − Σ volume·cost·comm`.
//!
//! # Reference
//! Williams (2013), "Model Building in Mathematical Programming", 12.10

use std::fmt;

use good_lp::{constraint, variable, Expression, Solution, Variable};
use log::debug;
use serde::{Deserialize, Serialize};

use super::format_amount;
use crate::error::{FormulationError, Result};
use crate::lp::{LpModel, LpOutcome, LpStatus, Sense};

/// Communication volume between two departments (thousand units/yr).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub from: String,
    pub to: String,
    pub volume: f64,
}

/// A department location instance.
///
/// `benefits[d][c]` is in £000/yr for department `d` in city `c`;
/// `unit_costs[j][l]` is £ per unit between cities `j` and `l`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationProblem {
    pub cities: Vec<String>,
    pub departments: Vec<String>,
    pub benefits: Vec<Vec<f64>>,
    pub flows: Vec<Flow>,
    pub unit_costs: Vec<Vec<f64>>,
    pub max_per_city: usize,
}

/// City chosen for one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub department: String,
    pub city: String,
}

/// Solved location plan.
#[derive(Debug, Clone, Serialize)]
pub struct LocationPlan {
    pub status: LpStatus,
    /// One entry per department, in department order; empty unless optimal.
    pub placements: Vec<Placement>,
    /// Gross yearly benefit (£000).
    pub benefit: f64,
    /// Yearly communication cost (£000).
    pub communication_cost: f64,
    /// Benefit minus communication cost (£000).
    pub net_benefit: f64,
}

impl LocationPlan {
    /// City of a department.
    pub fn city_of(&self, department: &str) -> Option<&str> {
        self.placements
            .iter()
            .find(|p| p.department == department)
            .map(|p| p.city.as_str())
    }
}

impl LocationProblem {
    /// The five-department, three-city instance.
    pub fn reference() -> Self {
        let names = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let flow = |from: &str, to: &str, volume: f64| Flow {
            from: from.into(),
            to: to.into(),
            volume,
        };

        Self {
            cities: names(&["Bristol", "Brighton", "London"]),
            departments: names(&["A", "B", "C", "D", "E"]),
            benefits: vec![
                vec![10.0, 10.0, 0.0],
                vec![15.0, 20.0, 0.0],
                vec![10.0, 15.0, 0.0],
                vec![20.0, 15.0, 0.0],
                vec![5.0, 15.0, 0.0],
            ],
            flows: vec![
                flow("A", "B", 0.0),
                flow("A", "C", 1.0),
                flow("A", "D", 1.5),
                flow("A", "E", 0.0),
                flow("B", "C", 1.4),
                flow("B", "D", 1.2),
                flow("B", "E", 0.0),
                flow("C", "D", 0.0),
                flow("C", "E", 2.0),
                flow("D", "E", 0.7),
            ],
            unit_costs: vec![
                vec![5.0, 14.0, 13.0],
                vec![14.0, 5.0, 9.0],
                vec![13.0, 9.0, 10.0],
            ],
            max_per_city: 3,
        }
    }

    /// Checks matrix shapes and flow endpoints.
    pub fn validate(&self) -> Result<()> {
        let (nd, nc) = (self.departments.len(), self.cities.len());
        if self.benefits.len() != nd || self.benefits.iter().any(|row| row.len() != nc) {
            return Err(invalid(format!("benefits must be {nd} x {nc}")));
        }
        if self.unit_costs.len() != nc || self.unit_costs.iter().any(|row| row.len() != nc) {
            return Err(invalid(format!("unit costs must be {nc} x {nc}")));
        }
        for f in &self.flows {
            for end in [&f.from, &f.to] {
                if self.department_index(end).is_none() {
                    return Err(invalid(format!("flow references unknown department {end}")));
                }
            }
            if f.from == f.to {
                return Err(invalid(format!("flow from {} to itself", f.from)));
            }
        }
        Ok(())
    }

    fn department_index(&self, name: &str) -> Option<usize> {
        self.departments.iter().position(|d| d == name)
    }

    /// Builds the MIP. Returns the model and the `locate[d][c]` handles.
    pub fn build(&self) -> Result<(LpModel, Vec<Vec<Variable>>)> {
        self.validate()?;
        let mut model = LpModel::new("department_location", Sense::Maximise);

        let locate: Vec<Vec<Variable>> = self
            .departments
            .iter()
            .map(|d| {
                self.cities
                    .iter()
                    .map(|c| model.vars.add(variable().binary().name(format!("locate_{d}_{c}"))))
                    .collect()
            })
            .collect();

        let mut objective: Expression = locate
            .iter()
            .zip(&self.benefits)
            .flat_map(|(row, benefits)| row.iter().zip(benefits).map(|(&v, &b)| b * v))
            .sum();

        // Zero-volume flows contribute nothing and are left out.
        for flow in self.flows.iter().filter(|f| f.volume != 0.0) {
            let (i, k) = match (
                self.department_index(&flow.from),
                self.department_index(&flow.to),
            ) {
                (Some(i), Some(k)) => (i, k),
                _ => continue,
            };
            for (j, city_j) in self.cities.iter().enumerate() {
                for (l, city_l) in self.cities.iter().enumerate() {
                    let comm = model.vars.add(variable().min(0.0).name(format!(
                        "comm_{}_{}_{city_j}_{city_l}",
                        flow.from, flow.to
                    )));
                    objective -= (flow.volume * self.unit_costs[j][l]) * comm;

                    let (a, b) = (locate[i][j], locate[k][l]);
                    model.constrain(constraint!(comm <= a));
                    model.constrain(constraint!(comm <= b));
                    model.constrain(constraint!(comm >= a + b - 1.0));
                }
            }
        }

        for row in &locate {
            let placed: Expression = row.iter().map(|&v| Expression::from(v)).sum();
            model.constrain(constraint!(placed == 1.0));
        }
        for c in 0..self.cities.len() {
            let hosted: Expression = locate.iter().map(|row| Expression::from(row[c])).sum();
            model.constrain(constraint!(hosted <= self.max_per_city as f64));
        }

        model.objective = objective;
        debug!("location model: {} constraints", model.constraint_count());
        Ok((model, locate))
    }

    /// Solves the instance.
    pub fn solve(&self) -> Result<LocationPlan> {
        let (model, locate) = self.build()?;
        let solution = match model.solve()? {
            LpOutcome::Optimal(solution) => solution,
            outcome => {
                return Ok(LocationPlan {
                    status: outcome.status(),
                    placements: Vec::new(),
                    benefit: 0.0,
                    communication_cost: 0.0,
                    net_benefit: 0.0,
                })
            }
        };

        let mut chosen = Vec::with_capacity(self.departments.len());
        for (d, row) in locate.iter().enumerate() {
            let c = row
                .iter()
                .position(|&v| solution.value(v) > 0.5)
                .ok_or_else(|| {
                    FormulationError::Solver(format!(
                        "department {} was not placed",
                        self.departments[d]
                    ))
                })?;
            chosen.push(c);
        }

        let benefit: f64 = chosen
            .iter()
            .enumerate()
            .map(|(d, &c)| self.benefits[d][c])
            .sum();
        let communication_cost: f64 = self
            .flows
            .iter()
            .filter_map(|f| {
                let i = self.department_index(&f.from)?;
                let k = self.department_index(&f.to)?;
                Some(f.volume * self.unit_costs[chosen[i]][chosen[k]])
            })
            .sum();

        let placements = chosen
            .iter()
            .enumerate()
            .map(|(d, &c)| Placement {
                department: self.departments[d].clone(),
                city: self.cities[c].clone(),
            })
            .collect();

        Ok(LocationPlan {
            status: LpStatus::Optimal,
            placements,
            benefit,
            communication_cost,
            net_benefit: benefit - communication_cost,
        })
    }
}

fn invalid(message: String) -> FormulationError {
    FormulationError::InvalidModel(message)
}

impl fmt::Display for LocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        if self.status != LpStatus::Optimal {
            return Ok(());
        }
        for p in &self.placements {
            writeln!(f, "Department {} should be located in {}", p.department, p.city)?;
        }
        writeln!(
            f,
            "Total benefit (minus communication costs): £{} thousand per year",
            format_amount(self.net_benefit)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_optimum() {
        let plan = LocationProblem::reference().solve().unwrap();

        assert_eq!(plan.status, LpStatus::Optimal);
        assert_eq!(plan.city_of("A"), Some("Bristol"));
        assert_eq!(plan.city_of("D"), Some("Bristol"));
        assert_eq!(plan.city_of("B"), Some("Brighton"));
        assert_eq!(plan.city_of("C"), Some("Brighton"));
        assert_eq!(plan.city_of("E"), Some("Brighton"));
        assert!((plan.benefit - 80.0).abs() < 1e-6);
        assert!((plan.communication_cost - 65.1).abs() < 1e-6);
        assert!((plan.net_benefit - 14.9).abs() < 1e-6);
    }

    #[test]
    fn test_plan_respects_constraints() {
        let problem = LocationProblem::reference();
        let plan = problem.solve().unwrap();

        assert_eq!(plan.placements.len(), problem.departments.len());
        for city in &problem.cities {
            let hosted = plan.placements.iter().filter(|p| &p.city == city).count();
            assert!(hosted <= problem.max_per_city, "{city} hosts {hosted}");
        }
        assert!((plan.benefit - plan.communication_cost - plan.net_benefit).abs() < 1e-6);
    }

    #[test]
    fn test_report_format() {
        let report = LocationProblem::reference().solve().unwrap().to_string();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "Status: Optimal");
        assert_eq!(lines[1], "Department A should be located in Bristol");
        assert_eq!(lines.len(), 7);
        assert_eq!(
            lines[6],
            "Total benefit (minus communication costs): £14.9 thousand per year"
        );
    }

    #[test]
    fn test_capacity_makes_instance_infeasible() {
        let mut problem = LocationProblem::reference();
        problem.max_per_city = 1;

        let plan = problem.solve().unwrap();
        assert_eq!(plan.status, LpStatus::Infeasible);
        assert!(plan.placements.is_empty());
        assert_eq!(plan.to_string(), "Status: Infeasible\n");
    }

    #[test]
    fn test_single_city_pays_local_costs() {
        let json = r#"{
            "cities": ["Leeds"],
            "departments": ["X", "Y"],
            "benefits": [[4.0], [6.0]],
            "flows": [{"from": "X", "to": "Y", "volume": 0.5}],
            "unit_costs": [[2.0]],
            "max_per_city": 2
        }"#;
        let problem: LocationProblem = serde_json::from_str(json).unwrap();
        let plan = problem.solve().unwrap();

        assert_eq!(plan.city_of("Y"), Some("Leeds"));
        assert!((plan.net_benefit - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let mut problem = LocationProblem::reference();
        problem.benefits.pop();
        assert!(matches!(
            problem.validate(),
            Err(FormulationError::InvalidModel(_))
        ));

        let mut problem = LocationProblem::reference();
        problem.flows[0].to = "Z".into();
        assert!(problem.build().is_err());
    }
}
