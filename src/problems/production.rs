//! Multi-period production planning (linear program).
//!
//! A steel works makes several products over a run of months. Each month it
//! may produce, carry stock forward, or fall behind on orders (backlog),
//! subject to monthly resource limits. Minimise production, holding, and
//! backlog cost.
//!
//! # Formulation
//!
//! Per product `p` and month `m`, with `I[p,0] = B[p,0] = 0`:
//!
//! ```text
//! P[p,m] + I[p,m-1] - I[p,m] - B[p,m-1] + B[p,m] = demand[p,m]
//! Σ_p usage[r,p]·P[p,m] <= available[r,m]        for every resource r
//! I[p,last] >= min_ending_inventory
//! B[p,m] <= max_backlog
//! ```
//!
//! Last month's unmet demand may stay in `B[p,last]`.

use std::fmt;

use good_lp::{constraint, variable, Expression, Solution, Variable};
use log::debug;
use serde::{Deserialize, Serialize};

use super::format_amount;
use crate::error::{FormulationError, Result};
use crate::lp::{LpModel, LpOutcome, LpStatus, Sense};

/// Per-month data for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Tons ordered each month.
    pub demand: Vec<f64>,
    /// Cost per ton produced.
    pub production_cost: Vec<f64>,
    /// Cost per ton held at month end.
    pub inventory_cost: Vec<f64>,
    /// Cost per ton owed at month end.
    pub backlog_cost: Vec<f64>,
}

/// A shared monthly capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    pub name: String,
    /// Amount available each month.
    pub available: Vec<f64>,
    /// Consumption per ton, one entry per product.
    pub usage: Vec<f64>,
}

/// A production planning instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionProblem {
    pub products: Vec<Product>,
    pub capacities: Vec<Capacity>,
    pub min_ending_inventory: f64,
    pub max_backlog: f64,
}

/// Quantities for one product in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMonth {
    pub product: String,
    pub produced: f64,
    pub inventory: f64,
    pub backlog: f64,
}

/// All products in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPlan {
    /// 1-based month number.
    pub month: usize,
    pub products: Vec<ProductMonth>,
}

/// Solved production plan.
#[derive(Debug, Clone, Serialize)]
pub struct ProductionPlan {
    pub status: LpStatus,
    /// Empty unless optimal.
    pub months: Vec<MonthPlan>,
    pub total_cost: f64,
}

struct PlanVars {
    produce: Vec<Vec<Variable>>,
    inventory: Vec<Vec<Variable>>,
    backlog: Vec<Vec<Variable>>,
}

impl ProductionProblem {
    /// Bands and coils over four months.
    pub fn reference() -> Self {
        Self {
            products: vec![
                Product {
                    name: "Bands".into(),
                    demand: vec![3000.0, 6000.0, 4000.0, 2000.0],
                    production_cost: vec![10.0, 9.0, 10.0, 9.0],
                    inventory_cost: vec![2.5, 2.0, 3.0, 2.0],
                    backlog_cost: vec![10.0, 10.0, 11.0, 15.0],
                },
                Product {
                    name: "Coils".into(),
                    demand: vec![1000.0, 2500.0, 2500.0, 3000.0],
                    production_cost: vec![11.0, 12.0, 11.0, 12.0],
                    inventory_cost: vec![3.0, 3.0, 2.0, 3.0],
                    backlog_cost: vec![10.0, 9.0, 10.0, 14.0],
                },
            ],
            capacities: vec![
                Capacity {
                    name: "labour".into(),
                    available: vec![8000.0, 7000.0, 6000.0, 9000.0],
                    usage: vec![1.0, 1.5],
                },
                Capacity {
                    name: "machine".into(),
                    available: vec![4000.0, 5000.0, 6000.0, 9000.0],
                    usage: vec![0.5, 1.0],
                },
                Capacity {
                    name: "steel".into(),
                    available: vec![4000.0, 4000.0, 5000.0, 5000.0],
                    usage: vec![0.5, 0.5],
                },
            ],
            min_ending_inventory: 200.0,
            max_backlog: 1000.0,
        }
    }

    /// Number of months, taken from the first product's demand.
    pub fn months(&self) -> usize {
        self.products.first().map_or(0, |p| p.demand.len())
    }

    /// Checks that every series covers the same months.
    pub fn validate(&self) -> Result<()> {
        let n = self.months();
        if n == 0 {
            return Err(invalid("no months to plan".into()));
        }
        for p in &self.products {
            let series = [&p.demand, &p.production_cost, &p.inventory_cost, &p.backlog_cost];
            if series.iter().any(|s| s.len() != n) {
                return Err(invalid(format!("product {} must cover {n} months", p.name)));
            }
        }
        for c in &self.capacities {
            if c.available.len() != n {
                return Err(invalid(format!("capacity {} must cover {n} months", c.name)));
            }
            if c.usage.len() != self.products.len() {
                return Err(invalid(format!(
                    "capacity {} needs one usage per product",
                    c.name
                )));
            }
        }
        Ok(())
    }

    fn build(&self) -> Result<(LpModel, PlanVars)> {
        self.validate()?;
        let months = self.months();
        let mut model = LpModel::new("production_planning", Sense::Minimise);

        let mut vars = PlanVars {
            produce: Vec::new(),
            inventory: Vec::new(),
            backlog: Vec::new(),
        };
        for p in &self.products {
            let mut series = |prefix: &str| -> Vec<Variable> {
                (1..=months)
                    .map(|m| {
                        model
                            .vars
                            .add(variable().min(0.0).name(format!("{prefix}_{}_{m}", p.name)))
                    })
                    .collect()
            };
            vars.produce.push(series("produce"));
            vars.inventory.push(series("inventory"));
            vars.backlog.push(series("backlog"));
        }

        let mut objective = Expression::from(0.0);
        for (p, product) in self.products.iter().enumerate() {
            for m in 0..months {
                objective += product.production_cost[m] * vars.produce[p][m];
                objective += product.inventory_cost[m] * vars.inventory[p][m];
                objective += product.backlog_cost[m] * vars.backlog[p][m];
            }
        }
        model.objective = objective;

        for (p, product) in self.products.iter().enumerate() {
            for m in 0..months {
                let mut balance = vars.produce[p][m] - vars.inventory[p][m] + vars.backlog[p][m];
                if m > 0 {
                    balance += vars.inventory[p][m - 1];
                    balance -= vars.backlog[p][m - 1];
                }
                model.constrain(constraint!(balance == product.demand[m]));
                model.constrain(constraint!(vars.backlog[p][m] <= self.max_backlog));
            }
            model.constrain(constraint!(
                vars.inventory[p][months - 1] >= self.min_ending_inventory
            ));
        }

        for capacity in &self.capacities {
            for m in 0..months {
                let used: Expression = capacity
                    .usage
                    .iter()
                    .zip(&vars.produce)
                    .map(|(&rate, series)| rate * series[m])
                    .sum();
                model.constrain(constraint!(used <= capacity.available[m]));
            }
        }

        debug!("production model: {} constraints", model.constraint_count());
        Ok((model, vars))
    }

    /// Solves the instance.
    pub fn solve(&self) -> Result<ProductionPlan> {
        let (model, vars) = self.build()?;
        let solution = match model.solve()? {
            LpOutcome::Optimal(solution) => solution,
            outcome => {
                return Ok(ProductionPlan {
                    status: outcome.status(),
                    months: Vec::new(),
                    total_cost: 0.0,
                })
            }
        };

        let months: Vec<MonthPlan> = (0..self.months())
            .map(|m| MonthPlan {
                month: m + 1,
                products: self
                    .products
                    .iter()
                    .enumerate()
                    .map(|(p, product)| ProductMonth {
                        product: product.name.clone(),
                        produced: clean(solution.value(vars.produce[p][m])),
                        inventory: clean(solution.value(vars.inventory[p][m])),
                        backlog: clean(solution.value(vars.backlog[p][m])),
                    })
                    .collect(),
            })
            .collect();

        let total_cost = self
            .products
            .iter()
            .enumerate()
            .flat_map(|(p, product)| {
                months.iter().enumerate().map(move |(m, month)| {
                    let q = &month.products[p];
                    q.produced * product.production_cost[m]
                        + q.inventory * product.inventory_cost[m]
                        + q.backlog * product.backlog_cost[m]
                })
            })
            .sum();

        Ok(ProductionPlan {
            status: LpStatus::Optimal,
            months,
            total_cost: clean(total_cost),
        })
    }
}

/// Solver value with round-off noise removed.
fn clean(v: f64) -> f64 {
    let r = (v * 1e6).round() / 1e6;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn invalid(message: String) -> FormulationError {
    FormulationError::InvalidModel(message)
}

impl fmt::Display for ProductionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status != LpStatus::Optimal {
            return writeln!(f, "Status: {}", self.status);
        }
        for month in &self.months {
            writeln!(f, "Month {}:", month.month)?;
            for p in &month.products {
                writeln!(f, "  {} produced: {} tons", p.product, format_amount(p.produced))?;
            }
            for p in &month.products {
                writeln!(f, "  {} inventory: {} tons", p.product, format_amount(p.inventory))?;
            }
            for p in &month.products {
                writeln!(f, "  {} backlog: {} tons", p.product, format_amount(p.backlog))?;
            }
        }
        writeln!(f, "Total cost: {}", format_amount(self.total_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-4;

    #[test]
    fn test_reference_optimum() {
        let plan = ProductionProblem::reference().solve().unwrap();
        assert_eq!(plan.status, LpStatus::Optimal);
        assert!(
            (plan.total_cost - 273_200.0).abs() < 1e-3,
            "total cost {}",
            plan.total_cost
        );
        assert_eq!(plan.months.len(), 4);
    }

    #[test]
    fn test_plan_satisfies_every_constraint() {
        let problem = ProductionProblem::reference();
        let plan = problem.solve().unwrap();

        for (p, product) in problem.products.iter().enumerate() {
            let (mut stock, mut owed) = (0.0, 0.0);
            for (m, month) in plan.months.iter().enumerate() {
                let q = &month.products[p];
                assert!(q.produced >= -TOL && q.inventory >= -TOL && q.backlog >= -TOL);
                let delivered = q.produced + stock - q.inventory - owed + q.backlog;
                assert!(
                    (delivered - product.demand[m]).abs() < TOL,
                    "{} month {}: {delivered}",
                    product.name,
                    m + 1
                );
                assert!(q.backlog <= problem.max_backlog + TOL);
                stock = q.inventory;
                owed = q.backlog;
            }
            assert!(stock >= problem.min_ending_inventory - TOL);
        }

        for capacity in &problem.capacities {
            for (m, month) in plan.months.iter().enumerate() {
                let used: f64 = month
                    .products
                    .iter()
                    .zip(&capacity.usage)
                    .map(|(q, rate)| q.produced * rate)
                    .sum();
                assert!(used <= capacity.available[m] + TOL, "{} month {}", capacity.name, m + 1);
            }
        }

        let cost: f64 = problem
            .products
            .iter()
            .enumerate()
            .flat_map(|(p, product)| {
                plan.months.iter().enumerate().map(move |(m, month)| {
                    let q = &month.products[p];
                    q.produced * product.production_cost[m]
                        + q.inventory * product.inventory_cost[m]
                        + q.backlog * product.backlog_cost[m]
                })
            })
            .sum();
        assert!((cost - plan.total_cost).abs() < 1e-2);
    }

    #[test]
    fn test_report_format() {
        let report = ProductionProblem::reference().solve().unwrap().to_string();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "Month 1:");
        assert!(lines[1].starts_with("  Bands produced: "));
        assert!(lines[2].starts_with("  Coils produced: "));
        assert!(lines[3].starts_with("  Bands inventory: "));
        assert!(lines[6].starts_with("  Coils backlog: "));
        assert!(lines[6].ends_with(" tons"));
        assert_eq!(lines[7], "Month 2:");
        assert_eq!(lines.len(), 4 * 7 + 1);
        assert_eq!(lines[28], "Total cost: 273200.0");
    }

    #[test]
    fn test_no_steel_is_infeasible() {
        let mut problem = ProductionProblem::reference();
        problem
            .capacities
            .iter_mut()
            .find(|c| c.name == "steel")
            .unwrap()
            .available = vec![0.0; 4];

        let plan = problem.solve().unwrap();
        assert_eq!(plan.status, LpStatus::Infeasible);
        assert!(plan.months.is_empty());
        assert_eq!(plan.to_string(), "Status: Infeasible\n");
    }

    #[test]
    fn test_single_month_instance_from_json() {
        let json = r#"{
            "products": [{
                "name": "Wire",
                "demand": [100.0],
                "production_cost": [2.0],
                "inventory_cost": [1.0],
                "backlog_cost": [5.0]
            }],
            "capacities": [{"name": "mill", "available": [80.0], "usage": [1.0]}],
            "min_ending_inventory": 0.0,
            "max_backlog": 50.0
        }"#;
        let problem: ProductionProblem = serde_json::from_str(json).unwrap();
        let plan = problem.solve().unwrap();

        // 80 produced, 20 backlogged: 160 + 100
        assert!((plan.total_cost - 260.0).abs() < 1e-6);
        let q = &plan.months[0].products[0];
        assert!((q.produced - 80.0).abs() < 1e-6);
        assert!((q.backlog - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_ragged_series() {
        let mut problem = ProductionProblem::reference();
        problem.products[1].demand.pop();
        assert!(matches!(
            problem.solve(),
            Err(FormulationError::InvalidModel(_))
        ));

        let mut problem = ProductionProblem::reference();
        problem.capacities[0].usage.push(1.0);
        assert!(problem.validate().is_err());
    }
}
