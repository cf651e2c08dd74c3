//! Computer assembly scheduling (constraint programming).
//!
//! Several computer models go down one line. Every unit passes through the
//! same steps, each on a dedicated station that handles one unit at a time;
//! durations depend on the model. Sequence all steps to finish the last
//! unit as early as possible.
//!
//! Every physical unit becomes a [`Task`], every step an [`Activity`]; the
//! rest is [`ScheduleCpBuilder`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cp::{CpSolver, PumpkinSolver, SolverConfig, SolverStatus};
use crate::error::Result;
use crate::models::{Activity, Resource, Task};
use crate::scheduler::{ScheduleCpBuilder, ScheduleKpi};

/// Latest allowed end of any step.
pub const DEFAULT_HORIZON: i64 = 10_000;

/// One assembly step of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub label: String,
    pub duration: i64,
    pub station: String,
    /// Labels of steps of the same unit that must finish first.
    #[serde(default)]
    pub after: Vec<String>,
}

/// A computer model and how many units to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerModel {
    pub name: String,
    pub quantity: usize,
    pub steps: Vec<Step>,
}

/// An assembly scheduling instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyProblem {
    pub models: Vec<ComputerModel>,
    #[serde(default = "default_horizon")]
    pub horizon: i64,
}

fn default_horizon() -> i64 {
    DEFAULT_HORIZON
}

/// Start and end of one step of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledStep {
    pub model: String,
    pub label: String,
    pub unit: usize,
    pub station: String,
    pub start: i64,
    pub end: i64,
}

/// Solved assembly schedule.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyPlan {
    pub status: SolverStatus,
    /// Ordered by model, then step, then unit; empty without a solution.
    pub steps: Vec<ScheduledStep>,
    pub makespan: Option<i64>,
    pub lower_bound: Option<i64>,
    pub kpi: Option<ScheduleKpi>,
}

impl AssemblyPlan {
    /// Whether a schedule was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

fn unit_id(model: &str, unit: usize) -> String {
    format!("{model}#{unit}")
}

fn step_id(model: &str, unit: usize, label: &str) -> String {
    format!("{model}#{unit}/{label}")
}

impl AssemblyProblem {
    /// Six models, seven steps each.
    pub fn reference() -> Self {
        const LABELS: [&str; 7] = [
            "InstallCPU",
            "InstallDisk",
            "InstallOptDevice",
            "InstallGPU",
            "InstallBluetooth",
            "Test",
            "Pack",
        ];
        const STATIONS: [&str; 7] = [
            "CPUInstaller",
            "DriveInstaller",
            "DriveInstaller",
            "CardInstaller",
            "CommInstaller",
            "Tester",
            "Packer",
        ];
        const AFTER: [&[&str]; 7] = [
            &[],
            &["InstallCPU"],
            &["InstallDisk"],
            &["InstallCPU"],
            &["InstallGPU", "InstallOptDevice"],
            &["InstallBluetooth"],
            &["Test"],
        ];
        let table: [(&str, usize, [i64; 7]); 6] = [
            ("Model A", 5, [8, 5, 4, 4, 5, 10, 5]),
            ("Model B", 3, [9, 6, 5, 6, 6, 12, 6]),
            ("Model C", 4, [7, 6, 4, 5, 4, 8, 5]),
            ("Model D", 2, [8, 5, 3, 6, 7, 10, 5]),
            ("Model E", 6, [9, 5, 5, 4, 5, 10, 5]),
            ("Model F", 1, [7, 4, 3, 5, 6, 9, 4]),
        ];

        let models = table
            .iter()
            .map(|&(name, quantity, durations)| ComputerModel {
                name: name.into(),
                quantity,
                steps: (0..LABELS.len())
                    .map(|i| Step {
                        label: LABELS[i].into(),
                        duration: durations[i],
                        station: STATIONS[i].into(),
                        after: AFTER[i].iter().map(|s| s.to_string()).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            models,
            horizon: DEFAULT_HORIZON,
        }
    }

    /// Expands units into tasks and collects the stations.
    ///
    /// Unknown `after` labels are kept as dangling predecessor ids so that
    /// validation reports them.
    pub fn to_tasks(&self) -> (Vec<Task>, Vec<Resource>) {
        let mut tasks = Vec::new();
        let mut resources: Vec<Resource> = Vec::new();

        for model in &self.models {
            for step in &model.steps {
                if !resources.iter().any(|r| r.id == step.station) {
                    resources.push(Resource::new(&step.station));
                }
            }

            for unit in 0..model.quantity {
                let id = unit_id(&model.name, unit);
                let mut task = Task::new(&id)
                    .with_name(format!("{} unit {unit}", model.name))
                    .with_category(&model.name);
                for (seq, step) in model.steps.iter().enumerate() {
                    let mut activity =
                        Activity::new(step_id(&model.name, unit, &step.label), &id, seq as i32)
                            .with_label(&step.label)
                            .with_duration(step.duration)
                            .on_resource(&step.station);
                    for before in &step.after {
                        activity = activity.with_predecessor(step_id(&model.name, unit, before));
                    }
                    task = task.with_activity(activity);
                }
                tasks.push(task);
            }
        }

        (tasks, resources)
    }

    /// Solves with the Pumpkin CP engine.
    pub fn solve(&self, config: &SolverConfig) -> Result<AssemblyPlan> {
        self.solve_with(&PumpkinSolver::new(), config)
    }

    /// Solves with any CP solver.
    pub fn solve_with<S: CpSolver>(&self, solver: &S, config: &SolverConfig) -> Result<AssemblyPlan> {
        let (tasks, resources) = self.to_tasks();
        let builder = ScheduleCpBuilder::new(&tasks, &resources).with_horizon(self.horizon);
        let (schedule, solution) = builder.solve(solver, config)?;

        if !solution.is_solution_found() {
            return Ok(AssemblyPlan {
                status: solution.status,
                steps: Vec::new(),
                makespan: None,
                lower_bound: solution.lower_bound,
                kpi: None,
            });
        }

        let by_activity: HashMap<&str, (i64, i64)> = schedule
            .assignments
            .iter()
            .map(|a| (a.activity_id.as_str(), (a.start, a.end)))
            .collect();

        let mut steps = Vec::new();
        for model in &self.models {
            for step in &model.steps {
                for unit in 0..model.quantity {
                    let id = step_id(&model.name, unit, &step.label);
                    if let Some(&(start, end)) = by_activity.get(id.as_str()) {
                        steps.push(ScheduledStep {
                            model: model.name.clone(),
                            label: step.label.clone(),
                            unit,
                            station: step.station.clone(),
                            start,
                            end,
                        });
                    }
                }
            }
        }

        Ok(AssemblyPlan {
            status: solution.status,
            steps,
            makespan: Some(schedule.makespan()),
            lower_bound: solution.lower_bound,
            kpi: Some(ScheduleKpi::calculate(&schedule, &tasks)),
        })
    }
}

/// The printed report.
///
/// The header is `Optimal Schedule:` when the solver proved the makespan
/// optimal and `Feasible Schedule:` when a limit stopped it with a schedule
/// that is not proven optimal. Step lines follow in model, step, unit order,
/// then `Makespan: <value>`. Without a schedule the report is the single
/// line `No solution found.`.
impl fmt::Display for AssemblyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = match self.status {
            SolverStatus::Optimal => "Optimal Schedule:",
            SolverStatus::Feasible => "Feasible Schedule:",
            _ => return writeln!(f, "No solution found."),
        };
        writeln!(f, "{header}")?;
        for s in &self.steps {
            writeln!(f, "{} for {} starts at {}", s.label, s.model, s.start)?;
        }
        if let Some(makespan) = self.makespan {
            writeln!(f, "Makespan: {makespan}")?;
        }
        Ok(())
    }
}
