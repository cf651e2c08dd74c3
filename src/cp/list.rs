//! List-scheduling solver for interval models.
//!
//! # Algorithm
//!
//! 1. Build the precedence DAG; a cycle makes the model infeasible.
//! 2. Compute heads (earliest starts along precedence) and, for every
//!    interval, the longest path from its start to the end of an objective
//!    interval. Together with per-resource loads these give a lower bound on
//!    the makespan.
//! 3. Serial schedule generation: repeatedly take the eligible interval
//!    (all predecessors placed) with the highest priority and place it at the
//!    earliest start that respects precedence and fits an idle gap on every
//!    resource it uses.
//! 4. Forward-backward improvement: right-justify against the current
//!    makespan in reverse end order, then left-justify in backward start
//!    order. Repeated while it helps.
//! 5. Randomized passes perturb the priorities with a seeded RNG and keep
//!    the best schedule, until the bound is met or a limit is reached.
//!
//! # Reference
//! - Kolisch & Hartmann (1999), "Heuristic Algorithms for Solving the
//!   Resource-Constrained Project Scheduling Problem"
//! - Valls, Ballestín & Quintanilla (2005), "Justification and RCPSP"

use std::time::{Duration, Instant};

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{Constraint, CpModel, Objective};
use super::solver::{CpSolution, CpSolver, IntervalSolution, SolverConfig, SolverStatus};

/// Priority-rule list scheduler with forward-backward improvement.
///
/// A heuristic fallback for [`PumpkinSolver`](super::PumpkinSolver). It is fast
/// but can only prove optimality when the makespan meets
/// its computed lower bound, which is often not tight. Handles `NoOverlap`
/// and `Precedence` constraints and the `MinimizeMaxEnd` objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListScheduleSolver;

impl ListScheduleSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for ListScheduleSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let clock = Instant::now();

        if let Err(err) = model.validate() {
            debug!("model '{}' rejected: {err}", model.name);
            return CpSolution::empty(SolverStatus::ModelInvalid);
        }

        let Some(instance) = Instance::new(model) else {
            debug!("model '{}' has a precedence cycle", model.name);
            let mut solution = CpSolution::empty(SolverStatus::Infeasible);
            solution.solve_time_ms = elapsed_ms(clock);
            return solution;
        };

        let has_objective = model.objective.is_some();
        let lower_bound = instance.lower_bound();
        let base_key: Vec<f64> = instance.to_end.iter().map(|&q| q as f64).collect();

        let mut best = instance.improve(instance.forward(&base_key));
        let mut best_value = instance.makespan(&best);
        let mut iterations = 1;
        debug!(
            "model '{}': {} intervals, lower bound {lower_bound}, first makespan {best_value}",
            model.name,
            instance.len()
        );

        if has_objective && !config.stop_after_first {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let limit = Duration::from_millis(config.time_limit_ms);

            while best_value > lower_bound
                && iterations < config.max_iterations
                && clock.elapsed() < limit
            {
                iterations += 1;
                let key: Vec<f64> = base_key
                    .iter()
                    .map(|&k| k * rng.random_range(0.8..1.2) + rng.random_range(0.0..1.0))
                    .collect();
                let candidate = instance.improve(instance.forward(&key));
                let value = instance.makespan(&candidate);
                if value < best_value {
                    trace!("pass {iterations}: makespan {best_value} -> {value}");
                    best = candidate;
                    best_value = value;
                }
            }
        }

        let status = if !instance.within_domains(&best) {
            SolverStatus::Unknown
        } else if has_objective && best_value == lower_bound {
            SolverStatus::Optimal
        } else {
            SolverStatus::Feasible
        };

        let intervals = instance
            .names
            .iter()
            .zip(&best)
            .zip(&instance.duration)
            .map(|((name, &start), &duration)| {
                (
                    name.to_string(),
                    IntervalSolution {
                        start,
                        end: start + duration,
                    },
                )
            })
            .collect();

        debug!(
            "model '{}' finished: {status:?}, makespan {best_value}, {iterations} passes",
            model.name
        );

        CpSolution {
            status,
            objective_value: has_objective.then_some(best_value),
            lower_bound: has_objective.then_some(lower_bound),
            intervals,
            iterations,
            solve_time_ms: elapsed_ms(clock),
        }
    }
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Busy periods of one unary resource, sorted by start.
#[derive(Debug, Clone, Default)]
struct Timeline {
    busy: Vec<(i64, i64)>,
}

impl Timeline {
    /// First busy period overlapping `[start, end)`.
    fn conflict(&self, start: i64, end: i64) -> Option<(i64, i64)> {
        self.busy
            .iter()
            .find(|&&(s, e)| s < end && start < e)
            .copied()
    }

    fn insert(&mut self, start: i64, end: i64) {
        let at = self.busy.partition_point(|&(s, _)| s < start);
        self.busy.insert(at, (start, end));
    }
}

/// Index-based view of a validated model.
struct Instance<'a> {
    names: Vec<&'a str>,
    duration: Vec<i64>,
    release: Vec<i64>,
    start_max: Vec<i64>,
    end_max: Vec<i64>,
    preds: Vec<Vec<(usize, i64)>>,
    succs: Vec<Vec<(usize, i64)>>,
    groups: Vec<Vec<usize>>,
    groups_of: Vec<Vec<usize>>,
    targets: Vec<usize>,
    head: Vec<i64>,
    /// Longest path from the start of an interval to the end of a target;
    /// `None` when no target is reachable.
    to_target: Vec<Option<i64>>,
    /// `to_target` with unreachable intervals mapped to their own duration.
    to_end: Vec<i64>,
}

impl<'a> Instance<'a> {
    /// Returns `None` when precedence contains a cycle.
    fn new(model: &'a CpModel) -> Option<Self> {
        let n = model.interval_count();
        let ivs = model.intervals();

        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        let mut groups = Vec::new();
        let mut groups_of = vec![Vec::new(); n];

        // Names were checked by `validate`.
        let pos = |name: &str| model.position(name).unwrap_or_default();

        for constraint in &model.constraints {
            match constraint {
                Constraint::Precedence {
                    before,
                    after,
                    min_delay,
                } => {
                    let (b, a) = (pos(before.as_str()), pos(after.as_str()));
                    preds[a].push((b, *min_delay));
                    succs[b].push((a, *min_delay));
                }
                Constraint::NoOverlap { intervals } => {
                    let mut members: Vec<usize> = intervals.iter().map(|s| pos(s.as_str())).collect();
                    members.sort_unstable();
                    members.dedup();
                    for &m in &members {
                        groups_of[m].push(groups.len());
                    }
                    groups.push(members);
                }
            }
        }

        let topo = topological_order(&preds, &succs)?;

        let targets: Vec<usize> = match &model.objective {
            Some(Objective::MinimizeMaxEnd { intervals }) if !intervals.is_empty() => {
                let mut t: Vec<usize> = intervals.iter().map(|s| pos(s.as_str())).collect();
                t.sort_unstable();
                t.dedup();
                t
            }
            _ => (0..n).collect(),
        };

        let duration: Vec<i64> = ivs.iter().map(|iv| iv.duration).collect();
        let release: Vec<i64> = ivs.iter().map(|iv| iv.start_min).collect();

        let mut head = release.clone();
        for &i in &topo {
            for &(p, delay) in &preds[i] {
                head[i] = head[i].max(head[p] + duration[p] + delay);
            }
        }

        let mut is_target = vec![false; n];
        for &t in &targets {
            is_target[t] = true;
        }
        let mut to_target: Vec<Option<i64>> = vec![None; n];
        for &i in topo.iter().rev() {
            let mut best = is_target[i].then_some(duration[i]);
            for &(s, delay) in &succs[i] {
                if let Some(q) = to_target[s] {
                    let through = duration[i] + delay + q;
                    best = Some(best.map_or(through, |b| b.max(through)));
                }
            }
            to_target[i] = best;
        }
        let to_end = to_target
            .iter()
            .zip(&duration)
            .map(|(q, &d)| q.unwrap_or(d))
            .collect();

        Some(Self {
            names: ivs.iter().map(|iv| iv.name.as_str()).collect(),
            duration,
            release,
            start_max: ivs.iter().map(|iv| iv.start_max).collect(),
            end_max: ivs.iter().map(|iv| iv.end_max).collect(),
            preds,
            succs,
            groups,
            groups_of,
            targets,
            head,
            to_target,
            to_end,
        })
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    /// Critical-path bound combined with one-machine bounds per resource.
    fn lower_bound(&self) -> i64 {
        let path = (0..self.len())
            .filter_map(|i| self.to_target[i].map(|q| self.head[i] + q))
            .max()
            .unwrap_or(0);

        let machines = self
            .groups
            .iter()
            .filter_map(|members| {
                let relevant: Vec<usize> = members
                    .iter()
                    .copied()
                    .filter(|&i| self.to_target[i].is_some())
                    .collect();
                let first = relevant.iter().map(|&i| self.head[i]).min()?;
                let load: i64 = relevant.iter().map(|&i| self.duration[i]).sum();
                let last = relevant
                    .iter()
                    .filter_map(|&i| self.to_target[i].map(|q| q - self.duration[i]))
                    .min()?;
                Some(first + load + last)
            })
            .max()
            .unwrap_or(0);

        path.max(machines)
    }

    fn makespan(&self, starts: &[i64]) -> i64 {
        self.targets
            .iter()
            .map(|&i| starts[i] + self.duration[i])
            .max()
            .unwrap_or(0)
    }

    fn within_domains(&self, starts: &[i64]) -> bool {
        (0..self.len()).all(|i| {
            starts[i] >= self.release[i]
                && starts[i] <= self.start_max[i]
                && starts[i] + self.duration[i] <= self.end_max[i]
        })
    }

    /// Serial forward pass; higher key is placed first among eligible.
    fn forward(&self, key: &[f64]) -> Vec<i64> {
        let n = self.len();
        let mut starts = vec![0; n];
        let mut timelines = vec![Timeline::default(); self.groups.len()];
        let mut waiting: Vec<usize> = self.preds.iter().map(Vec::len).collect();
        let mut eligible: Vec<usize> = (0..n).filter(|&i| waiting[i] == 0).collect();

        while let Some(slot) = pick(&eligible, key) {
            let i = eligible.swap_remove(slot);
            let earliest = self.preds[i]
                .iter()
                .map(|&(p, delay)| starts[p] + self.duration[p] + delay)
                .fold(self.release[i], i64::max);

            let d = self.duration[i];
            let mut t = earliest;
            loop {
                let mut moved = false;
                for &g in &self.groups_of[i] {
                    if let Some((_, end)) = timelines[g].conflict(t, t + d) {
                        t = end;
                        moved = true;
                    }
                }
                if !moved {
                    break;
                }
            }

            starts[i] = t;
            for &g in &self.groups_of[i] {
                timelines[g].insert(t, t + d);
            }
            for &(s, _) in &self.succs[i] {
                waiting[s] -= 1;
                if waiting[s] == 0 {
                    eligible.push(s);
                }
            }
        }

        starts
    }

    /// Serial backward pass against `deadline`; higher key is placed first
    /// among intervals whose successors are all placed.
    fn backward(&self, key: &[f64], deadline: i64) -> Vec<i64> {
        let n = self.len();
        let mut starts = vec![0; n];
        let mut timelines = vec![Timeline::default(); self.groups.len()];
        let mut waiting: Vec<usize> = self.succs.iter().map(Vec::len).collect();
        let mut eligible: Vec<usize> = (0..n).filter(|&i| waiting[i] == 0).collect();

        while let Some(slot) = pick(&eligible, key) {
            let i = eligible.swap_remove(slot);
            let latest_end = self.succs[i]
                .iter()
                .map(|&(s, delay)| starts[s] - delay)
                .fold(deadline, i64::min);

            let d = self.duration[i];
            let mut t = latest_end - d;
            loop {
                let mut moved = false;
                for &g in &self.groups_of[i] {
                    if let Some((start, _)) = timelines[g].conflict(t, t + d) {
                        t = start - d;
                        moved = true;
                    }
                }
                if !moved {
                    break;
                }
            }

            starts[i] = t;
            for &g in &self.groups_of[i] {
                timelines[g].insert(t, t + d);
            }
            for &(p, _) in &self.preds[i] {
                waiting[p] -= 1;
                if waiting[p] == 0 {
                    eligible.push(p);
                }
            }
        }

        starts
    }

    /// Forward-backward improvement, repeated while the makespan drops.
    fn improve(&self, mut starts: Vec<i64>) -> Vec<i64> {
        let mut value = self.makespan(&starts);
        for _ in 0..8 {
            let deadline = (0..self.len())
                .map(|i| starts[i] + self.duration[i])
                .max()
                .unwrap_or(0);
            let by_end: Vec<f64> = (0..self.len())
                .map(|i| (starts[i] + self.duration[i]) as f64)
                .collect();
            let right = self.backward(&by_end, deadline);
            let by_start: Vec<f64> = right.iter().map(|&s| -(s as f64)).collect();
            let left = self.forward(&by_start);

            let next = self.makespan(&left);
            if next >= value {
                break;
            }
            starts = left;
            value = next;
        }
        starts
    }
}

/// Index into `eligible` of the highest key; ties go to the lower interval.
fn pick(eligible: &[usize], key: &[f64]) -> Option<usize> {
    eligible
        .iter()
        .enumerate()
        .max_by(|&(_, &a), &(_, &b)| key[a].total_cmp(&key[b]).then(b.cmp(&a)))
        .map(|(slot, _)| slot)
}

/// Kahn's algorithm; `None` on a cycle.
fn topological_order(preds: &[Vec<(usize, i64)>], succs: &[Vec<(usize, i64)>]) -> Option<Vec<usize>> {
    let n = preds.len();
    let mut indegree: Vec<usize> = preds.iter().map(Vec::len).collect();
    let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = ready.pop() {
        order.push(i);
        for &(s, _) in &succs[i] {
            indegree[s] -= 1;
            if indegree[s] == 0 {
                ready.push(s);
            }
        }
    }

    (order.len() == n).then_some(order)
}
