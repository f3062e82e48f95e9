//! # In-Process Branch-and-Bound
//!
//! An exact depth-first search over bounded integer domains.
//!
//! Every node runs bound propagation on all linear rows touched by the last
//! domain change. Domain changes are recorded on a trail and undone on
//! backtrack. The objective is handled as one more row, `c·x <= best - 1`,
//! whose right-hand side tightens at every incumbent, so propagation does the
//! bounding.
//!
//! All arithmetic is integer; activities are accumulated in `i128`.

use super::descriptor::SolverOptions;
use super::{BackendLocation, BackendSolution, BackendStatus, MilpBackend, RunOptions};
use crate::GraphCalcError;
use crate::model::{Direction, IlpModel, Sense};
use crate::primitives::CHECK_INTERVAL;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Options understood by this backend.
const KNOWN_OPTIONS: [&str; 1] = ["node_limit"];

/// The in-process backend. Single-threaded; `threads` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchAndBound {
    node_limit: Option<u64>,
}

impl BranchAndBound {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from backend options. Only `node_limit` (non-negative integer) is accepted.
    pub fn from_options(options: &SolverOptions) -> Result<Self, GraphCalcError> {
        if let Some((key, _)) = options.iter().find(|(k, _)| !KNOWN_OPTIONS.contains(k)) {
            return Err(GraphCalcError::MalformedDescriptor(format!(
                "unknown option '{}' for backend bnb",
                key
            )));
        }
        let node_limit = match options.get_int("node_limit")? {
            None => None,
            Some(limit) if limit >= 0 => Some(limit as u64),
            Some(limit) => {
                return Err(GraphCalcError::MalformedDescriptor(format!(
                    "node_limit must be non-negative, got {}",
                    limit
                )));
            }
        };
        Ok(Self { node_limit })
    }

    #[must_use]
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

impl MilpBackend for BranchAndBound {
    fn name(&self) -> &str {
        "bnb"
    }

    fn location(&self) -> BackendLocation {
        BackendLocation::InProcess
    }

    fn solve(
        &self,
        model: &IlpModel,
        run: &RunOptions,
    ) -> Result<BackendSolution, GraphCalcError> {
        let started = Instant::now();
        let mut search = Search::new(model, self.node_limit, run.time_limit);
        let reason = search.run();

        let status = match (reason, search.incumbent.is_some()) {
            (Termination::Exhausted, true) => BackendStatus::Optimal,
            (Termination::Exhausted, false) => BackendStatus::Infeasible,
            (_, true) => BackendStatus::LimitWithIncumbent,
            (_, false) => BackendStatus::LimitWithoutIncumbent,
        };

        let mut log = vec![format!(
            "bnb: {} variables, {} rows, {} nodes, {:?} after {} ms",
            model.num_variables(),
            model.constraints().len(),
            search.nodes,
            reason,
            started.elapsed().as_millis()
        )];

        let Some((_, values)) = search.incumbent else {
            return Ok(BackendSolution::without_values(status, log));
        };
        let objective = model.objective_value(&values);
        log.push(format!("bnb: incumbent objective {}", objective));

        Ok(BackendSolution {
            status,
            objective: Some(objective as f64),
            values: values.iter().map(|v| *v as f64).collect(),
            log,
        })
    }
}

// =============================================================================
// SEARCH STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Exhausted,
    TimeLimit,
    NodeLimit,
}

/// `Σ a_j x_j <= rhs`.
#[derive(Debug, Clone)]
struct Row {
    terms: Vec<(usize, i64)>,
    rhs: i128,
}

struct Search {
    rows: Vec<Row>,
    /// Row indices each variable appears in.
    var_rows: Vec<Vec<usize>>,
    lower: Vec<i64>,
    upper: Vec<i64>,
    /// (variable, previous lower, previous upper)
    trail: Vec<(usize, i64, i64)>,
    /// Objective coefficients of the minimization form.
    cost: Vec<i64>,
    cut_row: usize,
    incumbent: Option<(i128, Vec<i64>)>,
    nodes: u64,
    node_limit: Option<u64>,
    time_limit: Option<Duration>,
    started: Instant,
    since_check: u64,
    stopped: Option<Termination>,
}

impl Search {
    fn new(model: &IlpModel, node_limit: Option<u64>, time_limit: Option<Duration>) -> Self {
        let n = model.num_variables();
        let mut rows = Vec::with_capacity(model.constraints().len() + 1);
        for constraint in model.constraints() {
            let terms: Vec<(usize, i64)> = constraint
                .expr
                .terms()
                .map(|(var, a)| (var.index(), a))
                .collect();
            let negated = || terms.iter().map(|(j, a)| (*j, -a)).collect::<Vec<_>>();
            let rhs = i128::from(constraint.rhs);
            match constraint.sense {
                Sense::LessEq => rows.push(Row {
                    terms: terms.clone(),
                    rhs,
                }),
                Sense::GreaterEq => rows.push(Row {
                    terms: negated(),
                    rhs: -rhs,
                }),
                Sense::Equal => {
                    rows.push(Row {
                        terms: terms.clone(),
                        rhs,
                    });
                    rows.push(Row {
                        terms: negated(),
                        rhs: -rhs,
                    });
                }
            }
        }

        let sign = match model.objective().direction {
            Direction::Minimize => 1,
            Direction::Maximize => -1,
        };
        let mut cost = vec![0; n];
        for (var, c) in model.objective().expr.terms() {
            cost[var.index()] = sign * c;
        }
        let cut_row = rows.len();
        rows.push(Row {
            terms: cost
                .iter()
                .enumerate()
                .filter(|(_, c)| **c != 0)
                .map(|(j, c)| (j, *c))
                .collect(),
            rhs: i128::MAX / 4,
        });

        let mut var_rows = vec![Vec::new(); n];
        for (r, row) in rows.iter().enumerate() {
            for (j, _) in &row.terms {
                var_rows[*j].push(r);
            }
        }

        Self {
            rows,
            var_rows,
            lower: model.variables().iter().map(|v| v.lower).collect(),
            upper: model.variables().iter().map(|v| v.upper).collect(),
            trail: Vec::new(),
            cost,
            cut_row,
            incumbent: None,
            nodes: 0,
            node_limit,
            time_limit,
            started: Instant::now(),
            since_check: 0,
            stopped: None,
        }
    }

    fn run(&mut self) -> Termination {
        let all_rows: Vec<usize> = (0..self.rows.len()).collect();
        if self.propagate(all_rows) {
            self.descend();
        }
        self.undo(0);
        self.stopped.unwrap_or(Termination::Exhausted)
    }

    fn descend(&mut self) {
        if self.should_stop() {
            return;
        }
        self.nodes += 1;

        let Some(j) = (0..self.lower.len()).find(|&j| self.lower[j] < self.upper[j]) else {
            self.record_incumbent();
            return;
        };

        let (lo, hi) = (self.lower[j], self.upper[j]);
        // Raising a variable with negative cost improves the objective.
        let branches = if self.cost[j] < 0 {
            [(hi, hi), (lo, hi - 1)]
        } else {
            [(lo, lo), (lo + 1, hi)]
        };

        for (branch_lo, branch_hi) in branches {
            let mark = self.trail.len();
            let mut seeds = self.var_rows[j].clone();
            seeds.push(self.cut_row);
            if self.set_bounds(j, branch_lo, branch_hi) && self.propagate(seeds) {
                self.descend();
            }
            self.undo(mark);
            if self.stopped.is_some() {
                return;
            }
        }
    }

    fn should_stop(&mut self) -> bool {
        if self.stopped.is_some() {
            return true;
        }
        if self.node_limit.is_some_and(|limit| self.nodes >= limit) {
            self.stopped = Some(Termination::NodeLimit);
            return true;
        }
        self.since_check += 1;
        if self.since_check >= CHECK_INTERVAL {
            self.since_check = 0;
            if self
                .time_limit
                .is_some_and(|limit| self.started.elapsed() > limit)
            {
                self.stopped = Some(Termination::TimeLimit);
                return true;
            }
        }
        false
    }

    fn record_incumbent(&mut self) {
        let values = self.lower.clone();
        let objective: i128 = self
            .cost
            .iter()
            .zip(&values)
            .map(|(c, v)| i128::from(*c) * i128::from(*v))
            .sum();
        if self
            .incumbent
            .as_ref()
            .is_none_or(|(best, _)| objective < *best)
        {
            tracing::trace!(objective = %objective, nodes = self.nodes, "bnb incumbent");
            self.rows[self.cut_row].rhs = objective - 1;
            self.incumbent = Some((objective, values));
        }
    }

    /// Intersect the domain of `j` with `[lo, hi]`, recording the old domain.
    fn set_bounds(&mut self, j: usize, lo: i64, hi: i64) -> bool {
        let new_lo = lo.max(self.lower[j]);
        let new_hi = hi.min(self.upper[j]);
        if new_lo > new_hi {
            return false;
        }
        if new_lo != self.lower[j] || new_hi != self.upper[j] {
            self.trail.push((j, self.lower[j], self.upper[j]));
            self.lower[j] = new_lo;
            self.upper[j] = new_hi;
        }
        true
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some((j, lo, hi)) = self.trail.pop() {
                self.lower[j] = lo;
                self.upper[j] = hi;
            }
        }
    }

    /// Propagate rows to a fixed point. Returns `false` on conflict.
    fn propagate(&mut self, seeds: Vec<usize>) -> bool {
        let mut queued = vec![false; self.rows.len()];
        let mut queue = VecDeque::new();
        for r in seeds {
            if !queued[r] {
                queued[r] = true;
                queue.push_back(r);
            }
        }

        while let Some(r) = queue.pop_front() {
            queued[r] = false;
            let Some(changed) = self.propagate_row(r) else {
                return false;
            };
            for j in changed {
                for &other in &self.var_rows[j] {
                    if !queued[other] {
                        queued[other] = true;
                        queue.push_back(other);
                    }
                }
            }
        }
        true
    }

    /// Tighten the domains of one row. `None` means the row cannot be satisfied.
    fn propagate_row(&mut self, r: usize) -> Option<Vec<usize>> {
        let min_contribution = |a: i64, lo: i64, hi: i64| -> i128 {
            if a > 0 {
                i128::from(a) * i128::from(lo)
            } else {
                i128::from(a) * i128::from(hi)
            }
        };

        let row = &self.rows[r];
        let activity: i128 = row
            .terms
            .iter()
            .map(|(j, a)| min_contribution(*a, self.lower[*j], self.upper[*j]))
            .sum();
        if activity > row.rhs {
            return None;
        }

        let mut tightenings = Vec::new();
        for &(j, a) in &row.terms {
            let (lo, hi) = (self.lower[j], self.upper[j]);
            let residual = row.rhs - (activity - min_contribution(a, lo, hi));
            let a = i128::from(a);
            if a > 0 {
                let bound = residual.div_euclid(a);
                if bound < i128::from(hi) {
                    tightenings.push((j, lo, bound as i64));
                }
            } else {
                // a·x <= residual with a < 0  =>  x >= ceil(-residual / -a)
                let bound = ceil_div(-residual, -a);
                if bound > i128::from(lo) {
                    tightenings.push((j, bound as i64, hi));
                }
            }
        }

        let mut changed = Vec::with_capacity(tightenings.len());
        for (j, lo, hi) in tightenings {
            if !self.set_bounds(j, lo, hi) {
                return None;
            }
            changed.push(j);
        }
        Some(changed)
    }
}

/// Ceiling of `n / d` for `d > 0`.
fn ceil_div(n: i128, d: i128) -> i128 {
    -((-n).div_euclid(d))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearExpr, VarTag, WitnessKind};

    fn solve(model: &IlpModel) -> BackendSolution {
        BranchAndBound::new()
            .solve(model, &RunOptions::default())
            .expect("solve")
    }

    #[test]
    fn knapsack_optimum() {
        // max 5a + 4b + 3c  s.t.  2a + 3b + c <= 4
        let mut model = IlpModel::new("knapsack", Direction::Maximize, WitnessKind::None);
        let a = model.add_binary("a", VarTag::Auxiliary);
        let b = model.add_binary("b", VarTag::Auxiliary);
        let c = model.add_binary("c", VarTag::Auxiliary);
        model.add_constraint(
            "cap",
            LinearExpr::new().with_term(a, 2).with_term(b, 3).with_term(c, 1),
            Sense::LessEq,
            4,
        );
        model.add_objective_term(a, 5);
        model.add_objective_term(b, 4);
        model.add_objective_term(c, 3);

        let solution = solve(&model);
        assert_eq!(solution.status, BackendStatus::Optimal);
        assert_eq!(solution.objective, Some(8.0));
        assert_eq!(solution.values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn general_integer_minimization() {
        // min x + y  s.t.  2x + 3y >= 12, x, y in [0, 10]
        let mut model = IlpModel::new("cover", Direction::Minimize, WitnessKind::None);
        let x = model.add_integer("x", 0, 10, VarTag::Auxiliary).expect("x");
        let y = model.add_integer("y", 0, 10, VarTag::Auxiliary).expect("y");
        model.add_constraint(
            "demand",
            LinearExpr::new().with_term(x, 2).with_term(y, 3),
            Sense::GreaterEq,
            12,
        );
        model.add_objective_term(x, 1);
        model.add_objective_term(y, 1);

        let solution = solve(&model);
        assert_eq!(solution.status, BackendStatus::Optimal);
        assert_eq!(solution.objective, Some(4.0));
    }

    #[test]
    fn equality_rows_and_infeasibility() {
        let mut model = IlpModel::new("parity", Direction::Minimize, WitnessKind::None);
        let x = model.add_binary("x", VarTag::Auxiliary);
        let y = model.add_binary("y", VarTag::Auxiliary);
        model.add_constraint("one", LinearExpr::sum([x, y]), Sense::Equal, 1);
        model.add_constraint("both", LinearExpr::sum([x, y]), Sense::GreaterEq, 2);

        let solution = solve(&model);
        assert_eq!(solution.status, BackendStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn node_limit_reports_limit_status() {
        let mut model = IlpModel::new("free", Direction::Maximize, WitnessKind::None);
        for i in 0..12 {
            let x = model.add_binary(format!("x{}", i), VarTag::Auxiliary);
            model.add_objective_term(x, 1);
        }
        let backend = BranchAndBound::new().with_node_limit(0);
        let solution = backend
            .solve(&model, &RunOptions::default())
            .expect("solve");
        assert_eq!(solution.status, BackendStatus::LimitWithoutIncumbent);
    }

    #[test]
    fn options_are_validated() {
        let ok = SolverOptions::new().with("node_limit", 5);
        assert_eq!(
            BranchAndBound::from_options(&ok).expect("options"),
            BranchAndBound::new().with_node_limit(5)
        );
        let unknown = SolverOptions::new().with("ratioGap", 1);
        assert!(BranchAndBound::from_options(&unknown).is_err());
        let negative = SolverOptions::new().with("node_limit", -1);
        assert!(BranchAndBound::from_options(&negative).is_err());
    }

    #[test]
    fn search_leaves_trail_empty() {
        let mut model = IlpModel::new("trail", Direction::Maximize, WitnessKind::None);
        let x = model.add_binary("x", VarTag::Auxiliary);
        let y = model.add_binary("y", VarTag::Auxiliary);
        model.add_constraint("pack", LinearExpr::sum([x, y]), Sense::LessEq, 1);
        model.add_objective_term(x, 1);
        model.add_objective_term(y, 1);

        let mut search = Search::new(&model, None, None);
        assert_eq!(search.run(), Termination::Exhausted);
        assert!(search.trail.is_empty());
        assert_eq!(search.lower, vec![0, 0]);
        assert_eq!(search.upper, vec![1, 1]);
    }
}
