//! Depth-first branch-and-bound with bounds propagation.

use std::time::{Duration, Instant};

use super::{
    CancelToken, Constraint, CpModelBuilder, LinearExpr, SolveResult, SolveStatus, NEG_INF,
    POS_INF,
};

type Domains = Vec<(i64, i64)>;

#[derive(Debug)]
struct Conflict;

#[derive(PartialEq)]
enum Stop {
    None,
    Exhausted,
    Deadline,
    Cancelled,
}

struct Search<'a> {
    model: &'a CpModelBuilder,
    deadline: Instant,
    cancel: &'a CancelToken,
    stop: Stop,
    /// Best objective found so far; the next incumbent must beat it.
    best_objective: Option<i64>,
    best_values: Option<Vec<i64>>,
}

pub(super) fn run(model: &CpModelBuilder, budget: Duration, cancel: &CancelToken) -> SolveResult {
    if !validate(model) {
        return SolveResult {
            status: SolveStatus::ModelInvalid,
            objective_value: None,
            values: Vec::new(),
        };
    }

    let mut search = Search {
        model,
        deadline: Instant::now() + budget,
        cancel,
        stop: Stop::None,
        best_objective: None,
        best_values: None,
    };
    search.explore(model.domains.clone());

    let interrupted = matches!(search.stop, Stop::Deadline);
    if search.stop == Stop::Cancelled {
        // Cancellation discards partial results.
        return SolveResult {
            status: SolveStatus::Unknown,
            objective_value: None,
            values: Vec::new(),
        };
    }

    match search.best_values {
        Some(values) => SolveResult {
            status: if interrupted {
                SolveStatus::Feasible
            } else {
                SolveStatus::Optimal
            },
            objective_value: search
                .model
                .objective
                .as_ref()
                .map(|obj| evaluate(obj, &values)),
            values,
        },
        None => SolveResult {
            status: if interrupted {
                SolveStatus::Unknown
            } else {
                SolveStatus::Infeasible
            },
            objective_value: None,
            values: Vec::new(),
        },
    }
}

fn validate(model: &CpModelBuilder) -> bool {
    let n = model.domains.len();
    if model
        .domains
        .iter()
        .any(|&(lo, hi)| lo > hi || lo < NEG_INF || hi > POS_INF)
    {
        return false;
    }
    let expr_ok = |expr: &LinearExpr| expr.terms.iter().all(|(var, _)| var.0 < n);
    model.constraints.iter().all(|constraint| match constraint {
        Constraint::Linear { expr, lo, hi } => expr_ok(expr) && lo <= hi,
        Constraint::MaxEquality { target, vars } => {
            target.0 < n && !vars.is_empty() && vars.iter().all(|var| var.0 < n)
        }
        Constraint::AbsEquality { target, expr } => target.0 < n && expr_ok(expr),
    }) && model.objective.as_ref().map_or(true, expr_ok)
}

impl Search<'_> {
    fn should_stop(&mut self) -> bool {
        if self.stop != Stop::None {
            return true;
        }
        if self.cancel.is_cancelled() {
            self.stop = Stop::Cancelled;
            return true;
        }
        if Instant::now() >= self.deadline {
            self.stop = Stop::Deadline;
            return true;
        }
        false
    }

    fn explore(&mut self, mut domains: Domains) {
        if self.should_stop() {
            return;
        }
        if propagate(self.model, &mut domains, self.best_objective).is_err() {
            return;
        }

        let unfixed = domains.iter().position(|&(lo, hi)| lo < hi);
        let Some(index) = unfixed else {
            self.record_solution(&domains);
            return;
        };

        let (lo, hi) = domains[index];
        if hi - lo == 1 {
            // Binary domain: a hinted value wins, otherwise the upper value
            // first reaches the coverage equalities sooner.
            let first = match self.model.hints.get(&index) {
                Some(&hint) if hint == lo || hint == hi => hint,
                _ => hi,
            };
            for value in [first, lo + hi - first] {
                let mut child = domains.clone();
                child[index] = (value, value);
                self.explore(child);
                if self.stop != Stop::None {
                    return;
                }
            }
        } else {
            let mid = lo + (hi - lo) / 2;
            for bounds in [(lo, mid), (mid + 1, hi)] {
                let mut child = domains.clone();
                child[index] = bounds;
                self.explore(child);
                if self.stop != Stop::None {
                    return;
                }
            }
        }
    }

    fn record_solution(&mut self, domains: &Domains) {
        let values: Vec<i64> = domains.iter().map(|&(lo, _)| lo).collect();
        match &self.model.objective {
            Some(objective) => {
                let objective_value = evaluate(objective, &values);
                let improved = self
                    .best_objective
                    .map_or(true, |best| objective_value < best);
                if improved {
                    self.best_objective = Some(objective_value);
                    self.best_values = Some(values);
                }
            }
            None => {
                // Satisfaction problem: the first solution is final.
                self.best_values = Some(values);
                self.stop = Stop::Exhausted;
            }
        }
    }
}

fn evaluate(expr: &LinearExpr, values: &[i64]) -> i64 {
    expr.constant
        + expr
            .terms
            .iter()
            .map(|&(var, coeff)| coeff * values[var.0])
            .sum::<i64>()
}

/// Tighten all domains to a fixpoint; `Err` on a proven conflict.
fn propagate(
    model: &CpModelBuilder,
    domains: &mut Domains,
    best_objective: Option<i64>,
) -> Result<(), Conflict> {
    loop {
        let mut changed = false;
        for constraint in &model.constraints {
            changed |= match constraint {
                Constraint::Linear { expr, lo, hi } => prop_linear(domains, expr, *lo, *hi)?,
                Constraint::MaxEquality { target, vars } => prop_max(domains, *target, vars)?,
                Constraint::AbsEquality { target, expr } => prop_abs(domains, *target, expr)?,
            };
        }
        if let (Some(best), Some(objective)) = (best_objective, model.objective.as_ref()) {
            // Branch-and-bound cut: only strictly better solutions count.
            changed |= prop_linear(domains, objective, NEG_INF, best - 1)?;
        }
        if !changed {
            return Ok(());
        }
    }
}

/// Bounds of `expr` under the current domains.
fn expr_bounds(domains: &Domains, expr: &LinearExpr) -> (i64, i64) {
    let mut min = expr.constant;
    let mut max = expr.constant;
    for &(var, coeff) in &expr.terms {
        let (lo, hi) = domains[var.0];
        if coeff > 0 {
            min += coeff * lo;
            max += coeff * hi;
        } else {
            min += coeff * hi;
            max += coeff * lo;
        }
    }
    (min, max)
}

fn tighten(domains: &mut Domains, index: usize, lo: i64, hi: i64) -> Result<bool, Conflict> {
    let (cur_lo, cur_hi) = domains[index];
    let new_lo = cur_lo.max(lo);
    let new_hi = cur_hi.min(hi);
    if new_lo > new_hi {
        return Err(Conflict);
    }
    domains[index] = (new_lo, new_hi);
    Ok(new_lo != cur_lo || new_hi != cur_hi)
}

fn prop_linear(
    domains: &mut Domains,
    expr: &LinearExpr,
    lo: i64,
    hi: i64,
) -> Result<bool, Conflict> {
    let (sum_min, sum_max) = expr_bounds(domains, expr);
    if sum_min > hi || sum_max < lo {
        return Err(Conflict);
    }

    let mut changed = false;
    for &(var, coeff) in &expr.terms {
        let (var_lo, var_hi) = domains[var.0];
        let (term_min, term_max) = if coeff > 0 {
            (coeff * var_lo, coeff * var_hi)
        } else {
            (coeff * var_hi, coeff * var_lo)
        };
        // Bounds on coeff * var once the rest of the sum is accounted for.
        let cx_lo = lo - (sum_max - term_max);
        let cx_hi = hi - (sum_min - term_min);
        let (new_lo, new_hi) = if coeff > 0 {
            (div_ceil(cx_lo, coeff), div_floor(cx_hi, coeff))
        } else {
            (div_ceil(cx_hi, coeff), div_floor(cx_lo, coeff))
        };
        changed |= tighten(domains, var.0, new_lo, new_hi)?;
    }
    Ok(changed)
}

fn prop_max(
    domains: &mut Domains,
    target: super::IntVar,
    vars: &[super::IntVar],
) -> Result<bool, Conflict> {
    let max_of_los = vars.iter().map(|var| domains[var.0].0).max().unwrap_or(0);
    let max_of_his = vars.iter().map(|var| domains[var.0].1).max().unwrap_or(0);

    let mut changed = tighten(domains, target.0, max_of_los, max_of_his)?;
    let target_hi = domains[target.0].1;
    for var in vars {
        changed |= tighten(domains, var.0, NEG_INF, target_hi)?;
    }
    Ok(changed)
}

fn prop_abs(
    domains: &mut Domains,
    target: super::IntVar,
    expr: &LinearExpr,
) -> Result<bool, Conflict> {
    let (expr_min, expr_max) = expr_bounds(domains, expr);
    let abs_lo = if expr_min > 0 {
        expr_min
    } else if expr_max < 0 {
        -expr_max
    } else {
        0
    };
    let abs_hi = expr_min.abs().max(expr_max.abs());

    let mut changed = tighten(domains, target.0, abs_lo, abs_hi)?;
    let (target_lo, target_hi) = domains[target.0];

    // expr is confined to [-hi, hi]; when its sign is known the target's
    // lower bound transfers as well.
    let (expr_lo, expr_hi) = if expr_min >= 0 {
        (target_lo, target_hi)
    } else if expr_max <= 0 {
        (-target_hi, -target_lo)
    } else {
        (-target_hi, target_hi)
    };
    changed |= prop_linear(domains, expr, expr_lo, expr_hi)?;
    Ok(changed)
}

fn div_floor(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn div_ceil(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) == (b < 0)) {
        q + 1
    } else {
        q
    }
}
