//! Small CP-SAT style constraint solver.
//!
//! Exposes the modelling surface the schedule generator needs: boolean and
//! bounded integer variables, linear constraints, max-equality,
//! abs-equality and weighted minimization. Solving is a deterministic
//! depth-first branch-and-bound with bounds propagation, a wall-clock
//! budget and cooperative cancellation.

mod search;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bounds used in place of open-ended linear constraints. Kept well inside
/// `i64` so propagation arithmetic cannot overflow.
pub(crate) const NEG_INF: i64 = i64::MIN / 4;
pub(crate) const POS_INF: i64 = i64::MAX / 4;

/// Handle to a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntVar(pub(crate) usize);

/// Integer linear expression `sum(coeff * var) + constant`.
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    pub(crate) terms: Vec<(IntVar, i64)>,
    pub(crate) constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum<I: IntoIterator<Item = IntVar>>(vars: I) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.push(var, 1);
        }
        expr
    }

    pub fn push(&mut self, var: IntVar, coeff: i64) {
        if coeff != 0 {
            self.terms.push((var, coeff));
        }
    }

    pub fn term(mut self, var: IntVar, coeff: i64) -> Self {
        self.push(var, coeff);
        self
    }

    pub fn offset(mut self, constant: i64) -> Self {
        self.constant += constant;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl From<IntVar> for LinearExpr {
    fn from(var: IntVar) -> Self {
        LinearExpr::new().term(var, 1)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Constraint {
    /// `lo <= expr <= hi`
    Linear { expr: LinearExpr, lo: i64, hi: i64 },
    /// `target == max(vars)`
    MaxEquality { target: IntVar, vars: Vec<IntVar> },
    /// `target == |expr|`
    AbsEquality { target: IntVar, expr: LinearExpr },
}

/// Incrementally built constraint model.
#[derive(Debug, Default)]
pub struct CpModelBuilder {
    pub(crate) domains: Vec<(i64, i64)>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective: Option<LinearExpr>,
    pub(crate) hints: std::collections::HashMap<usize, i64>,
}

impl CpModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool_var(&mut self) -> IntVar {
        self.new_int_var(0, 1)
    }

    pub fn new_int_var(&mut self, lo: i64, hi: i64) -> IntVar {
        self.domains.push((lo, hi));
        IntVar(self.domains.len() - 1)
    }

    pub fn var_count(&self) -> usize {
        self.domains.len()
    }

    pub fn add_linear(&mut self, expr: LinearExpr, lo: i64, hi: i64) {
        self.constraints.push(Constraint::Linear { expr, lo, hi });
    }

    pub fn add_eq(&mut self, expr: LinearExpr, value: i64) {
        self.add_linear(expr, value, value);
    }

    pub fn add_le(&mut self, expr: LinearExpr, upper: i64) {
        self.add_linear(expr, NEG_INF, upper);
    }

    pub fn add_ge(&mut self, expr: LinearExpr, lower: i64) {
        self.add_linear(expr, lower, POS_INF);
    }

    pub fn add_max_equality(&mut self, target: IntVar, vars: &[IntVar]) {
        self.constraints.push(Constraint::MaxEquality {
            target,
            vars: vars.to_vec(),
        });
    }

    pub fn add_abs_equality(&mut self, target: IntVar, expr: LinearExpr) {
        self.constraints.push(Constraint::AbsEquality { target, expr });
    }

    pub fn minimize(&mut self, objective: LinearExpr) {
        self.objective = Some(objective);
    }

    /// Suggest a value the search should try first for `var`. Hints steer
    /// branching order only; they never constrain the model.
    pub fn add_hint(&mut self, var: IntVar, value: i64) {
        self.hints.insert(var.0, value);
    }
}

/// Cooperative cancellation flag shared with the host.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    ModelInvalid,
    Unknown,
}

impl SolveStatus {
    pub fn is_feasible(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::ModelInvalid => "MODEL_INVALID",
            SolveStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct SolverParameters {
    /// Wall-clock budget for one solve.
    pub max_time: Duration,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            max_time: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
pub struct CpSolver {
    pub parameters: SolverParameters,
}

impl CpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solve(&self, model: &CpModelBuilder, cancel: &CancelToken) -> SolveResult {
        search::run(model, self.parameters.max_time, cancel)
    }
}

/// Outcome of a solve. `values` is empty unless the status is feasible.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective_value: Option<i64>,
    pub(crate) values: Vec<i64>,
}

impl SolveResult {
    pub fn value(&self, var: IntVar) -> i64 {
        self.values[var.0]
    }

    pub fn bool_value(&self, var: IntVar) -> bool {
        self.value(var) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(model: &CpModelBuilder) -> SolveResult {
        CpSolver::new().solve(model, &CancelToken::new())
    }

    #[test]
    fn test_satisfaction_problem() {
        let mut model = CpModelBuilder::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        model.add_eq(LinearExpr::sum([a, b]), 1);
        model.add_le(LinearExpr::from(a), 0);

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert!(!result.bool_value(a));
        assert!(result.bool_value(b));
    }

    #[test]
    fn test_infeasible_equality() {
        let mut model = CpModelBuilder::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        model.add_eq(LinearExpr::sum([a, b]), 3);

        assert_eq!(solve(&model).status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_minimization_finds_optimum() {
        // Pick exactly two of three weighted booleans, minimising cost.
        let mut model = CpModelBuilder::new();
        let vars: Vec<_> = (0..3).map(|_| model.new_bool_var()).collect();
        model.add_eq(LinearExpr::sum(vars.iter().copied()), 2);
        let cost = LinearExpr::new()
            .term(vars[0], 5)
            .term(vars[1], 1)
            .term(vars[2], 3);
        model.minimize(cost);

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.objective_value, Some(4));
        assert!(!result.bool_value(vars[0]));
        assert!(result.bool_value(vars[1]));
        assert!(result.bool_value(vars[2]));
    }

    #[test]
    fn test_max_equality_links_day_usage() {
        let mut model = CpModelBuilder::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        let works = model.new_bool_var();
        model.add_max_equality(works, &[a, b]);
        model.add_eq(LinearExpr::from(a), 1);
        model.add_eq(LinearExpr::from(b), 0);

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert!(result.bool_value(works));
    }

    #[test]
    fn test_abs_equality_deviation() {
        let mut model = CpModelBuilder::new();
        let count = model.new_int_var(0, 10);
        let dev = model.new_int_var(0, 10);
        model.add_eq(LinearExpr::from(count), 3);
        // dev == |count - 5|
        model.add_abs_equality(dev, LinearExpr::new().term(count, 1).offset(-5));

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.value(dev), 2);
    }

    #[test]
    fn test_hint_steers_symmetric_choice() {
        let mut model = CpModelBuilder::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        model.add_eq(LinearExpr::sum([a, b]), 1);
        model.add_hint(a, 0);

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert!(!result.bool_value(a));
        assert!(result.bool_value(b));
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut model = CpModelBuilder::new();
        let a = model.new_bool_var();
        model.add_eq(LinearExpr::from(a), 1);

        let token = CancelToken::new();
        token.cancel();
        let result = CpSolver::new().solve(&model, &token);
        assert_eq!(result.status, SolveStatus::Unknown);
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let mut model = CpModelBuilder::new();
        model.new_int_var(5, 2);
        assert_eq!(solve(&model).status, SolveStatus::ModelInvalid);
    }
}
