// Shared MIP plumbing: decision-variable tables, expression helpers, solver
// status mapping and the time-limited microlp solve.

use good_lp::solvers::microlp::MicroLpSolution;
use good_lp::{
    microlp, Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus,
    SolverModel, Variable, VariableDefinition, WithTimeLimit,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use gaffer_core::AssetId;

use crate::validate::InputError;

// ---------------------------------------------------------------------------
// Status and errors
// ---------------------------------------------------------------------------

/// Terminal status of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimeLimit,
    SolverError,
}

impl SolveStatus {
    /// Stable display string, printed verbatim by the reporter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::TimeLimit => "Time limit reached",
            SolveStatus::SolverError => "Solver error",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// Rejected by precondition checks; no model was built.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The solver finished without an optimal assignment. No plan exists.
    #[error("MIP status: {status}{}", detail_suffix(.detail))]
    NotOptimal { status: SolveStatus, detail: String },
}

impl SolveError {
    /// Solver status for this error. Rejected input never reached the solver.
    pub fn status(&self) -> Option<SolveStatus> {
        match self {
            SolveError::InvalidInput(_) => None,
            SolveError::NotOptimal { status, .. } => Some(*status),
        }
    }

    fn not_optimal(status: SolveStatus, detail: impl Into<String>) -> Self {
        SolveError::NotOptimal {
            status,
            detail: detail.into(),
        }
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    }
}

impl From<ResolutionError> for SolveError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => SolveError::not_optimal(SolveStatus::Infeasible, ""),
            ResolutionError::Unbounded => SolveError::not_optimal(SolveStatus::Unbounded, ""),
            other => SolveError::not_optimal(SolveStatus::SolverError, other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Secondary objective used to choose among equally scored optima.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Whatever vertex the solver's branching order lands on.
    #[default]
    SolverDefault,
    /// Prefer lower asset ids among equal-score choices.
    LowestId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveOptions {
    /// Time limit handed to the MIP solver. `None` searches until optimal.
    pub time_limit: Option<Duration>,
    pub tie_break: TieBreak,
}

/// Upper bound on the total tie-break bonus any solution can collect.
pub const TIE_BREAK_BUDGET: f64 = 1e-4;

/// Per-asset tie-break weights, aligned with `ids`.
///
/// `selections` is the maximum number of selection variables a single asset
/// can set across the whole model, so the total bonus stays within
/// [`TIE_BREAK_BUDGET`].
pub(crate) fn tie_break_weights(ids: &[AssetId], selections: usize, mode: TieBreak) -> Vec<f64> {
    match mode {
        TieBreak::SolverDefault => vec![0.0; ids.len()],
        TieBreak::LowestId => {
            let n = ids.len();
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by_key(|&i| ids[i]);
            let unit = TIE_BREAK_BUDGET / ((n * n * selections.max(1)) as f64);
            let mut weights = vec![0.0; n];
            for (rank, i) in order.into_iter().enumerate() {
                weights[i] = unit * (n - rank) as f64;
            }
            weights
        }
    }
}

// ---------------------------------------------------------------------------
// Decision-variable tables
// ---------------------------------------------------------------------------

/// Row order of the assets in one model, shared by all of its tables.
#[derive(Debug, Clone)]
pub(crate) struct AssetIndex {
    ids: Vec<AssetId>,
}

impl AssetIndex {
    pub(crate) fn new(ids: Vec<AssetId>) -> Self {
        AssetIndex { ids }
    }

    pub(crate) fn id(&self, row: usize) -> AssetId {
        self.ids[row]
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn ids(&self) -> &[AssetId] {
        &self.ids
    }
}

/// Decision variables indexed by `(asset row, period column)`.
pub(crate) struct VarTable {
    columns: usize,
    vars: Vec<Variable>,
}

impl VarTable {
    pub(crate) fn new(
        problem: &mut ProblemVariables,
        rows: usize,
        columns: usize,
        definition: impl Fn() -> VariableDefinition,
    ) -> Self {
        let vars = (0..rows * columns)
            .map(|_| problem.add(definition()))
            .collect();
        VarTable { columns, vars }
    }

    pub(crate) fn get(&self, row: usize, column: usize) -> Variable {
        self.vars[row * self.columns + column]
    }

    /// Every row's variable in one column.
    pub(crate) fn column(&self, column: usize) -> impl Iterator<Item = Variable> + '_ {
        let rows = self.vars.len() / self.columns.max(1);
        (0..rows).map(move |row| self.get(row, column))
    }
}

// ---------------------------------------------------------------------------
// Expression helpers
// ---------------------------------------------------------------------------

pub(crate) fn weighted_sum(terms: impl IntoIterator<Item = (f64, Variable)>) -> Expression {
    let mut expr = Expression::default();
    for (coef, var) in terms {
        expr.add_mul(coef, var);
    }
    expr
}

pub(crate) fn total(vars: impl IntoIterator<Item = Variable>) -> Expression {
    weighted_sum(vars.into_iter().map(|v| (1.0, v)))
}

pub(crate) fn constant(value: f64) -> Expression {
    Expression::from_other_affine(value)
}

/// Binary variables read back from the solver are 0/1 up to tolerance.
pub(crate) fn is_set(value: f64) -> bool {
    value > 0.5
}

// ---------------------------------------------------------------------------
// Solving
// ---------------------------------------------------------------------------

/// Maximise `objective` subject to `constraints` with the microlp backend.
///
/// `time_limit` bounds the branch-and-bound search inside microlp. Anything
/// short of a proven optimum is an error: an incumbent cut off by the limit is
/// never returned as a plan.
pub(crate) fn maximise(
    problem: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    time_limit: Option<Duration>,
    label: &str,
) -> Result<MicroLpSolution, SolveError> {
    debug!("{}: solving with {} constraints", label, constraints.len());
    let start = Instant::now();
    let mut model = problem.maximise(objective).using(microlp);
    if let Some(limit) = time_limit {
        model = model.with_time_limit(limit.as_secs_f64());
    }
    for c in constraints {
        model.add_constraint(c);
    }
    let result = model.solve();
    let elapsed = start.elapsed();
    match result {
        Ok(solution) => match solution.status() {
            SolutionStatus::Optimal => {
                info!("{}: optimal in {:.1?}", label, elapsed);
                Ok(solution)
            }
            status => {
                warn!(
                    "{}: stopped at {:?} after {:.1?}, discarding incumbent",
                    label, status, elapsed
                );
                Err(time_limit_error(time_limit))
            }
        },
        Err(ResolutionError::Other(msg)) if limit_expired(time_limit, elapsed) => {
            warn!("{}: {} after {:.1?}", label, msg, elapsed);
            Err(time_limit_error(time_limit))
        }
        Err(e) => {
            warn!("{}: solver stopped after {:.1?}: {}", label, elapsed, e);
            Err(SolveError::from(e))
        }
    }
}

fn limit_expired(time_limit: Option<Duration>, elapsed: Duration) -> bool {
    time_limit.is_some_and(|limit| elapsed >= limit)
}

fn time_limit_error(time_limit: Option<Duration>) -> SolveError {
    let detail = match time_limit {
        Some(limit) => format!("no proven optimum within {:?}", limit),
        None => String::new(),
    };
    SolveError::not_optimal(SolveStatus::TimeLimit, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::variable;

    /// max Σ (i+1)·x_i over `n` binaries with Σ x_i <= n/2.
    fn knapsack(n: usize) -> (ProblemVariables, Expression, Vec<Constraint>) {
        let mut problem = ProblemVariables::new();
        let table = VarTable::new(&mut problem, n, 1, || variable().binary());
        let objective = weighted_sum((0..n).map(|i| ((i + 1) as f64, table.get(i, 0))));
        let constraints = vec![good_lp::constraint::leq(
            total(table.column(0)),
            constant((n / 2) as f64),
        )];
        (problem, objective, constraints)
    }

    #[cfg(target_os = "linux")]
    fn thread_names() -> Vec<String> {
        std::fs::read_dir("/proc/self/task")
            .map(|tasks| {
                tasks
                    .flatten()
                    .filter_map(|t| std::fs::read_to_string(t.path().join("comm")).ok())
                    .map(|name| name.trim().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn status_strings_are_stable() {
        assert_eq!(SolveStatus::Optimal.to_string(), "Optimal");
        assert_eq!(SolveStatus::Infeasible.to_string(), "Infeasible");
        assert_eq!(SolveStatus::TimeLimit.to_string(), "Time limit reached");
        let err = SolveError::not_optimal(SolveStatus::Infeasible, "");
        assert_eq!(err.to_string(), "MIP status: Infeasible");
        assert_eq!(err.status(), Some(SolveStatus::Infeasible));
    }

    #[test]
    fn resolution_errors_map_to_status() {
        assert_eq!(
            SolveError::from(ResolutionError::Infeasible).status(),
            Some(SolveStatus::Infeasible)
        );
        assert_eq!(
            SolveError::from(ResolutionError::Unbounded).status(),
            Some(SolveStatus::Unbounded)
        );
    }

    #[test]
    fn tie_break_weights_decrease_with_id() {
        let ids = [AssetId(30), AssetId(10), AssetId(20)];
        let w = tie_break_weights(&ids, 4, TieBreak::LowestId);
        assert!(w[1] > w[2] && w[2] > w[0]);
        let bound: f64 = w.iter().sum::<f64>() * 4.0;
        assert!(bound <= TIE_BREAK_BUDGET);

        let none = tie_break_weights(&ids, 4, TieBreak::SolverDefault);
        assert!(none.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn var_table_is_row_major() {
        let mut problem = ProblemVariables::new();
        let table = VarTable::new(&mut problem, 3, 2, || variable().binary());
        assert_ne!(table.get(0, 1), table.get(1, 0));
        assert_eq!(table.column(1).count(), 3);
        assert_eq!(table.column(0).next(), Some(table.get(0, 0)));
    }

    #[test]
    fn asset_index_keeps_row_order() {
        let index = AssetIndex::new(vec![AssetId(7), AssetId(3)]);
        assert_eq!(index.id(0), AssetId(7));
        assert_eq!(index.id(1), AssetId(3));
        assert_eq!(index.len(), 2);
        assert_eq!(index.ids(), &[AssetId(7), AssetId(3)]);
    }

    #[test]
    fn small_knapsack_solves() {
        // max 3a + 2b + 2c, a + b + c <= 2, all binary
        let mut problem = ProblemVariables::new();
        let table = VarTable::new(&mut problem, 3, 1, || variable().binary());
        let objective = weighted_sum([
            (3.0, table.get(0, 0)),
            (2.0, table.get(1, 0)),
            (2.0, table.get(2, 0)),
        ]);
        let constraints = vec![good_lp::constraint::leq(total(table.column(0)), constant(2.0))];
        let solution = maximise(problem, objective, constraints, None, "knapsack").unwrap();
        assert!(is_set(solution.value(table.get(0, 0))));
        let picked = table
            .column(0)
            .filter(|&v| is_set(solution.value(v)))
            .count();
        assert_eq!(picked, 2);
    }

    #[test]
    fn infeasible_model_reports_status() {
        let mut problem = ProblemVariables::new();
        let table = VarTable::new(&mut problem, 2, 1, || variable().binary());
        let objective = total(table.column(0));
        let constraints = vec![good_lp::constraint::geq(total(table.column(0)), constant(3.0))];
        let Err(err) = maximise(problem, objective, constraints, None, "infeasible") else {
            panic!("expected an infeasible model");
        };
        assert_eq!(err.status(), Some(SolveStatus::Infeasible));
    }

    #[test]
    fn generous_time_limit_still_proves_optimality() {
        let (problem, objective, constraints) = knapsack(8);
        let limit = Some(Duration::from_secs(30));
        let solution = maximise(problem, objective, constraints, limit, "knapsack").unwrap();
        assert!(matches!(solution.status(), SolutionStatus::Optimal), "status was {:?}", solution.status());
    }

    #[test]
    fn expired_time_limit_is_reported_without_a_solution() {
        let (problem, objective, constraints) = knapsack(40);
        let limit = Some(Duration::from_nanos(1));
        let started = Instant::now();
        let Err(err) = maximise(problem, objective, constraints, limit, "knapsack") else {
            panic!("expected the time limit to stop the solve");
        };
        assert_eq!(err.status(), Some(SolveStatus::TimeLimit));
        assert!(err.to_string().starts_with("MIP status: Time limit reached"));
        assert!(started.elapsed() < Duration::from_secs(5));

        // The solve ran on this thread and nothing is left running.
        #[cfg(target_os = "linux")]
        assert!(!thread_names().iter().any(|name| name.starts_with("gaffer")));
    }

    #[test]
    fn limit_expiry_needs_a_configured_limit() {
        assert!(!limit_expired(None, Duration::from_secs(100)));
        assert!(!limit_expired(Some(Duration::from_secs(1)), Duration::from_millis(10)));
        assert!(limit_expired(Some(Duration::from_millis(1)), Duration::from_millis(10)));
        assert_eq!(
            time_limit_error(None).status(),
            Some(SolveStatus::TimeLimit)
        );
    }
}
