//! The LP engine capability consumed by the decomposition masters.

use crate::basis::Basis;
use crate::error::EngineResult;
use crate::problem::{LpProblem, LpStatus};

/// Abstract LP engine.
///
/// Implementations own one LP and at most one warm-start basis. Row and
/// column indices are positional and shift down after deletions; callers
/// keep their own stable-id translation tables.
///
/// Dual values follow `c − Aᵀπ = d` for the problem as posed, whatever
/// the objective sense.
pub trait LpEngine {
    /// Replace the loaded problem. Discards any warm-start basis.
    fn load_problem(&mut self, problem: LpProblem) -> EngineResult<()>;

    /// Solve the current problem and return its status.
    fn resolve(&mut self) -> EngineResult<LpStatus>;

    /// Status of the last resolve.
    fn status(&self) -> LpStatus;

    /// Pivots taken by the last resolve, or `None` for engines that do
    /// not pivot.
    fn pivot_count(&self) -> Option<usize>;

    /// Append a column with sparse row coefficients `(row, value)`.
    fn add_column(&mut self, coeffs: &[(usize, f64)], lb: f64, ub: f64, obj: f64)
        -> EngineResult<usize>;

    /// Append a row with sparse column coefficients `(col, value)`.
    fn add_row(&mut self, coeffs: &[(usize, f64)], lb: f64, ub: f64) -> EngineResult<usize>;

    /// Delete columns by position.
    fn delete_columns(&mut self, indices: &[usize]) -> EngineResult<()>;

    /// Delete rows by position.
    fn delete_rows(&mut self, indices: &[usize]) -> EngineResult<()>;

    /// Number of rows.
    fn num_rows(&self) -> usize;

    /// Number of columns.
    fn num_cols(&self) -> usize;

    /// Row duals π of the last solve.
    fn row_duals(&self) -> &[f64];

    /// Reduced costs d of the last solve.
    fn reduced_costs(&self) -> &[f64];

    /// Primal column values of the last solve.
    fn column_solution(&self) -> &[f64];

    /// Row activities A x of the last solve.
    fn row_activity(&self) -> &[f64];

    /// Objective value cᵀx of the last solve.
    fn objective_value(&self) -> f64;

    /// Current warm-start basis, if any.
    fn warm_start(&self) -> Option<Basis>;

    /// Install a warm-start basis. Rejected if its dimensions do not match.
    fn set_warm_start(&mut self, basis: Basis) -> EngineResult<()>;

    /// Change a column's bounds.
    fn set_column_bounds(&mut self, index: usize, lb: f64, ub: f64) -> EngineResult<()>;

    /// Change a column's objective coefficient.
    fn set_objective_coefficient(&mut self, index: usize, value: f64) -> EngineResult<()>;

    /// Column bounds `(lb, ub)`.
    fn column_bounds(&self, index: usize) -> EngineResult<(f64, f64)>;

    /// Row bounds `(lb, ub)`.
    fn row_bounds(&self, index: usize) -> EngineResult<(f64, f64)>;

    /// Objective coefficient of a column.
    fn objective_coefficient(&self, index: usize) -> EngineResult<f64>;

    /// Set the per-resolve time limit in seconds (`None` = unlimited).
    fn set_time_limit(&mut self, seconds: Option<f64>);
}
