//! LP problem data and solve statuses.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::sparse::SparseCsc;

/// Objective direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjSense {
    /// Minimize cᵀx.
    #[default]
    Minimize,
    /// Maximize cᵀx.
    Maximize,
}

/// Sense of a row, derived from its bound pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// Only a finite lower bound: `a x ≥ l`.
    Greater,
    /// Only a finite upper bound: `a x ≤ u`.
    Less,
    /// Equal finite bounds.
    Equal,
    /// Two distinct finite bounds.
    Range,
    /// No finite bound.
    Free,
}

impl RowSense {
    /// Classify a bound pair.
    pub fn from_bounds(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) if lower == upper => RowSense::Equal,
            (true, true) => RowSense::Range,
            (true, false) => RowSense::Greater,
            (false, true) => RowSense::Less,
            (false, false) => RowSense::Free,
        }
    }

    /// True if the row restricts activity from below.
    pub fn has_lower(self) -> bool {
        matches!(self, RowSense::Greater | RowSense::Equal | RowSense::Range)
    }

    /// True if the row restricts activity from above.
    pub fn has_upper(self) -> bool {
        matches!(self, RowSense::Less | RowSense::Equal | RowSense::Range)
    }
}

/// Status reported by an LP engine after `resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpStatus {
    /// Proven optimal.
    Optimal,
    /// Feasible, optimality not proven to full tolerance.
    Feasible,
    /// No feasible point.
    PrimalInfeasible,
    /// Unbounded objective.
    DualInfeasible,
    /// Stopped on iteration or time limit.
    IterOrTimeLimit,
    /// Numerical failure.
    Abort,
    /// No solve has happened since the last load.
    #[default]
    NotSolved,
}

impl LpStatus {
    /// True if the primal solution may be used.
    pub fn has_solution(self) -> bool {
        matches!(self, LpStatus::Optimal | LpStatus::Feasible)
    }
}

/// A linear program `min/max cᵀx  s.t.  l_r ≤ A x ≤ u_r,  l_c ≤ x ≤ u_c`.
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Constraint matrix (CSC, rows × cols).
    pub matrix: SparseCsc,

    /// Column lower bounds (may be -∞).
    pub col_lower: Vec<f64>,

    /// Column upper bounds (may be +∞).
    pub col_upper: Vec<f64>,

    /// Objective coefficients.
    pub objective: Vec<f64>,

    /// Row lower bounds (may be -∞).
    pub row_lower: Vec<f64>,

    /// Row upper bounds (may be +∞).
    pub row_upper: Vec<f64>,

    /// Objective direction.
    pub sense: ObjSense,
}

impl LpProblem {
    /// A problem with `nrows` rows and no columns.
    pub fn with_rows(row_lower: Vec<f64>, row_upper: Vec<f64>, sense: ObjSense) -> Self {
        let nrows = row_lower.len();
        Self {
            matrix: sprs::CsMat::zero((nrows, 0)).to_csc(),
            col_lower: Vec::new(),
            col_upper: Vec::new(),
            objective: Vec::new(),
            row_lower,
            row_upper,
            sense,
        }
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Number of columns.
    pub fn num_cols(&self) -> usize {
        self.objective.len()
    }

    /// Check dimensions and bound consistency.
    pub fn validate(&self) -> EngineResult<()> {
        let m = self.row_lower.len();
        let n = self.objective.len();

        if self.row_upper.len() != m {
            return Err(EngineError::InvalidProblem(format!(
                "row_upper has {} entries, expected {}",
                self.row_upper.len(),
                m
            )));
        }
        if self.col_lower.len() != n || self.col_upper.len() != n {
            return Err(EngineError::InvalidProblem(format!(
                "column bounds have {}/{} entries, expected {}",
                self.col_lower.len(),
                self.col_upper.len(),
                n
            )));
        }
        if self.matrix.rows() != m || self.matrix.cols() != n {
            return Err(EngineError::InvalidProblem(format!(
                "matrix is {}x{}, expected {}x{}",
                self.matrix.rows(),
                self.matrix.cols(),
                m,
                n
            )));
        }
        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(EngineError::InvalidProblem(
                "objective contains non-finite values".to_string(),
            ));
        }
        for (i, (&l, &u)) in self.row_lower.iter().zip(&self.row_upper).enumerate() {
            if l.is_nan() || u.is_nan() || l > u {
                return Err(EngineError::InvalidProblem(format!(
                    "row {} has bounds [{}, {}]",
                    i, l, u
                )));
            }
        }
        for (j, (&l, &u)) in self.col_lower.iter().zip(&self.col_upper).enumerate() {
            if l.is_nan() || u.is_nan() || l > u {
                return Err(EngineError::InvalidProblem(format!(
                    "column {} has bounds [{}, {}]",
                    j, l, u
                )));
            }
        }
        Ok(())
    }
}

/// Settings shared by LP engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Iteration limit per resolve.
    pub max_iter: u32,

    /// Time limit per resolve in milliseconds (0 = unlimited).
    pub time_limit_ms: u64,

    /// Primal/dual feasibility tolerance.
    pub tol_feas: f64,

    /// Duality gap tolerance.
    pub tol_gap: f64,

    /// Print solver output.
    pub verbose: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_iter: 200,
            time_limit_ms: 0,
            tol_feas: 1e-8,
            tol_gap: 1e-8,
            verbose: false,
        }
    }
}

impl EngineSettings {
    /// Set the iteration limit.
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Set the feasibility and gap tolerances.
    pub fn with_tolerances(mut self, tol_feas: f64, tol_gap: f64) -> Self {
        self.tol_feas = tol_feas;
        self.tol_gap = tol_gap;
        self
    }

    /// Enable solver output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
