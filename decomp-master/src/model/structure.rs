//! Original-problem structure projected into the restricted master.
//!
//! The master sees the original columns (the union of all subproblem
//! columns), the coupling rows that link subproblems, and the root bounds
//! that branching tightens. Subproblem-local constraints stay with the
//! workers.

use decomp_core::sparse::{from_triplets, SparseCsc};

use crate::error::{DecompError, DecompResult};

/// Column data for one stage of a two-stage model.
#[derive(Debug, Clone, Default)]
pub struct StageColumns {
    /// Lower bounds.
    pub lower: Vec<f64>,

    /// Upper bounds.
    pub upper: Vec<f64>,

    /// Objective coefficients (unweighted).
    pub objective: Vec<f64>,

    /// Integrality flags.
    pub integer: Vec<bool>,
}

impl StageColumns {
    /// Continuous columns.
    pub fn continuous(lower: Vec<f64>, upper: Vec<f64>, objective: Vec<f64>) -> Self {
        let n = objective.len();
        Self {
            lower,
            upper,
            objective,
            integer: vec![false; n],
        }
    }

    /// Mark columns as integer.
    pub fn with_integer(mut self, integer: Vec<bool>) -> Self {
        self.integer = integer;
        self
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.objective.len()
    }

    /// True if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.objective.is_empty()
    }

    fn validate(&self, name: &str) -> DecompResult<()> {
        let n = self.objective.len();
        if self.lower.len() != n || self.upper.len() != n || self.integer.len() != n {
            return Err(DecompError::InvalidModel(format!(
                "{}: bounds/integrality sizes {}/{}/{} do not match {} columns",
                name,
                self.lower.len(),
                self.upper.len(),
                self.integer.len(),
                n
            )));
        }
        for j in 0..n {
            if self.lower[j].is_nan() || self.upper[j].is_nan() || self.lower[j] > self.upper[j] {
                return Err(DecompError::InvalidModel(format!(
                    "{}: column {} has bounds [{}, {}]",
                    name, j, self.lower[j], self.upper[j]
                )));
            }
        }
        Ok(())
    }
}

/// A two-stage stochastic program described by its columns.
///
/// Scenario constraints belong to the subproblem workers; the master only
/// needs the column layout, bounds and probabilities.
#[derive(Debug, Clone)]
pub struct TwoStageModel {
    /// First-stage columns (shared by every scenario).
    pub first_stage: StageColumns,

    /// Second-stage columns, one block per scenario.
    pub second_stage: Vec<StageColumns>,

    /// Scenario probabilities.
    pub probabilities: Vec<f64>,
}

impl TwoStageModel {
    /// Number of scenarios.
    pub fn num_scenarios(&self) -> usize {
        self.probabilities.len()
    }

    /// Number of first-stage columns.
    pub fn num_first_stage(&self) -> usize {
        self.first_stage.len()
    }

    /// Check sizes, bounds and probabilities.
    pub fn validate(&self) -> DecompResult<()> {
        let nscen = self.probabilities.len();
        if nscen == 0 {
            return Err(DecompError::InvalidModel("no scenarios".to_string()));
        }
        if self.second_stage.len() != nscen {
            return Err(DecompError::InvalidModel(format!(
                "{} second-stage blocks for {} scenarios",
                self.second_stage.len(),
                nscen
            )));
        }
        if self.probabilities.iter().any(|&p| !p.is_finite() || p < 0.0) {
            return Err(DecompError::InvalidModel(
                "probabilities must be finite and nonnegative".to_string(),
            ));
        }
        self.first_stage.validate("first stage")?;
        for (s, block) in self.second_stage.iter().enumerate() {
            block.validate(&format!("scenario {}", s))?;
        }
        Ok(())
    }
}

/// Two-stage layout retained for branching and primal recovery.
#[derive(Debug, Clone)]
pub struct TwoStageInfo {
    /// Number of scenarios.
    pub num_scenarios: usize,

    /// First-stage columns per scenario copy.
    pub num_first_stage: usize,

    /// Scenario probabilities.
    pub probabilities: Vec<f64>,
}

impl TwoStageInfo {
    /// Index of scenario `s`'s copy of first-stage column `j`.
    pub fn copy_index(&self, s: usize, j: usize) -> usize {
        s * self.num_first_stage + j
    }
}

/// The original problem as seen by the Dantzig-Wolfe master.
#[derive(Debug, Clone)]
pub struct MasterStructure {
    /// Coupling rows over original columns (CSC).
    pub matrix: SparseCsc,

    /// Row lower bounds.
    pub row_lower: Vec<f64>,

    /// Row upper bounds.
    pub row_upper: Vec<f64>,

    /// Root column lower bounds.
    pub col_lower: Vec<f64>,

    /// Root column upper bounds.
    pub col_upper: Vec<f64>,

    /// Objective over original columns.
    pub objective: Vec<f64>,

    /// Integrality flags.
    pub integer: Vec<bool>,

    /// Number of subproblems (convexity rows).
    pub num_subproblems: usize,

    /// Present when built from a two-stage model.
    pub two_stage: Option<TwoStageInfo>,
}

impl MasterStructure {
    /// Build and validate a general structure.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        matrix: SparseCsc,
        row_lower: Vec<f64>,
        row_upper: Vec<f64>,
        col_lower: Vec<f64>,
        col_upper: Vec<f64>,
        objective: Vec<f64>,
        integer: Vec<bool>,
        num_subproblems: usize,
    ) -> DecompResult<Self> {
        let structure = Self {
            matrix,
            row_lower,
            row_upper,
            col_lower,
            col_upper,
            objective,
            integer,
            num_subproblems,
            two_stage: None,
        };
        structure.validate()?;
        Ok(structure)
    }

    /// Replicate first-stage columns per scenario and link the copies with
    /// nonanticipativity rows `x[s,j] − x[s+1,j] = 0`.
    ///
    /// Column layout: all first-stage copies scenario by scenario, then the
    /// second-stage blocks in scenario order. Copies carry `prob[s]·c`; the
    /// second-stage blocks carry `prob[s]·q[s]`.
    ///
    /// With three or more scenarios the rows are cyclic. With two the wrap
    /// row would repeat the forward row with opposite sign, so it is left
    /// out. One scenario needs no rows.
    pub fn from_two_stage(model: &TwoStageModel) -> DecompResult<Self> {
        model.validate()?;

        let nscen = model.num_scenarios();
        let n1 = model.num_first_stage();
        let n2_total: usize = model.second_stage.iter().map(|b| b.len()).sum();
        let ncols = nscen * n1 + n2_total;

        let linked = match nscen {
            1 => 0,
            2 => 1,
            _ => nscen,
        };
        let nrows = linked * n1;
        let mut triplets = Vec::with_capacity(2 * nrows);
        for s in 0..linked {
            let next = (s + 1) % nscen;
            for j in 0..n1 {
                let row = s * n1 + j;
                triplets.push((row, s * n1 + j, 1.0));
                triplets.push((row, next * n1 + j, -1.0));
            }
        }

        let mut col_lower = Vec::with_capacity(ncols);
        let mut col_upper = Vec::with_capacity(ncols);
        let mut objective = Vec::with_capacity(ncols);
        let mut integer = Vec::with_capacity(ncols);
        for &p in &model.probabilities {
            let fs = &model.first_stage;
            col_lower.extend_from_slice(&fs.lower);
            col_upper.extend_from_slice(&fs.upper);
            objective.extend(fs.objective.iter().map(|c| p * c));
            integer.extend_from_slice(&fs.integer);
        }
        for (block, &p) in model.second_stage.iter().zip(&model.probabilities) {
            col_lower.extend_from_slice(&block.lower);
            col_upper.extend_from_slice(&block.upper);
            objective.extend(block.objective.iter().map(|q| p * q));
            integer.extend_from_slice(&block.integer);
        }

        let structure = Self {
            matrix: from_triplets(nrows, ncols, triplets),
            row_lower: vec![0.0; nrows],
            row_upper: vec![0.0; nrows],
            col_lower,
            col_upper,
            objective,
            integer,
            num_subproblems: nscen,
            two_stage: Some(TwoStageInfo {
                num_scenarios: nscen,
                num_first_stage: n1,
                probabilities: model.probabilities.clone(),
            }),
        };
        structure.validate()?;

        log::debug!(
            "Two-stage master structure: {} scenarios, {} first-stage columns, {} rows, {} columns",
            nscen,
            n1,
            nrows,
            ncols
        );
        Ok(structure)
    }

    /// Number of coupling rows.
    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Number of original columns.
    pub fn num_cols(&self) -> usize {
        self.objective.len()
    }

    /// Check dimensions and bounds.
    pub fn validate(&self) -> DecompResult<()> {
        let m = self.row_lower.len();
        let n = self.objective.len();
        if self.num_subproblems == 0 {
            return Err(DecompError::InvalidModel("no subproblems".to_string()));
        }
        if self.row_upper.len() != m || self.matrix.rows() != m {
            return Err(DecompError::InvalidModel(format!(
                "row data sizes {}/{}/{} disagree",
                m,
                self.row_upper.len(),
                self.matrix.rows()
            )));
        }
        if self.col_lower.len() != n
            || self.col_upper.len() != n
            || self.integer.len() != n
            || self.matrix.cols() != n
        {
            return Err(DecompError::InvalidModel(format!(
                "column data sizes disagree with {} objective entries",
                n
            )));
        }
        for i in 0..m {
            if self.row_lower[i] > self.row_upper[i] {
                return Err(DecompError::InvalidModel(format!(
                    "row {} has bounds [{}, {}]",
                    i, self.row_lower[i], self.row_upper[i]
                )));
            }
        }
        for j in 0..n {
            if self.col_lower[j] > self.col_upper[j] {
                return Err(DecompError::InvalidModel(format!(
                    "column {} has bounds [{}, {}]",
                    j, self.col_lower[j], self.col_upper[j]
                )));
            }
        }
        Ok(())
    }
}
