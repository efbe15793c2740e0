//! Coupling-row description for the dual-decomposition master.

use decomp_core::RowSense;

use crate::error::{DecompError, DecompResult};
use crate::model::TwoStageModel;

/// Coupling rows relaxed into the Lagrangian.
///
/// Multiplier `i` belongs to coupling row `i`. Its sign follows the row
/// sense: `≤` rows get `λ ≥ 0`, `≥` rows get `λ ≤ 0`, equalities are free.
#[derive(Debug, Clone)]
pub struct CouplingModel {
    /// Number of subproblems (one surrogate per subproblem).
    pub num_subproblems: usize,

    /// Sense of each coupling row.
    pub senses: Vec<RowSense>,

    /// When set, multipliers come in per-subproblem blocks of this size and
    /// the master adds rows `Σ_s λ[s·block + i] = 0` for every `i`.
    pub normalization_block: Option<usize>,
}

impl CouplingModel {
    /// Build and validate.
    pub fn new(
        num_subproblems: usize,
        senses: Vec<RowSense>,
        normalization_block: Option<usize>,
    ) -> DecompResult<Self> {
        let model = Self {
            num_subproblems,
            senses,
            normalization_block,
        };
        model.validate()?;
        Ok(model)
    }

    /// Nonanticipativity coupling `x[s] = x̄` for every scenario and
    /// first-stage column, with the normalization rows that make the
    /// multipliers of each column sum to zero.
    pub fn from_two_stage(model: &TwoStageModel) -> DecompResult<Self> {
        model.validate()?;
        let nscen = model.num_scenarios();
        let n1 = model.num_first_stage();
        Self::new(nscen, vec![RowSense::Equal; nscen * n1], Some(n1))
    }

    /// Number of multipliers.
    pub fn num_multipliers(&self) -> usize {
        self.senses.len()
    }

    /// Multiplier bounds implied by the row sense, intersected with
    /// `[center − radius, center + radius]`.
    pub fn multiplier_bounds(&self, i: usize, center: f64, radius: f64) -> (f64, f64) {
        let mut lo = center - radius;
        let mut hi = center + radius;
        match self.senses[i] {
            RowSense::Less => lo = lo.max(0.0),
            RowSense::Greater => hi = hi.min(0.0),
            _ => {}
        }
        (lo, hi)
    }

    /// Check sizes and senses.
    pub fn validate(&self) -> DecompResult<()> {
        if self.num_subproblems == 0 {
            return Err(DecompError::InvalidModel("no subproblems".to_string()));
        }
        if let Some(i) = self
            .senses
            .iter()
            .position(|s| matches!(s, RowSense::Range | RowSense::Free))
        {
            return Err(DecompError::InvalidModel(format!(
                "coupling row {} must be an inequality or equality",
                i
            )));
        }
        if let Some(block) = self.normalization_block {
            if block * self.num_subproblems != self.senses.len() {
                return Err(DecompError::InvalidModel(format!(
                    "{} multipliers cannot form {} blocks of {}",
                    self.senses.len(),
                    self.num_subproblems,
                    block
                )));
            }
        }
        Ok(())
    }
}
