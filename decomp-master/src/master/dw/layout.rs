//! Row layout and column translation table of the restricted master.
//!
//! LP rows are `[convexity | coupling | branching]`. LP columns are a mix
//! of pool columns and phase-1 auxiliary columns in insertion order; the
//! table maps each LP position to its owner and shifts with deletions.

use decomp_core::LpEngine;

use crate::error::{DecompError, DecompResult, StateErrorCode};
use crate::pool::ColumnId;

/// Owner of one LP column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LpColumn {
    /// A pool column.
    Generated(ColumnId),
    /// A phase-1 slack column.
    Auxiliary,
}

/// A branching row `lower ≤ x_column ≤ upper` with one side infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BranchRow {
    pub column: usize,
    pub lower: f64,
    pub upper: f64,
}

impl BranchRow {
    /// Finite side of the row, used in the Lagrangian bound.
    pub fn bound(&self) -> f64 {
        if self.lower.is_finite() {
            self.lower
        } else {
            self.upper
        }
    }
}

/// Row partition of the restricted master.
#[derive(Debug, Clone, Default)]
pub(crate) struct RowLayout {
    pub num_conv: usize,
    pub num_orig: usize,
    pub branch: Vec<BranchRow>,
}

impl RowLayout {
    pub fn new(num_conv: usize, num_orig: usize) -> Self {
        Self {
            num_conv,
            num_orig,
            branch: Vec::new(),
        }
    }

    /// Convexity plus coupling rows.
    pub fn num_core(&self) -> usize {
        self.num_conv + self.num_orig
    }

    pub fn num_rows(&self) -> usize {
        self.num_core() + self.branch.len()
    }

    pub fn check(&self, engine: &dyn LpEngine) -> DecompResult<()> {
        if engine.num_rows() != self.num_rows() {
            return Err(DecompError::state(
                StateErrorCode::RowLayoutMismatch,
                format!(
                    "layout has {} rows ({} conv, {} orig, {} branch), LP has {}",
                    self.num_rows(),
                    self.num_conv,
                    self.num_orig,
                    self.branch.len(),
                    engine.num_rows()
                ),
            ));
        }
        Ok(())
    }
}

/// LP column translation table.
#[derive(Debug, Clone, Default)]
pub(crate) struct ColumnTable {
    cols: Vec<LpColumn>,
}

impl ColumnTable {
    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn push(&mut self, col: LpColumn) {
        self.cols.push(col);
    }

    pub fn get(&self, pos: usize) -> Option<LpColumn> {
        self.cols.get(pos).copied()
    }

    pub fn clear(&mut self) {
        self.cols.clear();
    }

    /// LP positions of auxiliary columns.
    pub fn auxiliary_positions(&self) -> Vec<usize> {
        self.cols
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, LpColumn::Auxiliary))
            .map(|(k, _)| k)
            .collect()
    }

    /// `(position, id)` of every generated column.
    pub fn generated(&self) -> Vec<(usize, ColumnId)> {
        self.cols
            .iter()
            .enumerate()
            .filter_map(|(k, c)| match c {
                LpColumn::Generated(id) => Some((k, *id)),
                LpColumn::Auxiliary => None,
            })
            .collect()
    }

    /// Drop the given positions; later entries shift down.
    pub fn remove_positions(&mut self, positions: &[usize]) {
        let mut drop = vec![false; self.cols.len()];
        for &p in positions {
            if let Some(d) = drop.get_mut(p) {
                *d = true;
            }
        }
        let mut k = 0;
        self.cols.retain(|_| {
            k += 1;
            !drop[k - 1]
        });
    }

    pub fn check(&self, engine: &dyn LpEngine) -> DecompResult<()> {
        if engine.num_cols() != self.cols.len() {
            return Err(DecompError::state(
                StateErrorCode::ColumnTableMismatch,
                format!(
                    "column table has {} entries, LP has {} columns",
                    self.cols.len(),
                    engine.num_cols()
                ),
            ));
        }
        Ok(())
    }
}
