//! Cut pool for the trust-region master.
//!
//! Every cut is a row `a·(θ, λ) ≤ rhs`. Active cuts are loaded in the LP
//! after a fixed block of leading rows; [`CutRows`] maps those LP rows back
//! to pool ids. Deleted cuts keep their record and can be recruited again.

use decomp_core::sparse::dot_dense;
use decomp_core::{BasisStatus, LpEngine, SparseVec};

use crate::error::{DecompError, DecompResult, StateErrorCode};

/// Two cuts are duplicates if every coefficient and the rhs agree to this.
const DUPLICATE_TOL: f64 = 1e-10;

/// Stable identifier of a cut in its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CutId(usize);

impl CutId {
    /// Position in the pool.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Status of a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutStatus {
    /// Loaded in the LP.
    Active,
    /// Removed from the LP; may be recruited.
    Deleted,
}

/// A cut with pool metadata.
#[derive(Debug, Clone)]
pub struct Cut {
    /// Coefficients over master columns.
    pub row: SparseVec,

    /// Right-hand side.
    pub rhs: f64,

    /// Outer iterations survived while active.
    pub age: usize,

    /// Current status.
    pub status: CutStatus,

    /// Eligible for deletion at the next purge.
    pub possibly_delete: bool,

    /// Master objective when the cut was added.
    pub master_obj_at_add: f64,
}

impl Cut {
    /// `a·x − rhs`; positive when `x` violates the cut.
    pub fn violation(&self, x: &[f64]) -> f64 {
        dot_dense(&self.row, x) - self.rhs
    }

    fn same_as(&self, row: &SparseVec, rhs: f64) -> bool {
        (self.rhs - rhs).abs() <= DUPLICATE_TOL
            && self.row.indices() == row.indices()
            && self
                .row
                .data()
                .iter()
                .zip(row.data())
                .all(|(a, b)| (a - b).abs() <= DUPLICATE_TOL)
    }
}

/// Translation table from LP rows to cuts.
///
/// LP rows `0..offset` are fixed rows owned by the master; row
/// `offset + k` holds cut `rows[k]`.
#[derive(Debug, Clone, Default)]
pub struct CutRows {
    offset: usize,
    rows: Vec<CutId>,
}

impl CutRows {
    /// Empty table after `offset` fixed rows.
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            rows: Vec::new(),
        }
    }

    /// Number of fixed leading rows.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Cuts in LP row order.
    pub fn cuts(&self) -> &[CutId] {
        &self.rows
    }

    /// Total LP rows described.
    pub fn num_rows(&self) -> usize {
        self.offset + self.rows.len()
    }

    /// LP row of a cut, if loaded.
    pub fn row_of(&self, id: CutId) -> Option<usize> {
        self.rows.iter().position(|&c| c == id).map(|k| self.offset + k)
    }

    pub(crate) fn check(&self, engine: &dyn LpEngine) -> DecompResult<()> {
        if engine.num_rows() != self.num_rows() {
            return Err(DecompError::state(
                StateErrorCode::CutTableMismatch,
                format!(
                    "cut table covers {} rows, LP has {}",
                    self.num_rows(),
                    engine.num_rows()
                ),
            ));
        }
        Ok(())
    }
}

/// Pool of generated cuts.
#[derive(Debug, Clone, Default)]
pub struct CutPool {
    cuts: Vec<Cut>,
}

impl CutPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cuts ever added.
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// True if no cut was ever added.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Number of active cuts.
    pub fn num_active(&self) -> usize {
        self.cuts.iter().filter(|c| c.status == CutStatus::Active).count()
    }

    /// Look up a cut.
    pub fn get(&self, id: CutId) -> Option<&Cut> {
        self.cuts.get(id.0)
    }

    /// All cuts with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (CutId, &Cut)> {
        self.cuts.iter().enumerate().map(|(k, c)| (CutId(k), c))
    }

    /// Ids of active cuts in pool order.
    pub fn active_ids(&self) -> Vec<CutId> {
        self.iter()
            .filter(|(_, c)| c.status == CutStatus::Active)
            .map(|(id, _)| id)
            .collect()
    }

    /// True if a cut with this row and rhs is already pooled.
    pub fn contains(&self, row: &SparseVec, rhs: f64) -> bool {
        self.cuts.iter().any(|c| c.same_as(row, rhs))
    }

    /// Add a new active cut unless an identical one is pooled.
    pub fn add_cut(
        &mut self,
        row: SparseVec,
        rhs: f64,
        master_obj: f64,
        possibly_delete: bool,
    ) -> Option<CutId> {
        if self.contains(&row, rhs) {
            return None;
        }
        let id = CutId(self.cuts.len());
        self.cuts.push(Cut {
            row,
            rhs,
            age: 0,
            status: CutStatus::Active,
            possibly_delete,
            master_obj_at_add: master_obj,
        });
        Some(id)
    }

    /// Age every active cut by one iteration.
    pub fn age_cuts(&mut self) {
        for c in self.cuts.iter_mut().filter(|c| c.status == CutStatus::Active) {
            c.age += 1;
        }
    }

    /// Flag a cut for removal at the next [`purge`](Self::purge).
    pub fn mark_deletable(&mut self, id: CutId) {
        if let Some(c) = self.cuts.get_mut(id.0) {
            c.possibly_delete = true;
        }
    }

    /// Clear a cut's deletion flag.
    pub fn protect(&mut self, id: CutId) {
        if let Some(c) = self.cuts.get_mut(id.0) {
            c.possibly_delete = false;
        }
    }

    /// Reinstate a deleted cut: active, age zero, deletable again.
    /// Returns false if the cut was not deleted.
    pub fn recruit(&mut self, id: CutId) -> bool {
        match self.cuts.get_mut(id.0) {
            Some(c) if c.status == CutStatus::Deleted => {
                c.status = CutStatus::Active;
                c.age = 0;
                c.possibly_delete = true;
                true
            }
            _ => false,
        }
    }

    /// Deleted cuts violated by more than `tol` at `x`.
    pub fn violated_deleted(&self, x: &[f64], tol: f64) -> Vec<CutId> {
        self.iter()
            .filter(|(_, c)| c.status == CutStatus::Deleted && c.violation(x) > tol)
            .map(|(id, _)| id)
            .collect()
    }

    /// Append the given active cuts as new LP rows.
    pub fn load_rows(
        &self,
        engine: &mut dyn LpEngine,
        table: &mut CutRows,
        ids: &[CutId],
    ) -> DecompResult<()> {
        table.check(engine)?;
        let cuts: Vec<&Cut> = ids.iter().filter_map(|&id| self.get(id)).collect();
        if cuts.len() != ids.len() {
            return Err(DecompError::state(
                StateErrorCode::CutTableMismatch,
                "loading a cut that is not pooled",
            ));
        }
        for (&id, cut) in ids.iter().zip(cuts) {
            let coeffs: Vec<(usize, f64)> = cut.row.iter().map(|(j, &v)| (j, v)).collect();
            engine.add_row(&coeffs, f64::NEG_INFINITY, cut.rhs)?;
            table.rows.push(id);
        }
        Ok(())
    }

    /// Delete every active cut flagged `possibly_delete` and rebuild the
    /// LP cut rows. The LP is untouched when nothing is flagged.
    /// Returns the number of cuts deleted.
    pub fn purge(&mut self, engine: &mut dyn LpEngine, table: &mut CutRows) -> DecompResult<usize> {
        table.check(engine)?;
        let doomed: Vec<usize> = self
            .cuts
            .iter()
            .enumerate()
            .filter(|(_, c)| c.status == CutStatus::Active && c.possibly_delete)
            .map(|(k, _)| k)
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }
        for &k in &doomed {
            self.cuts[k].status = CutStatus::Deleted;
        }
        self.rebuild_rows(engine, table)?;
        log::debug!("Deleted {} cuts; {} remain active", doomed.len(), self.num_active());
        Ok(doomed.len())
    }

    /// Recruit the given deleted cuts and rebuild the LP cut rows.
    /// Returns the number recruited.
    pub fn recruit_all(
        &mut self,
        engine: &mut dyn LpEngine,
        table: &mut CutRows,
        ids: &[CutId],
    ) -> DecompResult<usize> {
        table.check(engine)?;
        let mut n = 0;
        for &id in ids {
            if self.recruit(id) {
                n += 1;
            }
        }
        if n > 0 {
            self.rebuild_rows(engine, table)?;
        }
        Ok(n)
    }

    /// Remove all cut rows and load the active cuts in pool order. Rows of
    /// surviving cuts keep their warm-start status; new rows start basic.
    fn rebuild_rows(&self, engine: &mut dyn LpEngine, table: &mut CutRows) -> DecompResult<()> {
        let old_basis = engine.warm_start();
        let old_rows = std::mem::take(&mut table.rows);

        let to_delete: Vec<usize> = (table.offset..table.offset + old_rows.len()).collect();
        engine.delete_rows(&to_delete)?;

        let active = self.active_ids();
        self.load_rows(engine, table, &active)?;

        if let Some(basis) = old_basis {
            let source: Vec<Option<usize>> = (0..table.offset)
                .map(Some)
                .chain(active.iter().map(|id| {
                    old_rows
                        .iter()
                        .position(|c| c == id)
                        .map(|k| table.offset + k)
                }))
                .collect();
            let remapped = basis.remap_rows(&source, BasisStatus::Basic);
            if remapped.matches(engine.num_rows(), engine.num_cols()) {
                engine.set_warm_start(remapped)?;
            }
        }
        Ok(())
    }
}
