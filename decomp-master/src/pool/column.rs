//! Arena of Dantzig-Wolfe columns.

use decomp_core::SparseVec;

/// Reduced-cost fixing fires when `best_dual + rc − best_primal` exceeds `−RC_FIX_TOL`.
pub const RC_FIX_TOL: f64 = 1e-10;

/// Reduced costs below this reset a column's age.
const AGE_RC_TOL: f64 = 1e-8;

/// Stable identifier of a column in its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

impl ColumnId {
    /// Position in the pool.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A generated column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Owning subproblem.
    pub subproblem: usize,

    /// Subproblem extreme point or ray over the original columns.
    pub solution: SparseVec,

    /// Coefficients over master rows (convexity, coupling, branching).
    pub coefficients: SparseVec,

    /// Objective coefficient in phase 2.
    pub objective: f64,

    /// Lower bound of the column weight.
    pub lower: f64,

    /// Upper bound of the column weight.
    pub upper: f64,

    /// True for an extreme ray (no convexity entry).
    pub is_ray: bool,

    /// Currently loaded in the LP.
    pub active: bool,

    /// Consecutive iterations with a non-improving reduced cost.
    pub age: usize,
}

/// Pool of generated columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnPool {
    columns: Vec<Column>,
}

impl ColumnPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns ever generated.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if nothing has been generated.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of active columns.
    pub fn num_active(&self) -> usize {
        self.columns.iter().filter(|c| c.active).count()
    }

    /// Append a newly active column with weight bounds `[0, ∞)`.
    pub fn add_column(
        &mut self,
        subproblem: usize,
        solution: SparseVec,
        coefficients: SparseVec,
        objective: f64,
        is_ray: bool,
    ) -> ColumnId {
        let id = ColumnId(self.columns.len());
        self.columns.push(Column {
            subproblem,
            solution,
            coefficients,
            objective,
            lower: 0.0,
            upper: f64::INFINITY,
            is_ray,
            active: true,
            age: 0,
        });
        id
    }

    /// Look up a column.
    pub fn get(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0)
    }

    /// All columns with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &Column)> {
        self.columns.iter().enumerate().map(|(k, c)| (ColumnId(k), c))
    }

    /// Ids of active columns in pool order.
    pub fn active_ids(&self) -> Vec<ColumnId> {
        self.iter().filter(|(_, c)| c.active).map(|(id, _)| id).collect()
    }

    /// Active flags in pool order.
    pub fn active_flags(&self) -> Vec<bool> {
        self.columns.iter().map(|c| c.active).collect()
    }

    /// Restore active flags saved by [`active_flags`](Self::active_flags).
    /// Columns generated afterwards stay active.
    pub fn set_active_flags(&mut self, flags: &[bool]) {
        for (c, &a) in self.columns.iter_mut().zip(flags) {
            c.active = a;
        }
    }

    /// Replace a column's master-row coefficients.
    pub fn set_coefficients(&mut self, id: ColumnId, coefficients: SparseVec) {
        if let Some(c) = self.columns.get_mut(id.0) {
            c.coefficients = coefficients;
        }
    }

    /// Deactivate a column if its reduced cost proves it cannot enter an
    /// improving basis: `best_dual + reduced_cost − best_primal > −ε`.
    /// Returns true if the column was deactivated.
    pub fn mark_reduced_cost_fixed(
        &mut self,
        id: ColumnId,
        best_dual: f64,
        reduced_cost: f64,
        best_primal: f64,
    ) -> bool {
        if !best_primal.is_finite() || !best_dual.is_finite() {
            return false;
        }
        match self.columns.get_mut(id.0) {
            Some(c) if c.active && best_dual + reduced_cost - best_primal > -RC_FIX_TOL => {
                c.active = false;
                true
            }
            _ => false,
        }
    }

    /// Increment a column's age.
    pub fn age(&mut self, id: ColumnId) {
        if let Some(c) = self.columns.get_mut(id.0) {
            c.age += 1;
        }
    }

    /// Reset a column's age.
    pub fn reset_age(&mut self, id: ColumnId) {
        if let Some(c) = self.columns.get_mut(id.0) {
            c.age = 0;
        }
    }

    /// Age or reset a column from its current reduced cost.
    pub fn update_age(&mut self, id: ColumnId, reduced_cost: f64) {
        if reduced_cost < AGE_RC_TOL {
            self.reset_age(id);
        } else {
            self.age(id);
        }
    }

    /// Deactivate a column.
    pub fn deactivate(&mut self, id: ColumnId) {
        if let Some(c) = self.columns.get_mut(id.0) {
            c.active = false;
        }
    }

    /// Reactivate every column.
    pub fn activate_all(&mut self) {
        for c in &mut self.columns {
            c.active = true;
        }
    }
}
