//! Warm-start basis bookkeeping.
//!
//! A [`Basis`] records one status per structural column and one per row
//! (the row's artificial/slack variable). Every row or column mutation of
//! the LP has a matching operation here so the two stay in lock-step.

/// Status of a single variable in a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasisStatus {
    /// In the basis.
    Basic,
    /// Nonbasic at its lower bound.
    #[default]
    AtLower,
    /// Nonbasic at its upper bound.
    AtUpper,
    /// Nonbasic free variable.
    Free,
}

/// Warm-start basis: statuses for structural columns and row artificials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Basis {
    /// One status per LP column.
    pub structural: Vec<BasisStatus>,

    /// One status per LP row.
    pub artificial: Vec<BasisStatus>,
}

impl Basis {
    /// Slack basis: all columns at lower, all row artificials basic.
    pub fn slack(nrows: usize, ncols: usize) -> Self {
        Self {
            structural: vec![BasisStatus::AtLower; ncols],
            artificial: vec![BasisStatus::Basic; nrows],
        }
    }

    /// Number of rows covered.
    pub fn num_rows(&self) -> usize {
        self.artificial.len()
    }

    /// Number of columns covered.
    pub fn num_cols(&self) -> usize {
        self.structural.len()
    }

    /// True if the basis has exactly these dimensions.
    pub fn matches(&self, nrows: usize, ncols: usize) -> bool {
        self.artificial.len() == nrows && self.structural.len() == ncols
    }

    /// Number of basic variables (columns plus artificials).
    pub fn num_basic(&self) -> usize {
        self.structural
            .iter()
            .chain(&self.artificial)
            .filter(|&&s| s == BasisStatus::Basic)
            .count()
    }

    /// Append a column status.
    pub fn push_column(&mut self, status: BasisStatus) {
        self.structural.push(status);
    }

    /// Append a row artificial status.
    pub fn push_row(&mut self, status: BasisStatus) {
        self.artificial.push(status);
    }

    /// Remove the given columns. Indices may be unsorted; out-of-range
    /// indices are ignored.
    pub fn delete_columns(&mut self, indices: &[usize]) {
        retain_complement(&mut self.structural, indices);
    }

    /// Remove the given rows. Indices may be unsorted; out-of-range
    /// indices are ignored.
    pub fn delete_rows(&mut self, indices: &[usize]) {
        retain_complement(&mut self.artificial, indices);
    }

    /// Rebuild the artificial statuses for a new row layout.
    ///
    /// `source[i]` names the old row whose status the new row `i` takes, or
    /// `None` for a row that has no counterpart; those get `fresh`.
    pub fn remap_rows(&self, source: &[Option<usize>], fresh: BasisStatus) -> Self {
        let artificial = source
            .iter()
            .map(|src| {
                src.and_then(|i| self.artificial.get(i).copied())
                    .unwrap_or(fresh)
            })
            .collect();
        Self {
            structural: self.structural.clone(),
            artificial,
        }
    }
}

fn retain_complement(statuses: &mut Vec<BasisStatus>, indices: &[usize]) {
    if indices.is_empty() {
        return;
    }
    let mut drop = vec![false; statuses.len()];
    for &i in indices {
        if let Some(d) = drop.get_mut(i) {
            *d = true;
        }
    }
    let mut k = 0;
    statuses.retain(|_| {
        let keep = !drop[k];
        k += 1;
        keep
    });
}
