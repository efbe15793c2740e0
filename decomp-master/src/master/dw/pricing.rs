//! Pricing, column coefficients and the Lagrangian bound.

use decomp_core::sparse::{sparse_vec, spmv_sparse, spmv_transpose, value_at, DROP_TOL};
use decomp_core::SparseVec;

use super::layout::RowLayout;
use crate::model::MasterStructure;
use crate::worker::SubproblemStatus;

/// `πᵀA` over original columns, with branching-row duals added on their
/// columns.
pub(crate) fn price_vector(structure: &MasterStructure, layout: &RowLayout, duals: &[f64]) -> Vec<f64> {
    let core = layout.num_core();
    let mut price = spmv_transpose(&structure.matrix, &duals[layout.num_conv..core]);
    for (row, &pi) in layout.branch.iter().zip(&duals[core..]) {
        price[row.column] += pi;
    }
    price
}

/// A subproblem result enters the master if it is a ray, or if its
/// pricing objective beats the convexity dual by more than `tol`.
pub(crate) fn prices_in(status: SubproblemStatus, objective: f64, cutoff: f64, tol: f64) -> bool {
    match status {
        SubproblemStatus::DualInfeasible => true,
        SubproblemStatus::PrimalInfeasible => false,
        SubproblemStatus::Optimal | SubproblemStatus::Feasible => objective < cutoff - tol,
    }
}

/// Master-row coefficients of a subproblem solution:
/// convexity unit entry (points only), `A x` on coupling rows, and `x` on
/// branching columns.
pub(crate) fn column_coefficients(
    structure: &MasterStructure,
    layout: &RowLayout,
    subproblem: usize,
    solution: &SparseVec,
    is_ray: bool,
) -> SparseVec {
    let mut entries: Vec<(usize, f64)> = Vec::new();
    if !is_ray {
        entries.push((subproblem, 1.0));
    }
    let ax = spmv_sparse(&structure.matrix, solution);
    entries.extend(
        ax.into_iter()
            .enumerate()
            .map(|(i, v)| (layout.num_conv + i, v)),
    );
    let core = layout.num_core();
    entries.extend(
        layout
            .branch
            .iter()
            .enumerate()
            .map(|(k, row)| (core + k, value_at(solution, row.column))),
    );
    sparse_vec(layout.num_rows(), entries, DROP_TOL)
}

/// `Σ π_i b_i` over coupling and branching rows plus `Σ_s obj_s`.
///
/// `b_i` is the row's finite lower bound, or its upper bound if the lower
/// one is infinite.
pub(crate) fn lagrangian_bound(
    structure: &MasterStructure,
    layout: &RowLayout,
    duals: &[f64],
    objectives: &[f64],
) -> f64 {
    let mut bound: f64 = objectives.iter().sum();
    for i in 0..layout.num_orig {
        let (lo, hi) = (structure.row_lower[i], structure.row_upper[i]);
        let b = if lo.is_finite() {
            lo
        } else if hi.is_finite() {
            hi
        } else {
            0.0
        };
        bound += duals[layout.num_conv + i] * b;
    }
    let core = layout.num_core();
    for (row, &pi) in layout.branch.iter().zip(&duals[core..]) {
        bound += pi * row.bound();
    }
    bound
}
