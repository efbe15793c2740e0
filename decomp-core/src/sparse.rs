//! Sparse vector and matrix helpers.
//!
//! Columns, cuts and structural matrices are stored with `sprs` types.
//! Every constructor here produces sorted, duplicate-free storage so the
//! results can be handed to `sprs` without further checks.

use sprs::{CsMat, CsVec, TriMat};

/// Sparse matrix in CSC format.
pub type SparseCsc = CsMat<f64>;

/// Sparse vector (sorted indices).
pub type SparseVec = CsVec<f64>;

/// Entries with magnitude at or below this are dropped by [`sparse_vec`].
pub const DROP_TOL: f64 = 1e-10;

/// Build a sparse CSC matrix from triplets (row, col, value).
pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> SparseCsc
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Build a sparse vector of dimension `dim` from (index, value) pairs.
///
/// Pairs are sorted, duplicate indices are summed, and entries whose
/// magnitude ends up at or below `drop_tol` are removed. Indices at or
/// beyond `dim` are ignored.
pub fn sparse_vec<I>(dim: usize, entries: I, drop_tol: f64) -> SparseVec
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut pairs: Vec<(usize, f64)> = entries.into_iter().filter(|&(i, _)| i < dim).collect();
    pairs.sort_by_key(|&(i, _)| i);

    let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
    let mut data: Vec<f64> = Vec::with_capacity(pairs.len());
    for (i, v) in pairs {
        match (indices.last(), data.last_mut()) {
            (Some(&last), Some(acc)) if last == i => *acc += v,
            _ => {
                indices.push(i);
                data.push(v);
            }
        }
    }

    let (indices, data): (Vec<usize>, Vec<f64>) = indices
        .into_iter()
        .zip(data)
        .filter(|&(_, v)| v.abs() > drop_tol)
        .unzip();

    CsVec::new(dim, indices, data)
}

/// Empty sparse vector of dimension `dim`.
pub fn empty_vec(dim: usize) -> SparseVec {
    CsVec::new(dim, Vec::new(), Vec::new())
}

/// Value stored at `index`, or zero.
pub fn value_at(v: &SparseVec, index: usize) -> f64 {
    v.get(index).copied().unwrap_or(0.0)
}

/// Dot product of a sparse vector with a dense slice.
///
/// Entries whose index falls outside `dense` contribute nothing.
pub fn dot_dense(v: &SparseVec, dense: &[f64]) -> f64 {
    v.iter()
        .filter_map(|(i, &a)| dense.get(i).map(|&x| a * x))
        .sum()
}

/// y = A x for a CSC matrix and dense x.
pub fn spmv(a: &SparseCsc, x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; a.rows()];
    for (val, (row, col)) in a.iter() {
        y[row] += *val * x[col];
    }
    y
}

/// y = A x for a CSC matrix and sparse x.
pub fn spmv_sparse(a: &SparseCsc, x: &SparseVec) -> Vec<f64> {
    let mut y = vec![0.0; a.rows()];
    for (val, (row, col)) in a.iter() {
        if let Some(&xc) = x.get(col) {
            y[row] += *val * xc;
        }
    }
    y
}

/// y = Aᵀ x for a CSC matrix and dense x.
pub fn spmv_transpose(a: &SparseCsc, x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; a.cols()];
    for (val, (row, col)) in a.iter() {
        y[col] += *val * x[row];
    }
    y
}
