//! Subproblem worker interfaces.
//!
//! Workers own the scenario or block subproblems. The masters call them
//! synchronously; a worker is free to solve its subproblems in parallel
//! internally, but every call returns only when all results are in.

use decomp_core::SparseVec;

use crate::error::DecompResult;
use crate::model::Phase;

/// Solve status of a single subproblem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubproblemStatus {
    /// Solved to proven optimality.
    Optimal,
    /// Unbounded; the returned solution is an extreme ray.
    DualInfeasible,
    /// Infeasible; the node has no feasible point.
    PrimalInfeasible,
    /// Stopped early with a feasible point (gap or time limit).
    Feasible,
}

/// One subproblem result from a pricing round.
#[derive(Debug, Clone)]
pub struct GeneratedColumn {
    /// Subproblem index.
    pub subproblem: usize,

    /// Subproblem status.
    pub status: SubproblemStatus,

    /// Pricing objective `c̃ᵀx − (πᵀA)x` where `c̃` is the phase objective
    /// (zero in phase 1).
    pub objective: f64,

    /// Original objective `cᵀx` of the solution.
    pub native_cost: f64,

    /// Solution over the original columns.
    pub solution: SparseVec,
}

/// Worker for the Dantzig-Wolfe master.
pub trait SubproblemWorker {
    /// Number of subproblems (one convexity row each).
    fn num_subproblems(&self) -> usize;

    /// Price every subproblem against `price = πᵀA` over the original
    /// columns (branching-row duals already folded in).
    fn generate_columns(
        &mut self,
        phase: Phase,
        price: &[f64],
    ) -> DecompResult<Vec<GeneratedColumn>>;

    /// Push node bounds on original columns down to the subproblems.
    fn set_column_bounds(
        &mut self,
        indices: &[usize],
        lower: &[f64],
        upper: &[f64],
    ) -> DecompResult<()>;

    /// Relative optimality gap for subproblem solves.
    fn set_gap_tolerance(&mut self, tol: f64);

    /// Time limit for subproblem solves.
    fn set_time_limit(&mut self, seconds: Option<f64>);
}

/// Lagrangian evaluation of one subproblem at a multiplier vector.
#[derive(Debug, Clone)]
pub struct SubproblemEvaluation {
    /// Subproblem index.
    pub subproblem: usize,

    /// Objective of the best solution found, including `λᵀ(Hx − d)`.
    pub primal_objective: f64,

    /// Proven bound on the subproblem's Lagrangian value.
    pub dual_objective: f64,

    /// `H_s x − d_s` for every coupling row.
    pub coupling_residual: Vec<f64>,
}

/// Worker for the dual-decomposition master.
pub trait DualDecompWorker {
    /// Number of subproblems.
    fn num_subproblems(&self) -> usize;

    /// Solve every subproblem at the given multipliers.
    fn evaluate(&mut self, multipliers: &[f64]) -> DecompResult<Vec<SubproblemEvaluation>>;
}
