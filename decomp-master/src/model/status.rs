//! Master statuses, phases and per-iteration records.

use decomp_core::LpStatus;

/// Phase of the Dantzig-Wolfe master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Minimize total infeasibility with auxiliary columns.
    Feasibility,
    /// Minimize the real objective.
    Optimality,
}

/// Terminal or current status of a master solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterStatus {
    /// Converged to the gap tolerance.
    Optimal,
    /// Feasible; converged by bound comparison or stopped early with a
    /// feasible restricted master.
    Feasible,
    /// No feasible combination of columns exists at this node.
    PrimalInfeasible,
    /// The restricted master is unbounded.
    DualInfeasible,
    /// Iteration or time limit; bounds are still valid relaxation bounds.
    IterOrTimeLimit,
    /// The LP engine gave up.
    Abort,
    /// `solve` has not run.
    #[default]
    NotSolved,
}

impl MasterStatus {
    /// True for statuses that carry a usable master solution.
    pub fn is_feasible(self) -> bool {
        matches!(self, MasterStatus::Optimal | MasterStatus::Feasible)
    }
}

impl From<LpStatus> for MasterStatus {
    fn from(status: LpStatus) -> Self {
        match status {
            LpStatus::Optimal => MasterStatus::Optimal,
            LpStatus::Feasible => MasterStatus::Feasible,
            LpStatus::PrimalInfeasible => MasterStatus::PrimalInfeasible,
            LpStatus::DualInfeasible => MasterStatus::DualInfeasible,
            LpStatus::IterOrTimeLimit => MasterStatus::IterOrTimeLimit,
            LpStatus::Abort => MasterStatus::Abort,
            LpStatus::NotSolved => MasterStatus::NotSolved,
        }
    }
}

/// One Dantzig-Wolfe master iteration.
#[derive(Debug, Clone)]
pub struct IterationRecord {
    /// Iteration counter within the current `solve`.
    pub iteration: usize,

    /// Phase the iteration ran in.
    pub phase: Phase,

    /// LP status of the restricted master.
    pub status: LpStatus,

    /// Restricted master objective.
    pub primal_bound: f64,

    /// Best dual bound after the iteration.
    pub dual_bound: f64,

    /// LP rows at the time.
    pub num_rows: usize,

    /// LP columns at the time.
    pub num_cols: usize,

    /// Seconds since `solve` started.
    pub wall_time: f64,
}

/// One trust-region master LP solve.
#[derive(Debug, Clone)]
pub struct SolveRecord {
    /// LP status.
    pub status: LpStatus,

    /// Master objective (upper bound on the dual function in the region).
    pub primal_bound: f64,

    /// Best dual bound at the time of the solve.
    pub dual_bound: f64,

    /// Master solution (thetas then multipliers).
    pub solution: Vec<f64>,

    /// Seconds spent in the LP engine.
    pub wall_time: f64,
}
