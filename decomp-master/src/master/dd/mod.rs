//! Trust-region master for dual decomposition.
//!
//! The master maximizes `Σ_s θ_s` over multipliers `λ`, where each
//! surrogate `θ_s` is bounded by cutting planes of subproblem `s`'s
//! Lagrangian. A box around the stability center keeps steps local; the
//! radius grows on good serious steps and shrinks on poor null steps.

mod asynchronous;
mod trust_region;

pub use asynchronous::{AsyncCoordinator, AsyncOutcome, Dispatch, SolutionKey};
pub use trust_region::TrustRegionMaster;

/// Outcome of folding one round of subproblem results into the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// The dual bound improved enough to move the stability center.
    Serious,
    /// The center stays; only cuts were added.
    Null,
}
