//! Master problem solvers.

pub mod dd;
pub mod dw;

pub use dd::{AsyncCoordinator, AsyncOutcome, Dispatch, SolutionKey, StepKind, TrustRegionMaster};
pub use dw::DwMaster;
