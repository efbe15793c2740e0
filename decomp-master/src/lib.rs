//! Master-problem coordination for decomposition methods.
//!
//! Two masters share one loop shape (solve a restricted LP, ask the
//! subproblem worker for feedback, update the restriction, test
//! termination):
//!
//! - [`DwMaster`]: Dantzig-Wolfe restricted master with two-phase column
//!   generation, reduced-cost fixing and branching-row support.
//! - [`TrustRegionMaster`]: dual-decomposition cutting-plane master with
//!   cut aging, recruitment and an adaptive trust region, driven
//!   synchronously ([`TrustRegionMaster::run`]) or through an
//!   [`AsyncCoordinator`].
//!
//! [`NonantBranching`] turns a Dantzig-Wolfe master solution into child
//! bound restrictions for an enclosing search tree.

#![warn(missing_docs)]

pub mod error;
pub mod master;
pub mod model;
pub mod pool;
pub mod search;
pub mod settings;
pub mod worker;

pub use error::{DecompError, DecompResult, StateErrorCode};
pub use master::{
    AsyncCoordinator, AsyncOutcome, Dispatch, DwMaster, SolutionKey, StepKind, TrustRegionMaster,
};
pub use model::{
    CouplingModel, IterationRecord, MasterStatus, MasterStructure, Phase, SolveRecord,
    StageColumns, TwoStageInfo, TwoStageModel,
};
pub use pool::{Column, ColumnId, ColumnPool, Cut, CutId, CutPool, CutStatus};
pub use search::{BranchDirection, BranchingObject, BranchingView, NodeState, NonantBranching};
pub use settings::{BranchSettings, DeviationMeasure, DwSettings, TrustRegionSettings};
pub use worker::{
    DualDecompWorker, GeneratedColumn, SubproblemEvaluation, SubproblemStatus, SubproblemWorker,
};
