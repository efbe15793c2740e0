//! Model structures and status types shared by the masters.

mod coupling;
mod status;
mod structure;

pub use coupling::CouplingModel;
pub use status::{IterationRecord, MasterStatus, Phase, SolveRecord};
pub use structure::{MasterStructure, StageColumns, TwoStageInfo, TwoStageModel};
