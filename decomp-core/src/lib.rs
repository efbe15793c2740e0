//! LP engine layer for the decomposition masters.
//!
//! Provides problem data, solve statuses, warm-start basis bookkeeping and
//! the [`LpEngine`] trait, plus [`ClarabelEngine`], an interior-point
//! implementation built on Clarabel.

pub mod basis;
pub mod clarabel_engine;
pub mod engine;
pub mod error;
pub mod problem;
pub mod sparse;

pub use basis::{Basis, BasisStatus};
pub use clarabel_engine::ClarabelEngine;
pub use engine::LpEngine;
pub use error::{EngineError, EngineResult};
pub use problem::{EngineSettings, LpProblem, LpStatus, ObjSense, RowSense};
pub use sparse::{SparseCsc, SparseVec};
