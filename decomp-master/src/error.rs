//! Error types for the decomposition masters.
//!
//! Infeasibility, iteration limits and numerical trouble in the LP engine
//! are reported as [`MasterStatus`](crate::model::MasterStatus) values, not
//! errors. Errors are reserved for bad input, collaborator failures and
//! bookkeeping that has gone out of sync.

use std::fmt;

use decomp_core::EngineError;
use thiserror::Error;

/// Stable codes for structural invalid-state failures.
///
/// A node that hits one of these is abandoned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateErrorCode {
    /// An objective or bound update addressed a column past the LP's end.
    ColumnIndexOutOfRange,
    /// The column translation table does not match the LP column count.
    ColumnTableMismatch,
    /// The row layout does not match the LP row count.
    RowLayoutMismatch,
    /// The cut-row translation table does not match the LP.
    CutTableMismatch,
    /// A worker returned data for an unknown subproblem.
    UnknownSubproblem,
    /// A branching object names a column outside the original problem.
    BranchingIndexOutOfRange,
    /// An asynchronous result carried an unknown solution key.
    UnknownSolutionKey,
}

impl StateErrorCode {
    /// Numeric code reported to the driver.
    pub fn code(self) -> u32 {
        match self {
            StateErrorCode::ColumnIndexOutOfRange => 101,
            StateErrorCode::ColumnTableMismatch => 102,
            StateErrorCode::RowLayoutMismatch => 103,
            StateErrorCode::CutTableMismatch => 104,
            StateErrorCode::UnknownSubproblem => 105,
            StateErrorCode::BranchingIndexOutOfRange => 106,
            StateErrorCode::UnknownSolutionKey => 107,
        }
    }
}

impl fmt::Display for StateErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.code())
    }
}

/// Errors that can occur while coordinating a master problem.
#[derive(Error, Debug)]
pub enum DecompError {
    /// Model data failed validation.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The LP engine rejected an operation.
    #[error("LP engine error: {0}")]
    Engine(#[from] EngineError),

    /// A subproblem worker failed.
    #[error("Worker failed: {0}")]
    Worker(String),

    /// Internal bookkeeping is inconsistent; the current node is lost.
    #[error("Invalid state [{code}]: {message}")]
    InvalidState {
        /// Stable error code.
        code: StateErrorCode,
        /// Human-readable detail.
        message: String,
    },
}

impl DecompError {
    /// Build an [`DecompError::InvalidState`].
    pub fn state(code: StateErrorCode, message: impl Into<String>) -> Self {
        DecompError::InvalidState {
            code,
            message: message.into(),
        }
    }
}

/// Result type for master operations.
pub type DecompResult<T> = Result<T, DecompError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_display() {
        let err = DecompError::state(StateErrorCode::ColumnIndexOutOfRange, "column 7 of 3");
        assert_eq!(err.to_string(), "Invalid state [E101]: column 7 of 3");
    }

    #[test]
    fn test_engine_error_converts() {
        fn fails() -> DecompResult<()> {
            Err(EngineError::Backend("boom".into()))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(DecompError::Engine(_))));
    }
}
