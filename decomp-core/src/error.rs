//! Error types for the LP engine layer.

use thiserror::Error;

/// Errors raised by an [`LpEngine`](crate::LpEngine) implementation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Problem data is malformed (dimension mismatch, inverted bounds, NaN).
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// A row or column index does not exist in the loaded problem.
    #[error("{kind} index {index} out of range (size {size})")]
    IndexOutOfRange {
        /// "row" or "column".
        kind: &'static str,
        /// Offending index.
        index: usize,
        /// Current dimension.
        size: usize,
    },

    /// A warm-start basis does not fit the loaded problem.
    #[error("Warm start rejected: {0}")]
    WarmStart(String),

    /// The underlying solver refused the problem or its settings.
    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Result type for LP engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
