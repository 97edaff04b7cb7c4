//! Error types for state cell operations
//!
//! No error here is fatal. Every variant is recovered by the caller:
//! - [`CellError::OperationFailed`]: the operation was rejected and had no effect
//! - [`CellError::Cancelled`]: the caller gave up before the operation ran
//! - [`CellError::BoundaryClosed`]: the cell's worker has shut down

use crate::value::ValueKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an operation was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FailureReason {
    /// Remove/transfer of a token the deck does not hold
    #[error("token {0:?} is not in the deck")]
    MissingToken(String),

    /// Insert of a token the deck already holds
    #[error("token {0:?} is already in the deck")]
    DuplicateToken(String),

    /// Operation does not apply to this kind of cell
    #[error("expected a {expected} cell, found a {actual} cell")]
    WrongKind {
        /// Kind the operation needs
        expected: ValueKind,
        /// Kind the cell holds
        actual: ValueKind,
    },

    /// Transfer whose source and target are the same cell
    #[error("source and target are the same cell")]
    SameCell,

    /// Blank token name
    #[error("invalid token name {0:?}")]
    InvalidToken(String),

    /// Counter would leave the i64 range
    #[error("counter overflow")]
    Overflow,
}

/// Error returned by isolation boundaries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// The operation was rejected; the cell is unchanged
    #[error("operation on {cell} failed: {reason}")]
    OperationFailed {
        /// Name of the cell that rejected the operation
        cell: String,
        /// Why it was rejected
        reason: FailureReason,
    },

    /// The caller was cancelled before the operation entered the boundary
    #[error("operation on {cell} cancelled")]
    Cancelled {
        /// Name of the cell the operation targeted
        cell: String,
    },

    /// The boundary no longer accepts operations
    #[error("boundary for {cell} is closed")]
    BoundaryClosed {
        /// Name of the closed cell
        cell: String,
    },
}

impl CellError {
    /// Build an `OperationFailed` for `cell`
    pub fn failed(cell: impl Into<String>, reason: FailureReason) -> Self {
        CellError::OperationFailed {
            cell: cell.into(),
            reason,
        }
    }

    /// Build a `Cancelled` for `cell`
    pub fn cancelled(cell: impl Into<String>) -> Self {
        CellError::Cancelled { cell: cell.into() }
    }

    /// Build a `BoundaryClosed` for `cell`
    pub fn closed(cell: impl Into<String>) -> Self {
        CellError::BoundaryClosed { cell: cell.into() }
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CellError::Cancelled { .. })
    }

    /// Check if the operation was rejected by the cell
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, CellError::OperationFailed { .. })
    }

    /// The rejection reason, for `OperationFailed`
    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            CellError::OperationFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Result type for cell operations
pub type Result<T> = std::result::Result<T, CellError>;
