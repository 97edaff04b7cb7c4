//! Unified error types for cellguard.
//!
//! This module provides a clean error type that wraps the boundary errors and
//! presents a consistent interface to users.

use cellguard_core::CellError;
use thiserror::Error;

/// All cellguard errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation rejected by a cell (missing token, wrong kind, ...)
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// Caller cancelled before the operation ran
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Boundary no longer accepts operations
    #[error("closed: {0}")]
    Closed(String),

    /// Invalid demo or boundary configuration
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error (runtime construction)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for cellguard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    /// Check if a cell rejected the operation.
    ///
    /// Rejected operations had no effect and are safe to ignore.
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, Error::OperationFailed(_))
    }

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}

// Convert from boundary errors
impl From<CellError> for Error {
    fn from(e: CellError) -> Self {
        match e {
            CellError::OperationFailed { .. } => Error::OperationFailed(e.to_string()),
            CellError::Cancelled { cell } => Error::Cancelled(cell),
            CellError::BoundaryClosed { cell } => Error::Closed(cell),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
