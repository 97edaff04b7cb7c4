//! Core types for cellguard
//!
//! This crate defines the data model shared by every isolation boundary:
//! - [`StateCell`]: a named, versioned counter or deck with no internal locking
//! - [`Operation`]: a mutation or read request against one cell
//! - [`CellError`]: the error taxonomy (rejected, cancelled, closed)
//! - [`BoundaryConfig`]: settings for boundaries

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod operation;
pub mod state;
pub mod types;
pub mod value;

pub use config::{BoundaryConfig, DEFAULT_MAILBOX_CAPACITY};
pub use error::{CellError, FailureReason, Result};
pub use operation::{Applied, Operation, OperationKind};
pub use state::StateCell;
pub use types::{CellId, Deck, Token};
pub use value::{CellValue, ValueKind};
