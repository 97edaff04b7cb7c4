//! Operations applied to a state cell
//!
//! An [`Operation`] is a named mutation (or read) request. It carries no
//! identity beyond its effect. Applying one yields an [`Applied`] snapshot of
//! the cell taken inside the same critical section.

use crate::types::Token;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A request against one state cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "token", rename_all = "snake_case")]
pub enum Operation {
    /// Observe the current value without mutating
    Read,
    /// Add one to a counter
    Increment,
    /// Subtract one from a counter
    Decrement,
    /// Add a token to a deck
    Insert(Token),
    /// Take a token out of a deck
    Remove(Token),
}

impl Operation {
    /// The operation's kind, without its payload
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Read => OperationKind::Read,
            Operation::Increment => OperationKind::Increment,
            Operation::Decrement => OperationKind::Decrement,
            Operation::Insert(_) => OperationKind::Insert,
            Operation::Remove(_) => OperationKind::Remove,
        }
    }

    /// Whether applying this operation can change the cell
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::Read)
    }

    /// Net change in [`CellValue::units`] when the operation succeeds
    pub fn unit_delta(&self) -> i64 {
        match self {
            Operation::Read => 0,
            Operation::Increment | Operation::Insert(_) => 1,
            Operation::Decrement | Operation::Remove(_) => -1,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert(token) => write!(f, "insert({})", token),
            Operation::Remove(token) => write!(f, "remove({})", token),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Payload-free operation discriminant
///
/// Used by boundary status reporting (`Busy(kind)`) and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// See [`Operation::Read`]
    Read,
    /// See [`Operation::Increment`]
    Increment,
    /// See [`Operation::Decrement`]
    Decrement,
    /// See [`Operation::Insert`]
    Insert,
    /// See [`Operation::Remove`]
    Remove,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Read => "read",
            OperationKind::Increment => "increment",
            OperationKind::Decrement => "decrement",
            OperationKind::Insert => "insert",
            OperationKind::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// Snapshot of a cell taken right after an operation was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applied {
    /// Observable value after the operation
    pub value: CellValue,
    /// Cell version after the operation
    ///
    /// Bumped once per successful mutation; reads leave it unchanged.
    pub version: u64,
}
