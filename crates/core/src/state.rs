//! State cell
//!
//! [`StateCell`] is the unit of shared mutable state. It has no internal
//! synchronization: `apply` takes `&mut self`, so whoever owns the cell (a
//! lock guard or an actor's worker loop) is its isolation boundary.

use crate::error::{CellError, FailureReason, Result};
use crate::operation::{Applied, Operation};
use crate::types::{CellId, Deck};
use crate::value::{CellValue, ValueKind};
use serde::{Deserialize, Serialize};

/// A named, versioned value
///
/// Each state cell has:
/// - An id (unique, totally ordered)
/// - A name (for logs and error messages)
/// - A value (counter or deck)
/// - A version number (starts at 0, +1 per successful mutation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCell {
    id: CellId,
    name: String,
    value: CellValue,
    version: u64,
}

impl StateCell {
    /// Create a cell holding `value` at version 0
    pub fn new(name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            id: CellId::next(),
            name: name.into(),
            value: value.into(),
            version: 0,
        }
    }

    /// Create a counter cell
    pub fn counter(name: impl Into<String>, start: i64) -> Self {
        Self::new(name, CellValue::Counter(start))
    }

    /// Create a deck cell
    pub fn deck(name: impl Into<String>, deck: Deck) -> Self {
        Self::new(name, CellValue::Deck(deck))
    }

    /// The cell's id
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The cell's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Snapshot of the current value and version
    pub fn snapshot(&self) -> Applied {
        Applied {
            value: self.value.clone(),
            version: self.version,
        }
    }

    /// Apply one operation
    ///
    /// All checks run before any mutation, so a rejected operation leaves the
    /// cell (value and version) exactly as it was.
    pub fn apply(&mut self, op: &Operation) -> Result<Applied> {
        let name = self.name.as_str();
        let version = self.version;
        let reject = |reason: FailureReason| CellError::failed(name, reason);
        match (op, &mut self.value) {
            (Operation::Read, value) => {
                return Ok(Applied {
                    value: value.clone(),
                    version,
                })
            }
            (Operation::Increment, CellValue::Counter(n)) => {
                *n = n.checked_add(1).ok_or_else(|| reject(FailureReason::Overflow))?;
            }
            (Operation::Decrement, CellValue::Counter(n)) => {
                *n = n.checked_sub(1).ok_or_else(|| reject(FailureReason::Overflow))?;
            }
            (Operation::Insert(token), CellValue::Deck(deck)) => {
                token.validate().map_err(reject)?;
                if deck.contains(token) {
                    return Err(reject(FailureReason::DuplicateToken(token.to_string())));
                }
                deck.insert(token.clone());
            }
            (Operation::Remove(token), CellValue::Deck(deck)) => {
                if !deck.remove(token) {
                    return Err(reject(FailureReason::MissingToken(token.to_string())));
                }
            }
            (Operation::Insert(_) | Operation::Remove(_), CellValue::Counter(_)) => {
                return Err(reject(FailureReason::WrongKind {
                    expected: ValueKind::Deck,
                    actual: ValueKind::Counter,
                }));
            }
            (Operation::Increment | Operation::Decrement, CellValue::Deck(_)) => {
                return Err(reject(FailureReason::WrongKind {
                    expected: ValueKind::Counter,
                    actual: ValueKind::Deck,
                }));
            }
        }
        self.version += 1;
        Ok(self.snapshot())
    }
}
