//! Cell value model
//!
//! A state cell holds exactly one of two shapes of data:
//! - `Counter`: a signed integer mutated by increments and decrements
//! - `Deck`: a set of tokens mutated by inserts and removals
//!
//! The shape of a cell never changes after creation.

use crate::types::Deck;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value held by a state cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    /// Signed counter
    Counter(i64),
    /// Set of tokens
    Deck(Deck),
}

impl CellValue {
    /// The shape of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            CellValue::Counter(_) => ValueKind::Counter,
            CellValue::Deck(_) => ValueKind::Deck,
        }
    }

    /// Counter value, if this is a counter
    pub fn as_counter(&self) -> Option<i64> {
        match self {
            CellValue::Counter(n) => Some(*n),
            CellValue::Deck(_) => None,
        }
    }

    /// Deck, if this is a deck
    pub fn as_deck(&self) -> Option<&Deck> {
        match self {
            CellValue::Deck(deck) => Some(deck),
            CellValue::Counter(_) => None,
        }
    }

    /// Number of units held: the counter value, or the number of tokens
    ///
    /// Used by conservation checks that sum over many cells.
    pub fn units(&self) -> i64 {
        match self {
            CellValue::Counter(n) => *n,
            CellValue::Deck(deck) => deck.len() as i64,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Counter(n) => write!(f, "{}", n),
            CellValue::Deck(deck) => write!(f, "{}", deck),
        }
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Counter(n)
    }
}

impl From<Deck> for CellValue {
    fn from(deck: Deck) -> Self {
        CellValue::Deck(deck)
    }
}

/// Shape of a cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Signed counter
    Counter,
    /// Set of tokens
    Deck,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Counter => f.write_str("counter"),
            ValueKind::Deck => f.write_str("deck"),
        }
    }
}
