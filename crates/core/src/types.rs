//! Core identity types for cellguard
//!
//! This module defines the fundamental types used throughout the system:
//! - [`CellId`]: Unique, totally ordered identifier for a state cell
//! - [`Token`]: A named card held in a deck
//! - [`Deck`]: An ordered set of tokens

use crate::error::FailureReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a state cell
///
/// Ids are allocated monotonically and are never reused within a process.
/// Their total order is what lock-based transfers use to acquire two cells
/// without deadlocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(u64);

impl CellId {
    /// Allocate the next unused id
    ///
    /// # Examples
    ///
    /// ```
    /// use cellguard_core::CellId;
    ///
    /// let a = CellId::next();
    /// let b = CellId::next();
    /// assert!(a < b);
    /// ```
    pub fn next() -> Self {
        CellId(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// A card held by a collector
///
/// Tokens are compared by their text. Empty (or all-whitespace) names are
/// rejected by [`Token::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Create a token, validating that the name is not blank
    pub fn parse(name: impl Into<String>) -> Result<Self, FailureReason> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FailureReason::InvalidToken(name));
        }
        Ok(Token(name))
    }

    /// Check a token that was built without [`Token::parse`]
    pub fn validate(&self) -> Result<(), FailureReason> {
        if self.0.trim().is_empty() {
            return Err(FailureReason::InvalidToken(self.0.clone()));
        }
        Ok(())
    }

    /// The token's name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Literal names in code are trusted; blank ones are caught when they are
// inserted or transferred.
impl From<&str> for Token {
    fn from(name: &str) -> Self {
        Token(name.to_string())
    }
}

/// An ordered set of tokens
///
/// Ordering is by name so that printed decks are deterministic regardless of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck(BTreeSet<Token>);

impl Deck {
    /// Create an empty deck
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens in the deck
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the deck holds no tokens
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the deck holds `token`
    pub fn contains(&self, token: &Token) -> bool {
        self.0.contains(token)
    }

    /// Insert a token, returning false if it was already present
    pub fn insert(&mut self, token: Token) -> bool {
        self.0.insert(token)
    }

    /// Remove a token, returning false if it was absent
    pub fn remove(&mut self, token: &Token) -> bool {
        self.0.remove(token)
    }

    /// Iterate tokens in name order
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.0.iter()
    }
}

impl<T: Into<Token>> FromIterator<T> for Deck {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Deck(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", token.as_str())?;
        }
        f.write_str("}")
    }
}
