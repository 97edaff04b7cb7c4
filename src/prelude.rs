//! Convenient imports for cellguard.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use cellguard::prelude::*;
//!
//! let counter = Counter::spawn("hits", 0);
//! counter.increment().await?;
//! ```

// Demo runner
pub use crate::demo::{Demo, DemoBuilder, DemoConfig};

// Error handling
pub use crate::error::{Error, Result};

// Primitives
pub use crate::primitives::{Collector, Counter};

// Boundaries
pub use cellguard_concurrency::{CallerGroup, CancelToken, CellHandle, LockedCell, Step};

// Core types
pub use cellguard_core::{BoundaryConfig, Deck, Operation, StateCell, Token};
