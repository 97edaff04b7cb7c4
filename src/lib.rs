//! # cellguard
//!
//! Isolated mutable state for concurrent callers.
//!
//! cellguard wraps a counter or a card deck in an isolation boundary: a
//! single worker task owns the state and applies one operation at a time,
//! so concurrent callers can never interleave a read with someone else's
//! write.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cellguard::prelude::*;
//!
//! // Counters
//! let counter = Counter::spawn("hits", 0);
//! counter.increment().await?;
//! counter.decrement().await?;
//! assert_eq!(counter.value().await?, 0);
//!
//! // Card trades
//! let sam = Collector::spawn("sam", ["car", "boat"]);
//! let tim = Collector::spawn("tim", Vec::<&str>::new());
//! sam.send("car", &tim).await?;
//! ```
//!
//! ## Layers
//!
//! 1. **Primitives** - [`Counter`] and [`Collector`] for everyday use
//! 2. **Boundaries** - [`CellHandle`] (async worker) and [`LockedCell`]
//!    (mutex, OS threads) over any [`StateCell`]
//! 3. **Baselines** - [`RacyCounter`] and [`RiskyCollector`], unguarded
//!    variants that lose updates and duplicate cards under contention
//!
//! The [`Demo`] runner puts the guarded and unguarded variants side by side.

#![warn(missing_docs)]

mod demo;
mod error;
mod primitives;

pub mod prelude;

// Re-export main entry points
pub use demo::{
    CounterReport, Demo, DemoBuilder, DemoConfig, TradeOutcome, TradeReport, MAX_PAIRS,
};
pub use error::{Error, Result};

// Re-export primitives
pub use primitives::{Collector, Counter};

// Re-export boundary layer
pub use cellguard_concurrency::{
    run_on_threads, BoundaryMetrics, BoundaryStatus, CallerGroup, CallerId, CallerReport,
    CancelToken, CellHandle, CellWatch, LockedCell, Outcome, RaceWindow, RacyCounter,
    RiskyCollector, Step, SyncBoundary,
};

// Re-export core types
pub use cellguard_core::{
    Applied, BoundaryConfig, CellError, CellId, CellValue, Deck, FailureReason, Operation,
    OperationKind, StateCell, Token, ValueKind,
};
