//! Concurrency layer for cellguard
//!
//! This crate implements isolation boundaries around a [`StateCell`]:
//! - LockedCell: mutex-serialized, driven from OS threads
//! - CellHandle: mailbox-serialized worker task, driven from async callers
//! - CallerGroup: task group of caller scripts with shared cancellation
//! - RacyCounter / RiskyCollector: unguarded baselines that lose updates
//!   and duplicate tokens under contention
//!
//! [`StateCell`]: cellguard_core::StateCell

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actor;
pub mod boundary;
pub mod caller;
pub mod cancel;
pub mod locked;
pub mod naive;
pub mod observe;
pub mod status;

pub use actor::CellHandle;
pub use boundary::SyncBoundary;
pub use caller::{run_on_threads, CallerGroup, CallerId, CallerReport, Outcome, Step};
pub use cancel::CancelToken;
pub use locked::LockedCell;
pub use naive::{RaceWindow, RacyCounter, RiskyCollector};
pub use observe::CellWatch;
pub use status::{BoundaryMetrics, BoundaryStatus};
