//! Boundary state machine and counters
//!
//! A boundary is either `Idle` or `Busy(kind)`. Operations that arrive while it
//! is busy wait (in a lock queue or a mailbox) and are counted as pending.
//!
//! ```text
//! Idle --begin(op)--> Busy(op.kind) --finish--> Idle
//! ```

use cellguard_core::OperationKind;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Observable state of an isolation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryStatus {
    /// No operation in its critical section
    Idle,
    /// One operation in its critical section
    Busy(OperationKind),
}

impl BoundaryStatus {
    /// Check if an operation is running
    pub fn is_busy(&self) -> bool {
        matches!(self, BoundaryStatus::Busy(_))
    }
}

impl fmt::Display for BoundaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryStatus::Idle => f.write_str("idle"),
            BoundaryStatus::Busy(kind) => write!(f, "busy({})", kind),
        }
    }
}

/// Point-in-time counters for a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundaryMetrics {
    /// Operations applied successfully
    pub applied: u64,
    /// Operations rejected by the cell
    pub rejected: u64,
    /// Operations dropped because their caller was cancelled
    pub cancelled: u64,
    /// Operations waiting to enter the boundary
    pub pending: usize,
}

/// Tracks the state machine and counters of one boundary
///
/// Owned by the boundary; transitions are only driven from inside the
/// critical section, so `begin`/`finish` never interleave for one monitor.
#[derive(Debug)]
pub(crate) struct Monitor {
    status: Mutex<BoundaryStatus>,
    pending: AtomicUsize,
    applied: AtomicU64,
    rejected: AtomicU64,
    cancelled: AtomicU64,
}

impl Monitor {
    pub(crate) fn new() -> Self {
        Self {
            status: Mutex::new(BoundaryStatus::Idle),
            pending: AtomicUsize::new(0),
            applied: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
        }
    }

    pub(crate) fn status(&self) -> BoundaryStatus {
        *self.status.lock()
    }

    /// An operation started waiting for the boundary
    pub(crate) fn enqueue(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// A waiting operation left the queue without running
    pub(crate) fn dequeue_cancelled(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// A waiting operation could not be delivered (boundary closed)
    pub(crate) fn abandon(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Idle -> Busy
    pub(crate) fn begin(&self, kind: OperationKind) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        let mut status = self.status.lock();
        debug_assert_eq!(*status, BoundaryStatus::Idle, "overlapping critical sections");
        *status = BoundaryStatus::Busy(kind);
    }

    /// Busy -> Idle
    pub(crate) fn finish(&self, ok: bool) {
        if ok {
            self.applied.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        *self.status.lock() = BoundaryStatus::Idle;
    }

    pub(crate) fn metrics(&self) -> BoundaryMetrics {
        BoundaryMetrics {
            applied: self.applied.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::SeqCst),
        }
    }
}
