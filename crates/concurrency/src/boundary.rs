//! Blocking boundary trait
//!
//! Both boundary strategies can be driven from plain OS threads. This trait is
//! the seam that lets thread-based callers (and the thread-based tests) run
//! the same workload against a locked cell or an actor handle.

use crate::observe::CellWatch;
use crate::status::{BoundaryMetrics, BoundaryStatus};
use cellguard_core::{Applied, CellId, Operation, Result};

/// An isolation boundary usable from synchronous code
///
/// # Contract
///
/// - `apply` blocks until every operation queued before it has completed,
///   then runs `op` in a critical section no other operation overlaps with.
/// - A rejected operation leaves the cell unchanged.
/// - Implementations must not be called from inside an async runtime worker
///   if they block on the runtime (see `CellHandle::apply_blocking`).
pub trait SyncBoundary: Send + Sync {
    /// Id of the guarded cell
    fn id(&self) -> CellId;

    /// Name of the guarded cell
    ///
    /// Immutable metadata; never enters the critical section.
    fn name(&self) -> &str;

    /// Apply one operation and return the post-operation snapshot
    fn apply(&self, op: Operation) -> Result<Applied>;

    /// Read the current value through the boundary
    fn read(&self) -> Result<Applied> {
        self.apply(Operation::Read)
    }

    /// Current state machine position
    fn status(&self) -> BoundaryStatus;

    /// Operation counters
    fn metrics(&self) -> BoundaryMetrics;

    /// Observe committed values
    fn subscribe(&self) -> CellWatch;
}
