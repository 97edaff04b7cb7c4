//! Lock-serialized state cell
//!
//! [`LockedCell`] is the mutex flavour of an isolation boundary. Every
//! operation runs with the cell's lock held, so critical sections never
//! overlap and the lock's wait queue plays the role of the mailbox.
//!
//! ## Transfers
//!
//! ```text
//! 1. Reject same-cell transfers and blank tokens
//! 2. Lock both cells in CellId order (no lock-order inversion)
//! 3. Check the target accepts the token
//! 4. Remove from source (fails if the token is missing)
//! 5. Insert into target
//! 6. Publish both snapshots, release both locks
//! ```
//!
//! Steps 3-5 happen under both locks, so a concurrent observer never sees the
//! token in both decks or in neither.

use crate::boundary::SyncBoundary;
use crate::observe::{CellWatch, Publisher};
use crate::status::{BoundaryMetrics, BoundaryStatus, Monitor};
use cellguard_core::{
    Applied, BoundaryConfig, CellError, CellId, FailureReason, Operation, OperationKind, Result,
    StateCell, Token, ValueKind,
};
use parking_lot::Mutex;
use tracing::debug;

/// A state cell guarded by a mutex
///
/// # Thread Safety
///
/// `LockedCell` is `Send + Sync`; share it with `Arc`. All reads and writes of
/// the inner [`StateCell`] go through [`LockedCell::apply`] or
/// [`LockedCell::transfer`]; there is no accessor that hands out the cell.
#[derive(Debug)]
pub struct LockedCell {
    id: CellId,
    name: String,
    config: BoundaryConfig,
    cell: Mutex<StateCell>,
    monitor: Monitor,
    publisher: Publisher,
}

impl LockedCell {
    /// Guard `cell` with default settings
    pub fn new(cell: StateCell) -> Self {
        Self::with_config(cell, BoundaryConfig::default())
    }

    /// Guard `cell` with explicit settings
    pub fn with_config(cell: StateCell, config: BoundaryConfig) -> Self {
        let publisher = Publisher::new(cell.name(), cell.snapshot());
        Self {
            id: cell.id(),
            name: cell.name().to_string(),
            config,
            cell: Mutex::new(cell),
            monitor: Monitor::new(),
            publisher,
        }
    }

    /// Apply one operation under the lock
    pub fn apply(&self, op: Operation) -> Result<Applied> {
        self.monitor.enqueue();
        let mut cell = self.cell.lock();
        self.monitor.begin(op.kind());

        let result = cell.apply(&op);
        self.commit(&op, &result);
        result
    }

    /// Read the current value under the lock
    pub fn read(&self) -> Result<Applied> {
        self.apply(Operation::Read)
    }

    /// Move `token` from this cell's deck to `target`'s deck
    ///
    /// Returns this cell's snapshot after the removal. On any failure neither
    /// cell changes.
    pub fn transfer(&self, token: impl Into<Token>, target: &LockedCell) -> Result<Applied> {
        let token = token.into();
        if self.id == target.id {
            return Err(CellError::failed(self.name.clone(), FailureReason::SameCell));
        }
        token
            .validate()
            .map_err(|reason| CellError::failed(self.name.clone(), reason))?;

        self.monitor.enqueue();
        target.monitor.enqueue();
        let (mut source_guard, mut target_guard) = if self.id < target.id {
            let source = self.cell.lock();
            let target = target.cell.lock();
            (source, target)
        } else {
            let target = target.cell.lock();
            let source = self.cell.lock();
            (source, target)
        };
        self.monitor.begin(OperationKind::Remove);
        target.monitor.begin(OperationKind::Insert);

        let result = move_token(&mut source_guard, &mut target_guard, &token);
        match &result {
            Ok((removed, inserted)) => {
                self.publisher.publish(removed);
                target.publisher.publish(inserted);
                debug!(
                    from = %self.name,
                    to = %target.name,
                    token = %token,
                    "Transferred token"
                );
            }
            Err(e) => {
                debug!(from = %self.name, to = %target.name, error = %e, "Transfer rejected");
            }
        }
        let ok = result.is_ok();
        self.monitor.finish(ok);
        target.monitor.finish(ok);
        result.map(|(removed, _)| removed)
    }

    /// Id of the guarded cell
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Name of the guarded cell
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state machine position
    pub fn status(&self) -> BoundaryStatus {
        self.monitor.status()
    }

    /// Operation counters
    pub fn metrics(&self) -> BoundaryMetrics {
        self.monitor.metrics()
    }

    /// Observe committed values
    pub fn subscribe(&self) -> CellWatch {
        self.publisher.subscribe()
    }

    /// Take the cell back out of the boundary
    pub fn into_inner(self) -> StateCell {
        self.cell.into_inner()
    }

    fn commit(&self, op: &Operation, result: &Result<Applied>) {
        match result {
            Ok(applied) => {
                if op.is_mutation() {
                    self.publisher.publish(applied);
                }
                if self.config.trace_operations {
                    debug!(cell = %self.name, op = %op, version = applied.version, "Applied");
                }
            }
            Err(e) => {
                if self.config.trace_operations {
                    debug!(cell = %self.name, op = %op, error = %e, "Rejected");
                }
            }
        }
        self.monitor.finish(result.is_ok());
    }
}

/// Remove from `source` then insert into `target`, all-or-nothing
fn move_token(
    source: &mut StateCell,
    target: &mut StateCell,
    token: &Token,
) -> Result<(Applied, Applied)> {
    match target.value().as_deck() {
        None => {
            return Err(CellError::failed(
                target.name(),
                FailureReason::WrongKind {
                    expected: ValueKind::Deck,
                    actual: target.value().kind(),
                },
            ))
        }
        Some(deck) if deck.contains(token) => {
            return Err(CellError::failed(
                target.name(),
                FailureReason::DuplicateToken(token.to_string()),
            ))
        }
        Some(_) => {}
    }

    let removed = source.apply(&Operation::Remove(token.clone()))?;
    match target.apply(&Operation::Insert(token.clone())) {
        Ok(inserted) => Ok((removed, inserted)),
        Err(e) => {
            // Put the token back; the source held it a moment ago.
            source.apply(&Operation::Insert(token.clone()))?;
            Err(e)
        }
    }
}

impl SyncBoundary for LockedCell {
    fn id(&self) -> CellId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, op: Operation) -> Result<Applied> {
        LockedCell::apply(self, op)
    }

    fn status(&self) -> BoundaryStatus {
        self.monitor.status()
    }

    fn metrics(&self) -> BoundaryMetrics {
        self.monitor.metrics()
    }

    fn subscribe(&self) -> CellWatch {
        self.publisher.subscribe()
    }
}
