//! Mailbox-serialized state cell
//!
//! [`CellHandle`] is the actor flavour of an isolation boundary. The
//! [`StateCell`] is moved into a single worker task; callers never touch it.
//! They post operations into a bounded mailbox and await a one-shot reply.
//!
//! ## Worker loop
//!
//! ```text
//! loop:
//!   envelope <- mailbox            (Idle; later senders queue up behind)
//!   if caller cancelled: reply Cancelled, skip
//!   Busy(kind): apply, publish snapshot
//!   Idle: reply result
//! on shutdown: close mailbox, drain and answer what is queued, exit
//! ```
//!
//! ## Cancellation
//!
//! An operation whose caller was cancelled while it sat in the mailbox is
//! never applied and is answered with `Cancelled`. Once the worker has
//! started an operation it runs to completion and its result is delivered.
//! `Cancelled` therefore always means "no effect".
//!
//! ## Transfers
//!
//! A transfer is an atomic `Remove` on the source followed by an `Insert` on
//! the target. Workers never wait on each other, so opposite-direction
//! transfers cannot deadlock. The whole transfer runs on a detached task:
//! dropping the caller's future never strands a removed token. After the
//! removal the token is in flight, and if the target refuses it the token
//! goes back to the source.

use crate::boundary::SyncBoundary;
use crate::cancel::CancelToken;
use crate::observe::{CellWatch, Publisher};
use crate::status::{BoundaryMetrics, BoundaryStatus, Monitor};
use cellguard_core::{
    Applied, BoundaryConfig, CellError, CellId, FailureReason, Operation, Result, StateCell, Token,
    ValueKind,
};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

/// One queued operation
struct Envelope {
    op: Operation,
    /// Skip the operation if this token is cancelled before it starts
    cancel: Option<CancelToken>,
    /// Skip the operation if the caller stopped waiting before it starts
    abandonable: bool,
    reply: oneshot::Sender<Result<Applied>>,
}

/// State shared by every handle and the worker
struct Shared {
    id: CellId,
    name: String,
    config: BoundaryConfig,
    monitor: Monitor,
    publisher: Publisher,
    shutdown: watch::Sender<bool>,
}

/// Handle to a state cell owned by a worker task
///
/// Cloning a handle is cheap; all clones address the same cell. The worker
/// exits after [`CellHandle::shutdown`] or once every handle is dropped.
#[derive(Clone)]
pub struct CellHandle {
    shared: Arc<Shared>,
    tx: mpsc::Sender<Envelope>,
}

impl CellHandle {
    /// Spawn a worker for `cell` on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; use [`CellHandle::spawn_on`]
    /// from synchronous code.
    pub fn spawn(cell: StateCell) -> Self {
        Self::spawn_with(cell, BoundaryConfig::default())
    }

    /// Spawn with explicit settings on the current tokio runtime
    pub fn spawn_with(cell: StateCell, config: BoundaryConfig) -> Self {
        Self::spawn_on(&Handle::current(), cell, config)
    }

    /// Spawn a worker for `cell` on `runtime`
    pub fn spawn_on(runtime: &Handle, cell: StateCell, config: BoundaryConfig) -> Self {
        let capacity = config.mailbox_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            id: cell.id(),
            name: cell.name().to_string(),
            publisher: Publisher::new(cell.name(), cell.snapshot()),
            config,
            monitor: Monitor::new(),
            shutdown,
        });

        info!(cell = %shared.name, capacity, "Spawning cell worker");
        runtime.spawn(run_worker(cell, rx, shutdown_rx, Arc::clone(&shared)));
        Self { shared, tx }
    }

    /// Id of the guarded cell
    pub fn id(&self) -> CellId {
        self.shared.id
    }

    /// Name of the guarded cell
    ///
    /// Immutable metadata; answered without a round trip to the worker.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Apply one operation
    ///
    /// Waits for mailbox space, then for every operation queued earlier.
    pub async fn apply(&self, op: Operation) -> Result<Applied> {
        self.send(op, None, true).await
    }

    /// Apply one operation unless `cancel` fires before it starts
    ///
    /// Returns `Cancelled` if the token was cancelled before the operation
    /// entered the worker; in that case the cell is untouched.
    pub async fn apply_cancellable(&self, op: Operation, cancel: &CancelToken) -> Result<Applied> {
        self.send(op, Some(cancel), true).await
    }

    /// Read the current value through the worker
    pub async fn read(&self) -> Result<Applied> {
        self.apply(Operation::Read).await
    }

    /// Current counter value, read through the worker
    pub async fn counter(&self) -> Result<i64> {
        let applied = self.read().await?;
        applied.value.as_counter().ok_or_else(|| {
            CellError::failed(
                self.name(),
                FailureReason::WrongKind {
                    expected: ValueKind::Counter,
                    actual: applied.value.kind(),
                },
            )
        })
    }

    /// Apply one operation from synchronous code
    ///
    /// Blocks the current thread until the worker answers. The reply channel
    /// resumes this caller exactly once.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn apply_blocking(&self, op: Operation) -> Result<Applied> {
        let (reply, rx) = oneshot::channel();
        let envelope = Envelope {
            op,
            cancel: None,
            abandonable: true,
            reply,
        };
        self.shared.monitor.enqueue();
        if self.tx.blocking_send(envelope).is_err() {
            self.shared.monitor.abandon();
            return Err(self.closed_error());
        }
        rx.blocking_recv().map_err(|_| self.closed_error())?
    }

    /// Move `token` from this cell's deck to `target`'s deck
    ///
    /// Returns this cell's snapshot after the removal. Fails without effect if
    /// the token is blank or missing here. If `target` refuses the token, it
    /// is returned here and the target's error is reported.
    ///
    /// Once called, the transfer completes even if the returned future is
    /// dropped; use [`CellHandle::transfer_cancellable`] to stop it before
    /// the removal.
    pub async fn transfer(&self, token: impl Into<Token>, target: &CellHandle) -> Result<Applied> {
        self.transfer_inner(token.into(), target, None).await
    }

    /// [`CellHandle::transfer`], unless `cancel` fires before the removal
    pub async fn transfer_cancellable(
        &self,
        token: impl Into<Token>,
        target: &CellHandle,
        cancel: &CancelToken,
    ) -> Result<Applied> {
        self.transfer_inner(token.into(), target, Some(cancel)).await
    }

    /// Stop accepting operations
    ///
    /// Operations already in the mailbox are still applied and answered.
    pub fn shutdown(&self) {
        self.shared.shutdown.send_replace(true);
    }

    /// Check if the worker no longer accepts operations
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Wait until the worker has closed its mailbox
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// Current state machine position
    pub fn status(&self) -> BoundaryStatus {
        self.shared.monitor.status()
    }

    /// Operation counters
    pub fn metrics(&self) -> BoundaryMetrics {
        self.shared.monitor.metrics()
    }

    /// Observe committed values
    pub fn subscribe(&self) -> CellWatch {
        self.shared.publisher.subscribe()
    }

    async fn transfer_inner(
        &self,
        token: Token,
        target: &CellHandle,
        cancel: Option<&CancelToken>,
    ) -> Result<Applied> {
        if self.id() == target.id() {
            return Err(CellError::failed(self.name(), FailureReason::SameCell));
        }
        token
            .validate()
            .map_err(|reason| CellError::failed(self.name(), reason))?;

        let source = self.clone();
        let target = target.clone();
        let cancel = cancel.cloned();
        let transfer = tokio::spawn(async move {
            let removed = source
                .send(Operation::Remove(token.clone()), cancel.as_ref(), false)
                .await?;
            source.deliver(token, &target).await.map(|_| removed)
        });
        match transfer.await {
            Ok(result) => result,
            Err(e) => {
                error!(cell = %self.name(), error = %e, "Transfer task failed");
                Err(self.closed_error())
            }
        }
    }

    /// Insert an in-flight token into `target`, or return it here
    async fn deliver(&self, token: Token, target: &CellHandle) -> Result<Applied> {
        match target.send(Operation::Insert(token.clone()), None, false).await {
            Ok(inserted) => {
                debug!(from = %self.name(), to = %target.name(), token = %token, "Transferred token");
                Ok(inserted)
            }
            Err(refused) => {
                warn!(
                    from = %self.name(),
                    to = %target.name(),
                    token = %token,
                    error = %refused,
                    "Target refused token, returning it"
                );
                if let Err(e) = self.send(Operation::Insert(token.clone()), None, false).await {
                    error!(cell = %self.name(), token = %token, error = %e, "Token lost in transfer");
                }
                Err(refused)
            }
        }
    }

    async fn send(
        &self,
        op: Operation,
        cancel: Option<&CancelToken>,
        abandonable: bool,
    ) -> Result<Applied> {
        if cancel.map_or(false, CancelToken::is_cancelled) {
            return Err(CellError::cancelled(self.name()));
        }

        let (reply, rx) = oneshot::channel();
        let envelope = Envelope {
            op,
            cancel: cancel.cloned(),
            abandonable,
            reply,
        };

        self.shared.monitor.enqueue();
        let mut slot = PendingSlot {
            monitor: &self.shared.monitor,
            armed: true,
        };
        let sent = match cancel {
            Some(token) => tokio::select! {
                biased;
                sent = self.tx.send(envelope) => sent,
                _ = token.cancelled() => {
                    slot.armed = false;
                    self.shared.monitor.dequeue_cancelled();
                    return Err(CellError::cancelled(self.name()));
                }
            },
            None => self.tx.send(envelope).await,
        };
        if sent.is_err() {
            return Err(self.closed_error());
        }
        // Queued: the worker now owns the pending slot.
        slot.armed = false;

        rx.await.map_err(|_| self.closed_error())?
    }

    fn closed_error(&self) -> CellError {
        CellError::closed(self.name())
    }
}

/// Pending slot of a sender that has not reached the mailbox yet
///
/// Released on drop unless disarmed, so a caller that gives up while waiting
/// for mailbox space does not leave `pending` raised.
struct PendingSlot<'a> {
    monitor: &'a Monitor,
    armed: bool,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.monitor.abandon();
        }
    }
}

impl fmt::Debug for CellHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellHandle")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("status", &self.shared.monitor.status())
            .finish()
    }
}

impl SyncBoundary for CellHandle {
    fn id(&self) -> CellId {
        self.shared.id
    }

    fn name(&self) -> &str {
        &self.shared.name
    }

    fn apply(&self, op: Operation) -> Result<Applied> {
        self.apply_blocking(op)
    }

    fn status(&self) -> BoundaryStatus {
        self.shared.monitor.status()
    }

    fn metrics(&self) -> BoundaryMetrics {
        self.shared.monitor.metrics()
    }

    fn subscribe(&self) -> CellWatch {
        self.shared.publisher.subscribe()
    }
}

async fn run_worker(
    mut cell: StateCell,
    mut rx: mpsc::Receiver<Envelope>,
    mut shutdown: watch::Receiver<bool>,
    shared: Arc<Shared>,
) {
    loop {
        tokio::select! {
            biased;
            envelope = rx.recv() => match envelope {
                Some(envelope) => handle(&mut cell, envelope, &shared),
                None => break,
            },
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                rx.close();
                while let Some(envelope) = rx.recv().await {
                    handle(&mut cell, envelope, &shared);
                }
                break;
            }
        }
    }
    info!(
        cell = %shared.name,
        version = cell.version(),
        "Cell worker stopped"
    );
}

fn handle(cell: &mut StateCell, envelope: Envelope, shared: &Shared) {
    let Envelope {
        op,
        cancel,
        abandonable,
        reply,
    } = envelope;

    let cancelled = cancel.as_ref().map_or(false, CancelToken::is_cancelled);
    if cancelled || (abandonable && reply.is_closed()) {
        shared.monitor.dequeue_cancelled();
        debug!(cell = %shared.name, op = %op, "Skipped cancelled operation");
        let _ = reply.send(Err(CellError::cancelled(shared.name.clone())));
        return;
    }

    shared.monitor.begin(op.kind());
    let result = cell.apply(&op);
    match &result {
        Ok(applied) => {
            if op.is_mutation() {
                shared.publisher.publish(applied);
            }
            if shared.config.trace_operations {
                debug!(cell = %shared.name, op = %op, version = applied.version, "Applied");
            }
        }
        Err(e) => {
            if shared.config.trace_operations {
                debug!(cell = %shared.name, op = %op, error = %e, "Rejected");
            }
        }
    }
    shared.monitor.finish(result.is_ok());

    // The operation ran; a caller that stopped waiting simply misses the reply.
    let _ = reply.send(result);
}
