//! Read-only change notifications
//!
//! Every boundary publishes the snapshot produced by each successful mutation
//! on a `tokio::sync::watch` channel. Observers never touch the cell: they see
//! the latest committed [`Applied`] and can wait for the next one.

use cellguard_core::{Applied, CellError, Result};
use tokio::sync::watch;

/// Publishing side, owned by a boundary
#[derive(Debug)]
pub(crate) struct Publisher {
    name: String,
    tx: watch::Sender<Applied>,
}

impl Publisher {
    pub(crate) fn new(name: &str, initial: Applied) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            name: name.to_string(),
            tx,
        }
    }

    /// Publish a committed snapshot
    ///
    /// Succeeds with or without live observers.
    pub(crate) fn publish(&self, applied: &Applied) {
        self.tx.send_replace(applied.clone());
    }

    pub(crate) fn subscribe(&self) -> CellWatch {
        CellWatch {
            name: self.name.clone(),
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer of one cell's committed values
///
/// # Example
///
/// ```ignore
/// let mut watch = handle.subscribe();
/// tokio::spawn(async move {
///     while let Ok(applied) = watch.changed().await {
///         println!("now {}", applied.value);
///     }
/// });
/// ```
#[derive(Debug, Clone)]
pub struct CellWatch {
    name: String,
    rx: watch::Receiver<Applied>,
}

impl CellWatch {
    /// Name of the observed cell
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest committed snapshot, without waiting
    pub fn current(&self) -> Applied {
        self.rx.borrow().clone()
    }

    /// Wait for the next committed snapshot
    ///
    /// Intermediate values may be skipped; the returned snapshot is always the
    /// newest one. Fails with `BoundaryClosed` once the boundary is gone.
    pub async fn changed(&mut self) -> Result<Applied> {
        self.rx
            .changed()
            .await
            .map_err(|_| CellError::closed(self.name.clone()))?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Wait until `predicate` holds for the committed value
    ///
    /// Checks the current value first.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&Applied) -> bool) -> Result<Applied> {
        let name = self.name.clone();
        let applied = self
            .rx
            .wait_for(|applied| predicate(applied))
            .await
            .map_err(|_| CellError::closed(name))?;
        Ok(applied.clone())
    }
}
