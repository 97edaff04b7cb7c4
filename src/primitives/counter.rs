//! Isolated counter primitive.
//!
//! A counter whose increments and decrements are serialized by a worker task.
//!
//! # Example
//!
//! ```ignore
//! use cellguard::prelude::*;
//!
//! let counter = Counter::spawn("hits", 0);
//! counter.increment().await?;
//! counter.decrement().await?;
//! assert_eq!(counter.value().await?, 0);
//! ```

use crate::error::Result;
use cellguard_concurrency::{CancelToken, CellHandle, CellWatch};
use cellguard_core::{BoundaryConfig, Operation, StateCell};

/// Counter behind an isolation boundary.
///
/// Cloning shares the same counter.
#[derive(Debug, Clone)]
pub struct Counter {
    handle: CellHandle,
}

impl Counter {
    /// Spawn a counter on the current tokio runtime.
    pub fn spawn(name: impl Into<String>, start: i64) -> Self {
        Self::spawn_with(name, start, BoundaryConfig::default())
    }

    /// Spawn a counter with explicit boundary settings.
    pub fn spawn_with(name: impl Into<String>, start: i64, config: BoundaryConfig) -> Self {
        Self {
            handle: CellHandle::spawn_with(StateCell::counter(name, start), config),
        }
    }

    /// Add one and return the new value.
    pub async fn increment(&self) -> Result<i64> {
        self.step(Operation::Increment, None).await
    }

    /// Subtract one and return the new value.
    pub async fn decrement(&self) -> Result<i64> {
        self.step(Operation::Decrement, None).await
    }

    /// Add one unless `cancel` fires first.
    pub async fn increment_cancellable(&self, cancel: &CancelToken) -> Result<i64> {
        self.step(Operation::Increment, Some(cancel)).await
    }

    /// Subtract one unless `cancel` fires first.
    pub async fn decrement_cancellable(&self, cancel: &CancelToken) -> Result<i64> {
        self.step(Operation::Decrement, Some(cancel)).await
    }

    /// Current value, read through the boundary.
    pub async fn value(&self) -> Result<i64> {
        Ok(self.handle.counter().await?)
    }

    /// Counter name. Does not enter the boundary.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Observe committed values.
    pub fn watch(&self) -> CellWatch {
        self.handle.subscribe()
    }

    /// The underlying boundary handle.
    pub fn handle(&self) -> &CellHandle {
        &self.handle
    }

    async fn step(&self, op: Operation, cancel: Option<&CancelToken>) -> Result<i64> {
        let applied = match cancel {
            Some(cancel) => self.handle.apply_cancellable(op, cancel).await?,
            None => self.handle.apply(op).await?,
        };
        // Counter cells always hold counters.
        Ok(applied.value.units())
    }
}
