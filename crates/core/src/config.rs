//! Boundary configuration

use serde::{Deserialize, Serialize};

/// Default mailbox capacity for actor boundaries
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Settings shared by every isolation boundary
///
/// # Example
///
/// ```
/// use cellguard_core::BoundaryConfig;
///
/// let config = BoundaryConfig::default().mailbox_capacity(8);
/// assert_eq!(config.mailbox_capacity, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Maximum number of queued operations before senders wait
    ///
    /// Only used by mailbox-based boundaries. Clamped to at least 1.
    pub mailbox_capacity: usize,

    /// Emit a `debug!` event for every applied operation
    pub trace_operations: bool,
}

impl BoundaryConfig {
    /// Set the mailbox capacity
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity.max(1);
        self
    }

    /// Enable or disable per-operation debug events
    pub fn trace_operations(mut self, enabled: bool) -> Self {
        self.trace_operations = enabled;
        self
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            trace_operations: true,
        }
    }
}
