//! Caller tasks
//!
//! A caller runs a script of steps against one boundary, one step at a time,
//! awaiting each result before issuing the next. Callers share nothing but
//! the boundaries they talk to.
//!
//! Two ways to run a batch of callers:
//! - [`CallerGroup`]: async callers on the tokio runtime, grouped in a
//!   `JoinSet` and cancellable through one [`CancelToken`]
//! - [`run_on_threads`]: one OS thread per caller against any
//!   [`SyncBoundary`], released together by a barrier

use crate::actor::CellHandle;
use crate::boundary::SyncBoundary;
use crate::cancel::CancelToken;
use cellguard_core::{Applied, CellError, Operation, Result, Token};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Barrier};
use std::thread;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Identifier of a caller within its group
pub type CallerId = usize;

/// One step of a caller script
#[derive(Clone)]
pub enum Step {
    /// Apply an operation to the caller's cell
    Apply(Operation),
    /// Move a token from the caller's cell to another cell
    Transfer {
        /// Token to move
        token: Token,
        /// Receiving cell
        to: CellHandle,
    },
}

impl Step {
    /// Net change to the caller's own cell when the step succeeds
    pub fn unit_delta(&self) -> i64 {
        match self {
            Step::Apply(op) => op.unit_delta(),
            Step::Transfer { .. } => -1,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Apply(op) => write!(f, "{}", op),
            Step::Transfer { token, to } => write!(f, "transfer({} -> {})", token, to.name()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<Operation> for Step {
    fn from(op: Operation) -> Self {
        Step::Apply(op)
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The step took effect
    Applied {
        /// Step description
        step: String,
        /// Cell version after the step
        version: u64,
    },
    /// The step was rejected or could not be delivered
    Failed {
        /// Step description
        step: String,
        /// Error message
        reason: String,
    },
    /// The caller was cancelled before the step ran
    Cancelled {
        /// Step description
        step: String,
    },
}

/// What one caller did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallerReport {
    /// Caller id
    pub caller: CallerId,
    /// Steps that took effect
    pub applied: usize,
    /// Steps that were rejected
    pub failed: usize,
    /// Steps skipped because of cancellation
    pub cancelled: usize,
    /// Sum of [`Step::unit_delta`] over applied steps
    pub net_delta: i64,
    /// Per-step outcomes, in script order
    pub outcomes: Vec<Outcome>,
}

impl CallerReport {
    fn new(caller: CallerId) -> Self {
        Self {
            caller,
            ..Self::default()
        }
    }

    fn record(&mut self, step: &Step, result: &Result<Applied>) {
        let label = step.to_string();
        let outcome = match result {
            Ok(applied) => {
                self.applied += 1;
                self.net_delta += step.unit_delta();
                Outcome::Applied {
                    step: label,
                    version: applied.version,
                }
            }
            Err(CellError::Cancelled { .. }) => {
                self.cancelled += 1;
                Outcome::Cancelled { step: label }
            }
            Err(e) => {
                self.failed += 1;
                Outcome::Failed {
                    step: label,
                    reason: e.to_string(),
                }
            }
        };
        self.outcomes.push(outcome);
    }
}

/// A group of async callers that finish together
///
/// # Example
///
/// ```ignore
/// let mut group = CallerGroup::new();
/// group.spawn(counter.clone(), vec![Operation::Increment.into()]);
/// group.spawn(counter.clone(), vec![Operation::Decrement.into()]);
/// let reports = group.join_all().await;
/// ```
pub struct CallerGroup {
    tasks: JoinSet<CallerReport>,
    cancel: CancelToken,
    next_id: CallerId,
}

impl CallerGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: CancelToken::new(),
            next_id: 0,
        }
    }

    /// Spawn a caller running `script` against `cell`
    ///
    /// The caller starts immediately. Returns its id.
    pub fn spawn(&mut self, cell: CellHandle, script: Vec<Step>) -> CallerId {
        let id = self.next_id;
        self.next_id += 1;
        let cancel = self.cancel.clone();
        self.tasks.spawn(run_caller(id, cell, script, cancel));
        id
    }

    /// Token shared by every caller in the group
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Cancel every caller
    ///
    /// Steps already running complete; remaining steps report `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Number of callers spawned so far
    pub fn len(&self) -> usize {
        self.next_id
    }

    /// Check if no caller was spawned
    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    /// Wait for every caller and return their reports, ordered by id
    ///
    /// A panic inside a caller is propagated to the joining task.
    pub async fn join_all(mut self) -> Vec<CallerReport> {
        let mut reports = Vec::with_capacity(self.next_id);
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => warn!(error = %e, "Caller task did not finish"),
            }
        }
        reports.sort_by_key(|r| r.caller);
        reports
    }
}

impl Default for CallerGroup {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_caller(
    id: CallerId,
    cell: CellHandle,
    script: Vec<Step>,
    cancel: CancelToken,
) -> CallerReport {
    let mut report = CallerReport::new(id);
    for step in &script {
        let result = match step {
            Step::Apply(op) => cell.apply_cancellable(op.clone(), &cancel).await,
            Step::Transfer { token, to } => {
                cell.transfer_cancellable(token.clone(), to, &cancel).await
            }
        };
        report.record(step, &result);
    }
    debug!(
        caller = id,
        cell = %cell.name(),
        applied = report.applied,
        failed = report.failed,
        cancelled = report.cancelled,
        "Caller finished"
    );
    report
}

/// Run one OS thread per script against `boundary`
///
/// All threads wait on a barrier and start together. Reports are ordered by
/// script index.
pub fn run_on_threads<B>(boundary: Arc<B>, scripts: Vec<Vec<Operation>>) -> Vec<CallerReport>
where
    B: SyncBoundary + ?Sized + 'static,
{
    let barrier = Arc::new(Barrier::new(scripts.len().max(1)));
    let handles: Vec<_> = scripts
        .into_iter()
        .enumerate()
        .map(|(id, script)| {
            let boundary = Arc::clone(&boundary);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut report = CallerReport::new(id);
                for op in script {
                    let result = boundary.apply(op.clone());
                    report.record(&Step::Apply(op), &result);
                }
                report
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| match h.join() {
            Ok(report) => report,
            Err(panic) => std::panic::resume_unwind(panic),
        })
        .collect()
}
