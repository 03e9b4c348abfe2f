/// Coordination Error Types
///
/// Errors raised by the cooperative primitives themselves. None of these are
/// transient: apart from [`SyncError::Closed`] they indicate a bug in the
/// caller or in the adapter.

use thiserror::Error;

use crate::task::TaskId;

/// Errors produced by [`FairLock`](crate::lock::FairLock) and
/// [`WakeGate`](crate::gate::WakeGate).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// `release()` without a matching `acquire()`
    #[error("Cannot release unacquired lock")]
    LockMisuse,

    /// A queued task was resumed while another task was at the head of the queue
    #[error("Waiting tasks woken out of order: {woken} resumed while {head} is next")]
    WokenOutOfOrder { woken: TaskId, head: TaskId },

    /// A queued task was resumed while the lock was still held
    #[error("After waking a task the lock must be unacquired (count = {count})")]
    HeldAfterWake { count: usize },

    /// A second task tried to block on a gate that already records a waiter
    #[error("Cannot block more than one task on one wake gate")]
    DoubleBlock,

    /// The gate was closed while (or before) blocking
    #[error("Gate closed")]
    Closed,
}

/// Result type alias for coordination primitives
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Check if this error signals a defect rather than an orderly shutdown
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}
