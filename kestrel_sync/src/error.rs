//! Error types for synchronization primitives.

use thiserror::Error;

/// Result alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors reported by locks, queues, threads and the lite scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A bounded wait expired.
    #[error("operation timed out")]
    Timeout,

    /// The queue had no free slot.
    #[error("queue is full")]
    Full,

    /// The platform refused to create a thread.
    #[error("failed to spawn thread '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },

    /// A joined thread ended by panicking.
    #[error("thread '{0}' panicked")]
    ThreadPanicked(String),

    /// No task slot left in the cooperative scheduler.
    #[error("scheduler is full ({0} tasks)")]
    SchedulerFull(usize),
}

/// A send that found the queue full. Carries the rejected item back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    /// Recover the item that was not queued.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Always `SyncError::Full`.
    pub fn kind(&self) -> SyncError {
        SyncError::Full
    }
}

impl<T> From<SendError<T>> for SyncError {
    fn from(_: SendError<T>) -> Self {
        SyncError::Full
    }
}
