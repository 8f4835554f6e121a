//! Wait conditions.

use std::time::Duration;

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition was signaled; the signal has been consumed.
    Signaled,
    /// The timeout elapsed first.
    TimedOut,
}

impl WaitOutcome {
    pub fn is_signaled(self) -> bool {
        matches!(self, WaitOutcome::Signaled)
    }
}

/// A sticky event flag.
///
/// `signal` sets the flag and wakes a waiter; a signal raised while nobody
/// waits is kept until the next `wait` consumes it. Signals do not count:
/// several `signal` calls before one `wait` are consumed by that single wait.
pub trait WaitCondition: Send + Sync {
    /// Set the flag and wake waiters.
    fn signal(&self);

    /// Block until the flag is set or `timeout` elapses; clears the flag on
    /// success.
    fn wait(&self, timeout: Duration) -> WaitOutcome;

    /// Peek at the flag without consuming it.
    fn is_signaled(&self) -> bool;

    /// Drop a pending signal.
    fn clear(&self);
}
