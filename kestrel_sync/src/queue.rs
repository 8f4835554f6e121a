//! Bounded message queues.

use crate::error::{SendError, SyncResult};
use std::time::Duration;

/// A fixed-capacity FIFO shared between producers and consumers.
///
/// Items move by value. A send that cannot complete hands the item back.
pub trait Queue<T>: Send + Sync {
    /// Enqueue, waiting up to `timeout` for space.
    ///
    /// # Errors
    ///
    /// `SendError` holding the item unchanged if the queue stayed full.
    /// It converts into `SyncError::Full`.
    fn send(&self, item: T, timeout: Duration) -> Result<(), SendError<T>>;

    /// Enqueue without waiting.
    fn try_send(&self, item: T) -> Result<(), SendError<T>> {
        self.send(item, Duration::ZERO)
    }

    /// Dequeue, waiting up to `timeout` for an item.
    ///
    /// # Errors
    ///
    /// `SyncError::Timeout` if the queue stayed empty.
    fn receive(&self, timeout: Duration) -> SyncResult<T>;

    /// Dequeue without waiting.
    fn try_receive(&self) -> Option<T> {
        self.receive(Duration::ZERO).ok()
    }

    /// Items currently queued.
    fn len(&self) -> usize;

    /// Whether the queue holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity.
    fn capacity(&self) -> usize;
}
