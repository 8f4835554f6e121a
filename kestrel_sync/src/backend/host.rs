//! Preemptive host backend on `parking_lot` and `std::thread`.

use super::Backend;
use crate::clock::Ticks;
use crate::error::{SendError, SyncError, SyncResult};
use crate::lock::Lock;
use crate::queue::Queue;
use crate::signal::{WaitCondition, WaitOutcome};
use heapless::Deque;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Threads, parking_lot mutexes and condition variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostBackend;

impl Backend for HostBackend {
    const NAME: &'static str = "host";
    type Lock<T: Send> = HostLock<T>;
    type Signal = HostSignal;

    /// Milliseconds since the first call in this process.
    fn now() -> Ticks {
        Ticks(EPOCH.get_or_init(Instant::now).elapsed().as_millis() as u32)
    }
}

/// Wait on `condvar` until `ready` holds or `timeout` expires.
///
/// Returns the final value of `ready`.
fn wait_while<T>(
    condvar: &Condvar,
    guard: &mut MutexGuard<'_, T>,
    timeout: Duration,
    mut ready: impl FnMut(&T) -> bool,
) -> bool {
    if ready(&**guard) {
        return true;
    }
    let Some(deadline) = Instant::now().checked_add(timeout) else {
        while !ready(&**guard) {
            condvar.wait(guard);
        }
        return true;
    };
    while !ready(&**guard) {
        if condvar.wait_until(guard, deadline).timed_out() {
            return ready(&**guard);
        }
    }
    true
}

/// `parking_lot::Mutex` behind the [`Lock`] contract.
#[derive(Debug, Default)]
pub struct HostLock<T>(Mutex<T>);

impl<T: Send> Lock<T> for HostLock<T> {
    fn new(value: T) -> Self {
        Self(Mutex::new(value))
    }

    fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *self.0.lock())
    }

    fn try_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.0.try_lock().map(|mut guard| f(&mut *guard))
    }

    fn into_inner(self) -> T {
        self.0.into_inner()
    }
}

/// Flag plus condition variable.
#[derive(Debug, Default)]
pub struct HostSignal {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl WaitCondition for HostSignal {
    fn signal(&self) {
        *self.flag.lock() = true;
        self.cond.notify_all();
    }

    fn wait(&self, timeout: Duration) -> WaitOutcome {
        let mut flag = self.flag.lock();
        if wait_while(&self.cond, &mut flag, timeout, |set| *set) {
            *flag = false;
            WaitOutcome::Signaled
        } else {
            WaitOutcome::TimedOut
        }
    }

    fn is_signaled(&self) -> bool {
        *self.flag.lock()
    }

    fn clear(&self) {
        *self.flag.lock() = false;
    }
}

/// Bounded FIFO with blocking send and receive.
pub struct HostQueue<T, const N: usize> {
    items: Mutex<Deque<T, N>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T, const N: usize> HostQueue<T, N> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Deque::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }
}

impl<T, const N: usize> Default for HostQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send, const N: usize> Queue<T> for HostQueue<T, N> {
    fn send(&self, item: T, timeout: Duration) -> Result<(), SendError<T>> {
        let mut items = self.items.lock();
        if !wait_while(&self.not_full, &mut items, timeout, |q| !q.is_full()) {
            return Err(SendError(item));
        }
        items.push_back(item).map_err(SendError)?;
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> SyncResult<T> {
        let mut items = self.items.lock();
        if !wait_while(&self.not_empty, &mut items, timeout, |q| !q.is_empty()) {
            return Err(SyncError::Timeout);
        }
        let item = items.pop_front().ok_or(SyncError::Timeout)?;
        drop(items);
        self.not_full.notify_one();
        Ok(item)
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }

    fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_gives_exclusive_access() {
        let lock = Arc::new(HostLock::new(0u32));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        lock.lock(|v| *v += 1);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(Arc::try_unwrap(lock).ok().unwrap().into_inner(), 4000);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let lock = HostLock::new(5);
        let nested = lock.lock(|_| lock.try_lock(|v| *v));
        assert_eq!(nested, None);
        assert_eq!(lock.try_lock(|v| *v), Some(5));
    }

    #[test]
    fn signal_is_sticky() {
        let signal = HostSignal::default();
        signal.signal();
        signal.signal();
        assert!(signal.is_signaled());
        assert_eq!(signal.wait(Duration::ZERO), WaitOutcome::Signaled);
        assert_eq!(signal.wait(Duration::from_millis(5)), WaitOutcome::TimedOut);
    }

    #[test]
    fn signal_wakes_waiter() {
        let signal = Arc::new(HostSignal::default());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(10));
        signal.signal();
        assert_eq!(waiter.join().unwrap(), WaitOutcome::Signaled);
    }

    #[test]
    fn queue_full_returns_item() {
        let queue: HostQueue<u8, 2> = HostQueue::new();
        assert!(queue.try_send(1).is_ok());
        assert!(queue.try_send(2).is_ok());
        let rejected = queue.send(3, Duration::from_millis(5)).unwrap_err();
        assert_eq!(rejected.kind(), SyncError::Full);
        assert_eq!(SyncError::from(rejected), SyncError::Full);
        assert_eq!(rejected.into_inner(), 3);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_receive(), Some(1));
        assert_eq!(queue.receive(Duration::ZERO), Ok(2));
        assert_eq!(queue.receive(Duration::from_millis(5)), Err(SyncError::Timeout));
    }

    #[test]
    fn queue_blocks_until_space() {
        let queue: Arc<HostQueue<u32, 1>> = Arc::new(HostQueue::new());
        queue.try_send(1).unwrap();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.send(2, Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(10));
        assert_eq!(queue.receive(Duration::from_secs(1)), Ok(1));
        assert_eq!(producer.join().unwrap(), Ok(()));
        assert_eq!(queue.receive(Duration::from_secs(1)), Ok(2));
    }

    #[test]
    fn clock_is_monotonic() {
        let a = HostBackend::now();
        thread::sleep(Duration::from_millis(5));
        let b = HostBackend::now();
        assert!(b.since(a) >= 5);
    }
}
