//! Polling backend for bare-metal loops and cooperative scheduling.
//!
//! Locks are critical sections over a `RefCell`. Waits busy-poll their
//! condition and call the idle hook between polls. Time only advances
//! through [`PollingBackend::tick`], normally called from a timer interrupt;
//! without a ticking source, any wait with a non-zero timeout spins forever.
//! An idle hook that calls `tick` turns each poll into one simulated
//! millisecond, which is how host tests drive this backend.

use super::Backend;
use crate::clock::Ticks;
use crate::error::{SendError, SyncError, SyncResult};
use crate::lock::Lock;
use crate::queue::Queue;
use crate::signal::{WaitCondition, WaitOutcome};
use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use critical_section::Mutex;
use heapless::Deque;
use std::time::Duration;

static TICKS: AtomicU32 = AtomicU32::new(0);
static IDLE_HOOK: Mutex<Cell<fn()>> = Mutex::new(Cell::new(spin_hint as fn()));

fn spin_hint() {
    core::hint::spin_loop();
}

/// Critical sections, atomic flags and an externally driven tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollingBackend;

impl PollingBackend {
    /// Advance the clock by `ms` milliseconds.
    pub fn tick(ms: u32) {
        TICKS.fetch_add(ms, Ordering::AcqRel);
    }

    /// Install the function called between polls of a blocked wait.
    pub fn set_idle_hook(hook: fn()) {
        critical_section::with(|cs| IDLE_HOOK.borrow(cs).set(hook));
    }

    /// Restore the default spin hint.
    pub fn reset_idle_hook() {
        Self::set_idle_hook(spin_hint);
    }

    fn idle() {
        let hook = critical_section::with(|cs| IDLE_HOOK.borrow(cs).get());
        hook();
    }
}

impl Backend for PollingBackend {
    const NAME: &'static str = "polling";
    type Lock<T: Send> = PollingLock<T>;
    type Signal = PollingSignal;

    fn now() -> Ticks {
        Ticks(TICKS.load(Ordering::Acquire))
    }
}

/// Poll until `poll` yields a value or `timeout` elapses on the tick clock.
///
/// `poll` always runs at least once, so a zero timeout is a single attempt.
fn poll_until<R>(timeout: Duration, mut poll: impl FnMut() -> Option<R>) -> Option<R> {
    let span = Ticks::span_of(timeout);
    let start = PollingBackend::now();
    loop {
        if let Some(value) = poll() {
            return Some(value);
        }
        if PollingBackend::now().since(start) >= span {
            return None;
        }
        PollingBackend::idle();
    }
}

/// `critical_section::Mutex<RefCell<T>>` behind the [`Lock`] contract.
pub struct PollingLock<T>(Mutex<RefCell<T>>);

impl<T: Send> Lock<T> for PollingLock<T> {
    fn new(value: T) -> Self {
        Self(Mutex::new(RefCell::new(value)))
    }

    /// Runs `f` inside a critical section. Keep it short.
    fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.0.borrow_ref_mut(cs)))
    }

    fn try_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        critical_section::with(|cs| {
            self.0
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut *value))
        })
    }

    fn into_inner(self) -> T {
        self.0.into_inner().into_inner()
    }
}

/// Atomic event flag.
#[derive(Debug, Default)]
pub struct PollingSignal {
    flag: AtomicBool,
}

impl WaitCondition for PollingSignal {
    fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    fn wait(&self, timeout: Duration) -> WaitOutcome {
        match poll_until(timeout, || self.flag.swap(false, Ordering::AcqRel).then_some(())) {
            Some(()) => WaitOutcome::Signaled,
            None => WaitOutcome::TimedOut,
        }
    }

    fn is_signaled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Bounded FIFO guarded by a critical section.
pub struct PollingQueue<T, const N: usize> {
    items: Mutex<RefCell<Deque<T, N>>>,
}

impl<T, const N: usize> PollingQueue<T, N> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(RefCell::new(Deque::new())),
        }
    }
}

impl<T, const N: usize> Default for PollingQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send, const N: usize> Queue<T> for PollingQueue<T, N> {
    fn send(&self, item: T, timeout: Duration) -> Result<(), SendError<T>> {
        let mut pending = Some(item);
        poll_until(timeout, || {
            let item = pending.take()?;
            critical_section::with(|cs| match self.items.borrow_ref_mut(cs).push_back(item) {
                Ok(()) => Some(()),
                Err(item) => {
                    pending = Some(item);
                    None
                }
            })
        });
        pending.map_or(Ok(()), |item| Err(SendError(item)))
    }

    fn receive(&self, timeout: Duration) -> SyncResult<T> {
        poll_until(timeout, || {
            critical_section::with(|cs| self.items.borrow_ref_mut(cs).pop_front())
        })
        .ok_or(SyncError::Timeout)
    }

    fn len(&self) -> usize {
        critical_section::with(|cs| self.items.borrow_ref(cs).len())
    }

    fn capacity(&self) -> usize {
        N
    }
}
