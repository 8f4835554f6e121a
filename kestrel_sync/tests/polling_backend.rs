//! Polling backend driven by a simulated tick.
//!
//! Every test installs the same idle hook, which advances the clock by one
//! millisecond per poll, so blocked waits time out deterministically.

use kestrel_sync::{
    Backend, LiteScheduler, PollingBackend, PollingQueue, PollingSignal, Queue, SendError,
    SyncError, TaskState, WaitCondition, WaitOutcome,
};
use std::rc::Rc;
use std::time::Duration;

fn simulated_tick() {
    PollingBackend::tick(1);
}

fn setup() {
    PollingBackend::set_idle_hook(simulated_tick);
}

#[test]
fn wait_times_out_after_span() {
    setup();
    let signal = PollingSignal::default();
    let start = PollingBackend::now();
    assert_eq!(signal.wait(Duration::from_millis(20)), WaitOutcome::TimedOut);
    assert!(PollingBackend::now().since(start) >= 20);
}

#[test]
fn pending_signal_returns_immediately() {
    setup();
    let signal = PollingSignal::default();
    signal.signal();
    assert_eq!(signal.wait(Duration::from_secs(60)), WaitOutcome::Signaled);
}

#[test]
fn queue_send_times_out_when_full() {
    setup();
    let queue: PollingQueue<u16, 1> = PollingQueue::new();
    queue.send(1, Duration::from_millis(5)).unwrap();
    assert_eq!(queue.send(2, Duration::from_millis(5)), Err(SendError(2)));
    assert_eq!(queue.receive(Duration::from_millis(5)), Ok(1));
    assert_eq!(
        queue.receive(Duration::from_millis(5)),
        Err(SyncError::Timeout)
    );
}

#[test]
fn cooperative_producer_consumer() {
    setup();
    let queue: Rc<PollingQueue<u32, 4>> = Rc::new(PollingQueue::new());
    let received = Rc::new(std::cell::RefCell::new(Vec::new()));
    let mut sched: LiteScheduler<2> = LiteScheduler::new();

    let tx = Rc::clone(&queue);
    let mut next = 0u32;
    sched
        .spawn("producer", move || {
            if tx.try_send(next).is_ok() {
                next += 1;
            }
            if next == 10 {
                TaskState::Done
            } else {
                TaskState::Pending
            }
        })
        .unwrap();

    let rx = Rc::clone(&queue);
    let sink = Rc::clone(&received);
    sched
        .spawn("consumer", move || {
            while let Some(value) = rx.try_receive() {
                sink.borrow_mut().push(value);
            }
            if sink.borrow().len() == 10 {
                TaskState::Done
            } else {
                TaskState::Pending
            }
        })
        .unwrap();

    assert_eq!(sched.run_until_idle(100), 0);
    assert_eq!(*received.borrow(), (0..10).collect::<Vec<_>>());
}
