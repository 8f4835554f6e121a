//! Channels on the polling backend, driven by a simulated tick.

use kestrel_msg::prelude::*;
use kestrel_sync::{Backend, LiteScheduler, PollingBackend, TaskState};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn simulated_tick() {
    PollingBackend::tick(1);
}

#[test]
fn test_await_times_out_on_ticks() {
    PollingBackend::set_idle_hook(simulated_tick);
    let (_publisher, handle) = Topic::<i16, PollingBackend>::new("idle");
    let mut sub = handle.subscribe().unwrap();
    let start = PollingBackend::now();
    assert!(sub.await_next(Duration::from_millis(25)).is_timeout());
    assert!(PollingBackend::now().since(start) >= 25);
}

#[test]
fn test_inline_service_on_polling() {
    PollingBackend::set_idle_hook(simulated_tick);
    let service = Service::<i32, i32, PollingBackend>::new("negate");
    service.bind(|req| -*req.data).unwrap();
    let mut client = service.client();
    let response = client.call(&5, Duration::from_millis(10)).unwrap();
    assert_eq!((response.sequence_id, response.payload), (1, -5));
}

#[test]
fn test_lite_tasks_exchange_samples() {
    PollingBackend::set_idle_hook(simulated_tick);
    let (mut publisher, handle) = Topic::<u32, PollingBackend>::new("lite");
    let mut backlog = handle.subscribe_backlog::<4>().unwrap();
    let collected = Rc::new(RefCell::new(Vec::new()));
    let mut sched: LiteScheduler<2> = LiteScheduler::new();

    let mut next = 0;
    sched
        .spawn("sampler", move || {
            publisher.publish(next);
            next += 1;
            if next == 6 {
                TaskState::Done
            } else {
                TaskState::Pending
            }
        })
        .unwrap();

    let sink = Rc::clone(&collected);
    sched
        .spawn("logger", move || {
            if let Received::Sample(sample) = backlog.await_next(Duration::ZERO) {
                sink.borrow_mut().push(sample.payload);
            }
            if sink.borrow().len() == 6 {
                TaskState::Done
            } else {
                TaskState::Pending
            }
        })
        .unwrap();

    assert_eq!(sched.run_until_idle(50), 0);
    assert_eq!(*collected.borrow(), vec![0, 1, 2, 3, 4, 5]);
}
