//! Sequencing guarantees of topic channels.

use kestrel_msg::prelude::*;
use kestrel_sync::HostBackend;
use proptest::prelude::*;
use std::thread;
use std::time::Duration;

type HostTopic<T> = Topic<T, HostBackend>;

#[test]
fn test_await_after_every_publish_sees_all() {
    let (mut publisher, handle) = HostTopic::<u64>::new("counter");
    let mut sub = handle.subscribe().unwrap();
    for expected in 1..=100u32 {
        publisher.publish(u64::from(expected) * 3);
        let sample = sub.await_next(Duration::from_millis(50)).sample().unwrap();
        assert_eq!(sample.sequence_id, expected);
        assert_eq!(sample.payload, u64::from(expected) * 3);
    }
}

#[test]
fn test_threaded_consumer_never_repeats() {
    let (mut publisher, handle) = HostTopic::<u32>::new("threaded");
    let mut sub = handle.subscribe().unwrap();
    let consumer = thread::spawn(move || {
        let mut seen = Vec::new();
        while let Received::Sample(sample) = sub.await_next(Duration::from_millis(200)) {
            seen.push(sample.sequence_id);
            if sample.payload == 999 {
                break;
            }
        }
        seen
    });
    for v in 0..1000 {
        publisher.publish(v);
        if v % 100 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    let seen = consumer.join().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(seen.last(), Some(&1000));
}

#[test]
fn test_handle_clone_shares_channel() {
    let (mut publisher, handle) = HostTopic::<&'static str>::new("shared");
    let other = handle.clone();
    let mut sub = other.subscribe().unwrap();
    publisher.publish("armed");
    assert_eq!(handle.current().map(|s| s.payload), Some("armed"));
    assert_eq!(sub.try_next().map(|s| s.payload), Some("armed"));
    assert_eq!(publisher.handle().sequence(), 1);
    assert_eq!(publisher.name(), "shared");
}

#[test]
fn test_timestamps_do_not_go_backwards() {
    let (mut publisher, handle) = HostTopic::<u8>::new("clock");
    let mut sub = handle.subscribe_backlog::<4>().unwrap();
    publisher.publish(0);
    thread::sleep(Duration::from_millis(3));
    publisher.publish(1);
    let a = sub.try_next().unwrap();
    let b = sub.try_next().unwrap();
    assert!(b.timestamp.wrapping_sub(a.timestamp) >= 3);
}

proptest! {
    #[test]
    fn prop_latest_subscriber_sequence_strictly_increases(
        bursts in proptest::collection::vec(0usize..5, 1..40)
    ) {
        let (mut publisher, handle) = HostTopic::<usize>::new("bursty");
        let mut latest = handle.subscribe().unwrap();
        let mut backlog = handle.subscribe_backlog::<256>().unwrap();
        let mut last = 0u32;
        let mut total = 0u32;

        for burst in bursts {
            for _ in 0..burst {
                publisher.publish(burst);
                total += 1;
            }
            match latest.try_next() {
                Some(sample) => {
                    prop_assert!(sample.sequence_id > last);
                    prop_assert_eq!(sample.sequence_id, total);
                    last = sample.sequence_id;
                }
                None => {
                    prop_assert_eq!(burst, 0);
                }
            }
        }

        let ids: Vec<u32> = std::iter::from_fn(|| backlog.try_next())
            .map(|s| s.sequence_id)
            .collect();
        prop_assert_eq!(ids, (1..=total).collect::<Vec<_>>());
        prop_assert_eq!(backlog.overruns(), 0);
    }
}
