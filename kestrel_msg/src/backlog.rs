//! Subscribers that keep every sample.

use crate::error::TopicResult;
use crate::sample::{Received, Sample};
use crate::topic::{Sink, TopicInner};
use heapless::Deque;
use kestrel_sync::{Backend, Deadline, Lock, WaitCondition};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

struct Ring<T, const N: usize> {
    samples: Deque<Sample<T>, N>,
    overruns: u64,
}

pub(crate) struct BacklogSink<T: Send + 'static, B: Backend, const N: usize> {
    ring: B::Lock<Ring<T, N>>,
    signal: B::Signal,
}

impl<T: Clone + Send + 'static, B: Backend, const N: usize> Sink<T> for BacklogSink<T, B, N> {
    /// Append, dropping the oldest sample when the ring is full.
    fn deliver(&self, sample: &Sample<T>) {
        self.ring.lock(|ring| {
            if let Err(sample) = ring.samples.push_back(sample.clone()) {
                ring.samples.pop_front();
                ring.overruns += 1;
                let _ = ring.samples.push_back(sample);
            }
        });
        self.signal.signal();
    }
}

/// Consumer that receives every publish, in order, through an `N`-deep ring.
///
/// When the consumer falls more than `N` samples behind, the oldest are
/// dropped and counted in [`overruns`](Self::overruns).
pub struct BacklogSubscriber<T: Send + 'static, B: Backend, const N: usize> {
    topic: Arc<TopicInner<T, B>>,
    sink: Arc<BacklogSink<T, B, N>>,
}

impl<T: Clone + Send + 'static, B: Backend, const N: usize> BacklogSubscriber<T, B, N> {
    pub(crate) fn attach(topic: &Arc<TopicInner<T, B>>) -> TopicResult<Self> {
        const { assert!(N > 0, "backlog depth must be non-zero") };
        let sink = Arc::new(BacklogSink::<T, B, N> {
            ring: Lock::new(Ring {
                samples: Deque::new(),
                overruns: 0,
            }),
            signal: B::Signal::default(),
        });
        let as_sink: Arc<dyn Sink<T>> = sink.clone();
        topic.attach(Arc::downgrade(&as_sink))?;
        debug!("Backlog subscriber ({}) on '{}'", N, topic.name());
        Ok(Self {
            topic: Arc::clone(topic),
            sink,
        })
    }

    /// Wait up to `timeout` for the next queued sample.
    pub fn await_next(&mut self, timeout: Duration) -> Received<T> {
        let deadline = Deadline::new(B::now(), timeout);
        loop {
            if let Some(sample) = self.try_next() {
                return Received::Sample(sample);
            }
            let Some(remaining) = deadline.remaining(B::now()) else {
                return Received::Timeout;
            };
            self.sink.signal.wait(remaining);
        }
    }

    /// Pop the oldest queued sample without waiting.
    pub fn try_next(&mut self) -> Option<Sample<T>> {
        self.sink.ring.lock(|ring| ring.samples.pop_front())
    }

    /// Samples waiting to be taken.
    pub fn len(&self) -> usize {
        self.sink.ring.lock(|ring| ring.samples.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Samples dropped because the ring was full.
    pub fn overruns(&self) -> u64 {
        self.sink.ring.lock(|ring| ring.overruns)
    }

    /// Latest published sample, queued or not.
    pub fn current(&self) -> Option<Sample<T>> {
        self.topic.latest()
    }

    pub fn topic(&self) -> &'static str {
        self.topic.name()
    }
}

#[cfg(test)]
mod tests {
    use crate::topic::Topic;
    use kestrel_sync::HostBackend;
    use std::time::Duration;

    #[test]
    fn test_receives_every_sample_in_order() {
        let (mut publisher, handle) = Topic::<u32, HostBackend>::new("backlog");
        let mut sub = handle.subscribe_backlog::<8>().unwrap();
        for v in 10..15 {
            publisher.publish(v);
        }
        assert_eq!(sub.len(), 5);
        let seen: Vec<_> = std::iter::from_fn(|| sub.try_next())
            .map(|s| (s.sequence_id, s.payload))
            .collect();
        assert_eq!(seen, vec![(1, 10), (2, 11), (3, 12), (4, 13), (5, 14)]);
        assert_eq!(sub.overruns(), 0);
        assert!(sub.await_next(Duration::from_millis(2)).is_timeout());
    }

    #[test]
    fn test_overrun_drops_oldest() {
        let (mut publisher, handle) = Topic::<u32, HostBackend>::new("overrun");
        let mut sub = handle.subscribe_backlog::<3>().unwrap();
        for v in 0..5 {
            publisher.publish(v);
        }
        assert_eq!(sub.overruns(), 2);
        assert_eq!(sub.capacity(), 3);
        let first = sub.await_next(Duration::ZERO).sample().unwrap();
        assert_eq!(first.payload, 2);
        assert_eq!(sub.current().map(|s| s.payload), Some(4));
    }
}
