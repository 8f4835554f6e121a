//! Sequenced single-producer broadcast.
//!
//! [`Topic::new`] returns the one [`Publisher`] for a channel plus a
//! clonable [`TopicHandle`] for consumers. Each publish stamps the sample with
//! the next sequence id and the backend clock, stores it as the latest value
//! and signals every subscriber.
//!
//! A [`Subscriber`] sees the freshest sample: if several publishes land
//! between two waits, the intermediate ones are skipped. Consumers that must
//! see every sample use a [`BacklogSubscriber`](crate::BacklogSubscriber).

use crate::backlog::BacklogSubscriber;
use crate::error::{TopicError, TopicResult};
use crate::sample::{Received, Sample};
use crate::sequence::SequenceCounter;
use kestrel_common::consts::MAX_SUBSCRIBERS;
use kestrel_sync::{Backend, Deadline, Lock, WaitCondition};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Something notified on every publish.
pub(crate) trait Sink<T>: Send + Sync {
    fn deliver(&self, sample: &Sample<T>);
}

struct TopicState<T> {
    latest: Option<Sample<T>>,
    sequence: SequenceCounter,
}

type SinkList<T> = heapless::Vec<Weak<dyn Sink<T>>, MAX_SUBSCRIBERS>;

/// Shared channel state. One lock for the sample, one for the sink list.
pub(crate) struct TopicInner<T: Send + 'static, B: Backend> {
    name: &'static str,
    state: B::Lock<TopicState<T>>,
    sinks: B::Lock<SinkList<T>>,
}

impl<T: Clone + Send + 'static, B: Backend> TopicInner<T, B> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Lock::new(TopicState {
                latest: None,
                sequence: SequenceCounter::new(),
            }),
            sinks: Lock::new(heapless::Vec::new()),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    /// Register a sink, pruning dropped ones first.
    pub(crate) fn attach(&self, sink: Weak<dyn Sink<T>>) -> TopicResult<()> {
        self.sinks.lock(|sinks| {
            sinks.retain(|s| s.strong_count() > 0);
            sinks.push(sink).map_err(|_| TopicError::SubscriberLimit {
                topic: self.name,
                max: MAX_SUBSCRIBERS,
            })
        })
    }

    pub(crate) fn sequence(&self) -> u32 {
        self.state.lock(|s| s.sequence.current())
    }

    pub(crate) fn latest(&self) -> Option<Sample<T>> {
        self.state.lock(|s| s.latest.clone())
    }

    /// Latest sample if its id differs from `last_seen`.
    fn fresh(&self, last_seen: u32) -> Option<Sample<T>> {
        self.state.lock(|s| {
            s.latest
                .as_ref()
                .filter(|latest| latest.sequence_id != last_seen)
                .cloned()
        })
    }

    fn subscriber_count(&self) -> usize {
        self.sinks
            .lock(|sinks| sinks.iter().filter(|s| s.strong_count() > 0).count())
    }

    fn publish(&self, payload: T) -> Sample<T> {
        let timestamp = B::now().raw();
        let sample = self.state.lock(|state| {
            let sample = Sample {
                sequence_id: state.sequence.advance(),
                timestamp,
                payload,
            };
            state.latest = Some(sample.clone());
            sample
        });

        // Deliver outside the sink lock.
        let live: heapless::Vec<Arc<dyn Sink<T>>, MAX_SUBSCRIBERS> = self.sinks.lock(|sinks| {
            sinks.retain(|s| s.strong_count() > 0);
            sinks.iter().filter_map(Weak::upgrade).collect()
        });
        for sink in &live {
            sink.deliver(&sample);
        }
        sample
    }
}

/// Constructor namespace for topic channels.
pub struct Topic<T, B> {
    _marker: PhantomData<fn() -> (T, B)>,
}

impl<T: Clone + Send + 'static, B: Backend> Topic<T, B> {
    /// Create a channel named `name`.
    pub fn new(name: &'static str) -> (Publisher<T, B>, TopicHandle<T, B>) {
        let inner = Arc::new(TopicInner::new(name));
        debug!("Created topic '{}' ({} backend)", name, B::NAME);
        (
            Publisher {
                inner: Arc::clone(&inner),
            },
            TopicHandle { inner },
        )
    }
}

/// The single producer of a topic.
pub struct Publisher<T: Send + 'static, B: Backend> {
    inner: Arc<TopicInner<T, B>>,
}

impl<T: Clone + Send + 'static, B: Backend> Publisher<T, B> {
    /// Publish `payload` and wake subscribers. Returns its sequence id.
    pub fn publish(&mut self, payload: T) -> u32 {
        let sample = self.inner.publish(payload);
        trace!(
            "Published '{}' #{} at {}",
            self.inner.name, sample.sequence_id, sample.timestamp
        );
        sample.sequence_id
    }

    /// A consumer handle for this topic.
    pub fn handle(&self) -> TopicHandle<T, B> {
        TopicHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn sequence(&self) -> u32 {
        self.inner.sequence()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }
}

/// Consumer-side access to a topic.
pub struct TopicHandle<T: Send + 'static, B: Backend> {
    inner: Arc<TopicInner<T, B>>,
}

impl<T: Send + 'static, B: Backend> Clone for TopicHandle<T, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static, B: Backend> TopicHandle<T, B> {
    /// Subscribe for the freshest sample.
    ///
    /// The new subscriber treats everything published so far as seen.
    ///
    /// # Errors
    ///
    /// `TopicError::SubscriberLimit` when all slots are in use.
    pub fn subscribe(&self) -> TopicResult<Subscriber<T, B>> {
        let sink = Arc::new(LatestSink::<B> {
            signal: B::Signal::default(),
        });
        let as_sink: Arc<dyn Sink<T>> = sink.clone();
        self.inner.attach(Arc::downgrade(&as_sink))?;
        let last_seen = self.inner.sequence();
        debug!(
            "Subscribed to '{}' at #{} ({} subscribers)",
            self.inner.name,
            last_seen,
            self.inner.subscriber_count()
        );
        Ok(Subscriber {
            topic: Arc::clone(&self.inner),
            sink,
            last_seen,
        })
    }

    /// Subscribe with an `N`-deep backlog that keeps every sample.
    ///
    /// # Errors
    ///
    /// `TopicError::SubscriberLimit` when all slots are in use.
    pub fn subscribe_backlog<const N: usize>(&self) -> TopicResult<BacklogSubscriber<T, B, N>> {
        BacklogSubscriber::attach(&self.inner)
    }

    /// Latest sample, seen or not.
    pub fn current(&self) -> Option<Sample<T>> {
        self.inner.latest()
    }

    /// Sequence id of the latest publish (0 before the first).
    pub fn sequence(&self) -> u32 {
        self.inner.sequence()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }
}

struct LatestSink<B: Backend> {
    signal: B::Signal,
}

impl<T, B: Backend> Sink<T> for LatestSink<B> {
    fn deliver(&self, _sample: &Sample<T>) {
        self.signal.signal();
    }
}

/// Freshest-sample consumer. Dropping it frees its subscriber slot.
pub struct Subscriber<T: Send + 'static, B: Backend> {
    topic: Arc<TopicInner<T, B>>,
    sink: Arc<LatestSink<B>>,
    last_seen: u32,
}

impl<T: Clone + Send + 'static, B: Backend> Subscriber<T, B> {
    /// Wait up to `timeout` for a sample newer than the last one seen.
    ///
    /// A sample published before the call but not yet seen returns at once.
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

    /// Take an unseen sample without waiting.
    pub fn try_next(&mut self) -> Option<Sample<T>> {
        let sample = self.topic.fresh(self.last_seen)?;
        self.last_seen = sample.sequence_id;
        Some(sample)
    }

    /// Whether a publish happened since the last sample taken.
    pub fn has_update(&self) -> bool {
        self.topic.sequence() != self.last_seen
    }

    /// Latest sample without marking it seen.
    pub fn current(&self) -> Option<Sample<T>> {
        self.topic.latest()
    }

    /// Sequence id of the last sample taken.
    pub fn last_seen(&self) -> u32 {
        self.last_seen
    }

    pub fn topic(&self) -> &'static str {
        self.topic.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_sync::HostBackend;
    use std::thread;

    type TestTopic = Topic<i32, HostBackend>;

    #[test]
    fn test_first_publish_is_sequence_one() {
        let (mut publisher, handle) = TestTopic::new("answer");
        let mut early = handle.subscribe().unwrap();
        assert_eq!(handle.sequence(), 0);
        assert!(handle.current().is_none());

        assert_eq!(publisher.publish(42), 1);

        let received = early.await_next(Duration::from_millis(10)).sample().unwrap();
        assert_eq!(received.sequence_id, 1);
        assert_eq!(received.payload, 42);

        let mut late = handle.subscribe().unwrap();
        assert!(!late.has_update());
        assert!(late.try_next().is_none());
        assert_eq!(late.current().map(|s| s.payload), Some(42));
    }

    #[test]
    fn test_timeout_is_not_stale_sample() {
        let (mut publisher, handle) = TestTopic::new("stale");
        let mut sub = handle.subscribe().unwrap();
        publisher.publish(1);
        assert!(sub.await_next(Duration::ZERO).sample().is_some());
        assert!(sub.await_next(Duration::from_millis(5)).is_timeout());
    }

    #[test]
    fn test_intermediate_samples_skipped() {
        let (mut publisher, handle) = TestTopic::new("skip");
        let mut sub = handle.subscribe().unwrap();
        for v in 0..5 {
            publisher.publish(v);
        }
        let sample = sub.try_next().unwrap();
        assert_eq!((sample.sequence_id, sample.payload), (5, 4));
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_wakes_blocked_subscriber() {
        let (mut publisher, handle) = TestTopic::new("wake");
        let mut sub = handle.subscribe().unwrap();
        let consumer = thread::spawn(move || sub.await_next(Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(10));
        publisher.publish(7);
        let sample = consumer.join().unwrap().sample().unwrap();
        assert_eq!(sample.payload, 7);
    }

    #[test]
    fn test_subscriber_limit_and_release() {
        let (publisher, handle) = TestTopic::new("crowded");
        let mut subs: Vec<_> = (0..MAX_SUBSCRIBERS)
            .map(|_| handle.subscribe().unwrap())
            .collect();
        assert_eq!(publisher.subscriber_count(), MAX_SUBSCRIBERS);
        assert!(matches!(
            handle.subscribe(),
            Err(TopicError::SubscriberLimit { topic: "crowded", .. })
        ));

        subs.pop();
        assert_eq!(handle.subscriber_count(), MAX_SUBSCRIBERS - 1);
        assert!(handle.subscribe().is_ok());
    }
}
