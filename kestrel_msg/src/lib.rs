//! # Kestrel Messaging
//!
//! Typed data distribution between modules:
//!
//! - [`topic`]: single-producer, multi-consumer broadcast of timestamped,
//!   sequence-numbered samples. Subscribers see the freshest sample, or every
//!   sample through a bounded backlog.
//! - [`service`]: request/response with per-client sequence numbers and
//!   response correlation, served inline or from another execution context.
//!
//! Both are generic over a [`kestrel_sync::Backend`], so the same channel code
//! runs under threads, bare-metal polling loops or the lite scheduler.
//!
//! ```rust
//! use kestrel_msg::prelude::*;
//! use kestrel_sync::HostBackend;
//! use std::time::Duration;
//!
//! let (mut publisher, handle) = Topic::<f32, HostBackend>::new("battery_voltage");
//! let mut subscriber = handle.subscribe().unwrap();
//! publisher.publish(12.4);
//! let received = subscriber.await_next(Duration::from_millis(10));
//! assert_eq!(received.sample().map(|s| s.payload), Some(12.4));
//! ```

pub mod error;
pub mod sample;
pub mod sequence;
pub mod service;
pub mod topic;

mod backlog;

pub use backlog::BacklogSubscriber;

pub mod prelude {
    pub use crate::BacklogSubscriber;
    pub use crate::error::{ServiceError, TopicError};
    pub use crate::sample::{Received, Sample, ServiceRequest, ServiceResponse};
    pub use crate::sequence::SequenceCounter;
    pub use crate::service::{
        Delivery, PendingRequest, Service, ServiceClient, ServiceServer, ServiceState,
    };
    pub use crate::topic::{Publisher, Subscriber, Topic, TopicHandle};
}
