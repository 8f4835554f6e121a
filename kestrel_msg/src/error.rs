//! Channel error types.

use thiserror::Error;

/// Topic failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    /// Every subscriber slot is taken.
    #[error("topic '{topic}' already has {max} subscribers")]
    SubscriberLimit { topic: &'static str, max: usize },
}

/// Service failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// A request is already outstanding on this channel.
    #[error("service is busy")]
    Busy,

    /// No response within the caller's timeout.
    #[error("service call timed out")]
    Timeout,

    /// The request was dropped by `reset()` before a response arrived.
    #[error("request was cancelled")]
    Cancelled,

    /// No handler or server is bound.
    #[error("service has no handler")]
    Unbound,

    /// A handler or server is already bound.
    #[error("service already has a handler")]
    AlreadyBound,

    /// A response carried the wrong sequence id.
    #[error("response sequence {received} does not match request {expected}")]
    CorrelationMismatch { expected: u32, received: u32 },

    /// The channel faulted earlier and needs `reset()`.
    #[error("service is faulted")]
    Faulted,
}

pub type TopicResult<T> = Result<T, TopicError>;
pub type ServiceResult<T> = Result<T, ServiceError>;
