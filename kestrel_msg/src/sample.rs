//! Values carried over channels.

use serde::{Deserialize, Serialize};

/// One published value with its sequence id and publish time (ms ticks).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    pub sequence_id: u32,
    pub timestamp: u32,
    pub payload: T,
}

impl<T> Sample<T> {
    /// Transform the payload, keeping sequence and timestamp.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sample<U> {
        Sample {
            sequence_id: self.sequence_id,
            timestamp: self.timestamp,
            payload: f(self.payload),
        }
    }
}

/// Outcome of waiting on a topic.
#[derive(Debug, Clone, PartialEq)]
pub enum Received<T> {
    /// A sample the subscriber had not seen.
    Sample(Sample<T>),
    /// Nothing new arrived in time.
    Timeout,
}

impl<T> Received<T> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Received::Timeout)
    }

    pub fn sample(self) -> Option<Sample<T>> {
        match self {
            Received::Sample(sample) => Some(sample),
            Received::Timeout => None,
        }
    }
}

/// A request as seen by a handler. Borrows the caller's input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceRequest<'a, T> {
    pub sequence_id: u32,
    pub timestamp: u32,
    pub data: &'a T,
}

/// A handler's reply, correlated to its request by `sequence_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse<R> {
    pub sequence_id: u32,
    pub timestamp: u32,
    pub payload: R,
}

impl<R> ServiceResponse<R> {
    pub fn into_payload(self) -> R {
        self.payload
    }
}
