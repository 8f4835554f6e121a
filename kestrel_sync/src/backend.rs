//! Backend selection.
//!
//! A [`Backend`] bundles the lock and wait-condition types of one execution
//! model plus its clock. Generic code names primitives through the backend
//! (`B::Lock<T>`, `B::Signal`) and never touches the platform directly.

use crate::clock::Ticks;
use crate::lock::Lock;
use crate::signal::WaitCondition;

pub mod host;
pub mod polling;

/// One execution model's primitive set.
pub trait Backend: Send + Sync + 'static {
    /// Short name for logs.
    const NAME: &'static str;

    /// Mutual exclusion over `T`.
    type Lock<T: Send>: Lock<T>;

    /// Sticky event flag.
    type Signal: WaitCondition + Default;

    /// Current clock value.
    fn now() -> Ticks;
}
