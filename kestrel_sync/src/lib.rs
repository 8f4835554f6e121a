//! # Kestrel Sync
//!
//! The concurrency contract the rest of the workspace is written against:
//! a mutual-exclusion [`Lock`], a sticky [`WaitCondition`] with timeout, a
//! bounded [`Queue`], and thread creation. Two backends implement it:
//!
//! - [`HostBackend`]: preemptive, built on `parking_lot` and `std::thread`.
//! - [`PollingBackend`]: interrupt-masking critical sections and busy
//!   waits driven by an external tick, for bare-metal loops and the
//!   cooperative [`LiteScheduler`].
//!
//! Messaging code is generic over [`Backend`], so the same topic and service
//! implementations run on either model.

pub mod backend;
pub mod clock;
pub mod error;
pub mod lite;
pub mod lock;
pub mod queue;
pub mod signal;
pub mod thread;

pub use backend::Backend;
pub use backend::host::{HostBackend, HostLock, HostQueue, HostSignal};
pub use backend::polling::{PollingBackend, PollingLock, PollingQueue, PollingSignal};
pub use clock::{Deadline, Ticks};
pub use error::{SendError, SyncError, SyncResult};
pub use lite::{LiteScheduler, TaskState};
pub use lock::Lock;
pub use queue::Queue;
pub use signal::{WaitCondition, WaitOutcome};
pub use thread::{Priority, Thread, ThreadHandle, ThreadSpec};
