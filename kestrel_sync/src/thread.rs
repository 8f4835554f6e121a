//! Thread creation.
//!
//! Creating a thread and starting it are separate steps: [`Thread::create`]
//! captures the spec and entry point, [`Thread::start`] hands them to the
//! platform. On the host, priority is recorded but not applied; mapping it to
//! an OS scheduling class needs privileges the workspace does not assume.

use crate::error::{SyncError, SyncResult};
use std::thread::JoinHandle;
use tracing::debug;

/// Default stack size for created threads.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Relative scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Idle,
    Low,
    #[default]
    Normal,
    High,
    Realtime,
}

/// Name, priority and stack size of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSpec {
    pub name: String,
    pub priority: Priority,
    pub stack_size: usize,
}

impl ThreadSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: Priority::Normal,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }
}

/// A created, not yet running, thread.
pub struct Thread {
    spec: ThreadSpec,
    entry: Box<dyn FnOnce() + Send + 'static>,
}

impl Thread {
    /// Capture `entry` to run under `spec`.
    pub fn create(spec: ThreadSpec, entry: impl FnOnce() + Send + 'static) -> Self {
        Self {
            spec,
            entry: Box::new(entry),
        }
    }

    pub fn spec(&self) -> &ThreadSpec {
        &self.spec
    }

    /// Spawn the thread.
    ///
    /// # Errors
    ///
    /// `SyncError::SpawnFailed` if the OS refuses the thread.
    pub fn start(self) -> SyncResult<ThreadHandle> {
        let Thread { spec, entry } = self;
        debug!(
            "Starting thread '{}' (priority={:?}, stack={} bytes)",
            spec.name, spec.priority, spec.stack_size
        );
        let inner = std::thread::Builder::new()
            .name(spec.name.clone())
            .stack_size(spec.stack_size)
            .spawn(entry)
            .map_err(|e| SyncError::SpawnFailed {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(ThreadHandle {
            name: spec.name,
            inner,
        })
    }
}

/// Handle to a running thread.
pub struct ThreadHandle {
    name: String,
    inner: JoinHandle<()>,
}

impl ThreadHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait for the thread to exit.
    ///
    /// # Errors
    ///
    /// `SyncError::ThreadPanicked` if the entry point panicked.
    pub fn join(self) -> SyncResult<()> {
        self.inner
            .join()
            .map_err(|_| SyncError::ThreadPanicked(self.name))
    }
}
