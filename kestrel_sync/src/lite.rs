//! Cooperative run-to-yield scheduler.
//!
//! Tasks are closures polled in spawn order. A task runs until it returns,
//! which is its yield point, and reports whether it has more work. Tasks
//! must not block: consumers poll with zero timeouts instead of waiting.

use crate::error::{SyncError, SyncResult};
use heapless::Vec;
use tracing::debug;

/// What a task reports after each poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Poll again next round.
    Pending,
    /// Never poll again.
    Done,
}

struct LiteTask {
    name: &'static str,
    poll: Box<dyn FnMut() -> TaskState>,
    done: bool,
    polls: u64,
}

/// Fixed-capacity round-robin scheduler with up to `N` tasks.
pub struct LiteScheduler<const N: usize> {
    tasks: Vec<LiteTask, N>,
    rounds: u64,
}

impl<const N: usize> LiteScheduler<N> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            rounds: 0,
        }
    }

    /// Add a task.
    ///
    /// # Errors
    ///
    /// `SyncError::SchedulerFull` once `N` tasks are registered.
    pub fn spawn(
        &mut self,
        name: &'static str,
        task: impl FnMut() -> TaskState + 'static,
    ) -> SyncResult<()> {
        self.tasks
            .push(LiteTask {
                name,
                poll: Box::new(task),
                done: false,
                polls: 0,
            })
            .map_err(|_| SyncError::SchedulerFull(N))
    }

    /// Poll every unfinished task once. Returns how many remain pending.
    pub fn run_once(&mut self) -> usize {
        self.rounds += 1;
        for task in self.tasks.iter_mut().filter(|t| !t.done) {
            task.polls += 1;
            if (task.poll)() == TaskState::Done {
                debug!("Lite task '{}' done after {} polls", task.name, task.polls);
                task.done = true;
            }
        }
        self.pending()
    }

    /// Run rounds until every task is done or `max_rounds` is reached.
    /// Returns how many tasks remain pending.
    pub fn run_until_idle(&mut self, max_rounds: usize) -> usize {
        for _ in 0..max_rounds {
            if self.run_once() == 0 {
                break;
            }
        }
        self.pending()
    }

    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.done).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Rounds run so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Times the named task has been polled.
    pub fn polls(&self, name: &str) -> Option<u64> {
        self.tasks.iter().find(|t| t.name == name).map(|t| t.polls)
    }
}

impl<const N: usize> Default for LiteScheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}
