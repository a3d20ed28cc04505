use std::time::Duration;

use web_time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

struct Scheduled<T> {
    id: TaskId,
    due: Instant,
    task: T,
}

/// Deferred work posted to the host event loop.
///
/// Tasks are data, not closures: the owner pulls them out and dispatches
/// them with whatever mutable state it holds. A "turn" runs everything that
/// was due when the turn started; tasks scheduled while a turn is being
/// processed wait for the next one.
pub struct TaskQueue<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            id,
            due: Instant::now() + delay,
            task,
        });
        id
    }

    /// Returns `true` if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        before != self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|s| s.due).min()
    }

    /// Removes every task due at `now`, in scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (due, later): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due <= now);
        self.pending = later;
        due.into_iter().map(|s| s.task).collect()
    }

    /// One event-loop turn at the current time.
    pub fn take_turn(&mut self) -> Vec<T> {
        self.take_due(Instant::now())
    }

    /// Everything still pending regardless of deadline, for settling in tests
    /// and on teardown.
    pub fn take_all(&mut self) -> Vec<T> {
        self.pending.drain(..).map(|s| s.task).collect()
    }
}
