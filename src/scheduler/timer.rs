//! Deadline-ordered task queue shared by the hosts.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use super::Task;

/// A deferred task keyed by deadline. `Ord` is reversed so the earliest
/// `(due, sequence)` pair sits on top of the max-heap.
struct Timer {
    due: Instant,
    /// Monotonic enqueue counter; breaks ties so equal deadlines stay FIFO
    sequence: u64,
    task: Task,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Timer {}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

/// Pending tasks ordered by (deadline, enqueue order)
#[derive(Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<Timer>,
    sequence: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, delay: Duration, task: Task) {
        self.push_at(Instant::now() + delay, task);
    }

    pub(crate) fn push_at(&mut self, due: Instant, task: Task) {
        let sequence = self.sequence;
        self.sequence += 1;
        self.heap.push(Timer {
            due,
            sequence,
            task,
        });
    }

    /// Remove the earliest task if its deadline has passed
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<Task> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|timer| timer.task)
    }

    /// Deadline of the earliest pending task
    pub(crate) fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|timer| timer.due)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
