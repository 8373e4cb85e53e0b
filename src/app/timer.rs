//! Cancellable delayed events, driven by the caller's clock

#![allow(dead_code)]

use std::time::Instant;

/// Handle for cancelling a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Scheduled<E> {
    id: TimerId,
    at: Instant,
    event: E,
}

/// Pending events ordered by deadline.
#[derive(Debug)]
pub struct TimerQueue<E> {
    pending: Vec<Scheduled<E>>,
    next_id: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to become due at `at`.
    pub fn schedule(&mut self, at: Instant, event: E) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        // Keep sorted by deadline, FIFO among equal deadlines
        let pos = self.pending.partition_point(|s| s.at <= at);
        self.pending.insert(pos, Scheduled { id, at, event });
        id
    }

    /// Cancel one event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every event due at `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<E> {
        let due = self.pending.partition_point(|s| s.at <= now);
        self.pending.drain(..due).map(|s| s.event).collect()
    }

    /// Deadline of the earliest pending event.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|s| s.at)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
