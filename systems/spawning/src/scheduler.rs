//! Deterministic timer queue advanced by simulated time.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::Duration,
};

/// Min-heap of pending actions keyed by their firing time.
///
/// Entries due at the same instant fire in the order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<A> {
    queue: BinaryHeap<Reverse<Entry<A>>>,
    sequence: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            sequence: 0,
        }
    }

    /// Queues `action` to fire at `fire_at`.
    pub fn schedule(&mut self, action: A, fire_at: Duration) {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        self.queue.push(Reverse(Entry {
            fire_at,
            sequence,
            action,
        }));
    }

    /// Removes and returns the earliest action due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, A)> {
        if self.next_fire_at()? > now {
            return None;
        }
        self.queue
            .pop()
            .map(|Reverse(entry)| (entry.fire_at, entry.action))
    }

    /// Firing time of the earliest pending action.
    #[must_use]
    pub fn next_fire_at(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(entry)| entry.fire_at)
    }

    /// Drops every pending action.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Reports whether no action is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<A: PartialEq> Scheduler<A> {
    /// Drops every pending copy of `action`, reporting whether one existed.
    pub fn cancel(&mut self, action: &A) -> bool {
        let before = self.queue.len();
        self.queue.retain(|Reverse(entry)| entry.action != *action);
        self.queue.len() != before
    }

    /// Replaces any pending copy of `action` with one firing at `fire_at`.
    pub fn reschedule(&mut self, action: A, fire_at: Duration) {
        let _ = self.cancel(&action);
        self.schedule(action, fire_at);
    }

    /// Firing time of the pending copy of `action`, if any.
    #[must_use]
    pub fn fire_time_of(&self, action: &A) -> Option<Duration> {
        self.queue
            .iter()
            .filter(|Reverse(entry)| entry.action == *action)
            .map(|Reverse(entry)| entry.fire_at)
            .min()
    }
}

#[derive(Debug)]
struct Entry<A> {
    fire_at: Duration,
    sequence: u64,
    action: A,
}

impl<A> Entry<A> {
    fn key(&self) -> (Duration, u64) {
        (self.fire_at, self.sequence)
    }
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
