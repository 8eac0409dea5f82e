//! Rolling window of the most recent gauge readings, newest first.

use crate::Measurement;
use std::collections::VecDeque;

/// Window size used when the configuration does not override it.
pub const DEFAULT_WINDOW: usize = 5;

/// Fixed-capacity, newest-first sequence of [`Measurement`]s.
///
/// Once `capacity` readings are held, every push evicts the oldest one, so
/// [`History::oldest`] always looks back at most `capacity - 1` poll intervals.
/// Accessors return `None` until enough readings exist; callers treat that as
/// "not enough history" rather than as a zero level.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: VecDeque<Measurement>,
}

impl History {
    /// Create an empty history. A capacity below one is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert a reading at the front, dropping the back entry when full.
    pub fn push(&mut self, measurement: Measurement) {
        self.entries.push_front(measurement);
        self.entries.truncate(self.capacity);
    }

    pub fn newest(&self) -> Option<Measurement> {
        self.entries.front().copied()
    }

    /// Second-newest reading.
    pub fn previous(&self) -> Option<Measurement> {
        self.entries.get(1).copied()
    }

    /// Oldest reading still retained in the window.
    ///
    /// Requires at least two readings: with a single sample there is nothing
    /// to compare the newest one against.
    pub fn oldest(&self) -> Option<Measurement> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    /// Readings from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = Measurement> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
