//! Bounded undo/redo history.

use std::collections::VecDeque;

/// Default number of undo points kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Ring buffer of past snapshots plus a redo stack.
///
/// Recording a new snapshot once the buffer is full evicts the oldest one.
/// Recording also clears the redo stack.
#[derive(Debug, Clone)]
pub struct History<T> {
    capacity: usize,
    past: VecDeque<T>,
    future: Vec<T>,
}

impl<T> History<T> {
    /// Creates an empty history holding at most `capacity` undo points.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            past: VecDeque::with_capacity(capacity),
            future: Vec::new(),
        }
    }

    /// Records `previous` as an undo point.
    pub fn record(&mut self, previous: T) {
        self.future.clear();
        if self.capacity == 0 {
            return;
        }
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(previous);
    }

    /// Steps back: takes the most recent undo point and stashes `current` for
    /// redo. Hands `current` back as `Err` if there is nothing to undo.
    pub fn undo(&mut self, current: T) -> Result<T, T> {
        match self.past.pop_back() {
            Some(previous) => {
                self.future.push(current);
                Ok(previous)
            }
            None => Err(current),
        }
    }

    /// Steps forward again after an undo.
    pub fn redo(&mut self, current: T) -> Result<T, T> {
        match self.future.pop() {
            Some(next) => {
                self.past.push_back(current);
                if self.past.len() > self.capacity {
                    self.past.pop_front();
                }
                Ok(next)
            }
            None => Err(current),
        }
    }

    /// Number of available undo steps.
    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    /// Number of available redo steps.
    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    /// Maximum number of undo points.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all undo and redo points.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
