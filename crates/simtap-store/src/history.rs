//! Capped rolling history buffer.

use std::collections::VecDeque;

/// A bounded ordered sequence, newest last.
///
/// Pushing onto a full buffer evicts exactly the oldest entry. Used for the
/// store's message history and the per-operation run buffer.
#[derive(Clone, Debug)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    cap: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history with the given capacity.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(cap.min(64)),
            cap,
        }
    }

    /// Append an entry, evicting the oldest if the buffer is at capacity.
    pub fn push(&mut self, item: T) {
        if self.cap == 0 {
            return;
        }
        if self.items.len() == self.cap {
            let _ = self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Replace the whole buffer with a single entry.
    pub fn reset_to(&mut self, item: T) {
        self.items.clear();
        self.items.push_back(item);
    }

    /// The newest entry, if any.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    /// The oldest entry, if any.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.cap
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Clone the retained entries into a `Vec`, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
