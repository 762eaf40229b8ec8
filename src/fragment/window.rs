//! Bounded FIFO of recently observed packets.

use std::collections::VecDeque;

/// Holds at most `capacity` entries; pushing past that evicts the oldest.
/// A capacity of zero keeps nothing, so lookups never find a candidate.
#[derive(Debug, Clone)]
pub struct HistoryWindow<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryWindow<T> {
    pub fn new(capacity: usize) -> Self {
        HistoryWindow {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Current contents, oldest first.
    pub fn candidates(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.entries.iter()
    }

    /// Current contents, oldest first, without the newest entry.
    pub fn older(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        let n = self.entries.len().saturating_sub(1);
        self.entries.iter().take(n)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
