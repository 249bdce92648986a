//! Playback queue: FIFO of pending clips plus the "play all" sentinel.
//!
//! The queue does no deduplication of its own; the loop consults the
//! [`ClipRegistry`](crate::registry::ClipRegistry) before pushing.

use std::collections::VecDeque;

use crate::clip::ClipPath;

/// One queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEntry {
    /// Play this clip.
    Clip(ClipPath),
    /// Expand into one entry per known clip when dequeued.
    All,
}

/// Ordered buffer of pending entries. Insertion order is play order.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    entries: VecDeque<QueueEntry>,
}

impl PlaybackQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn enqueue(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    /// Put an entry ahead of everything else (used by "play now").
    pub fn enqueue_front(&mut self, entry: QueueEntry) {
        self.entries.push_front(entry);
    }

    /// Pop the oldest entry, if any.
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Remove a clip entry wherever it sits, returning whether it was present.
    pub fn remove(&mut self, clip: &ClipPath) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !matches!(entry, QueueEntry::Clip(c) if c == clip));
        before != self.entries.len()
    }

    /// Pending clips in play order, skipping sentinels.
    #[must_use]
    pub fn clips(&self) -> Vec<ClipPath> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                QueueEntry::Clip(clip) => Some(clip.clone()),
                QueueEntry::All => None,
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn clip(name: &str) -> QueueEntry {
        QueueEntry::Clip(ClipPath::resolve(Path::new("/clips"), name))
    }

    #[test]
    fn dequeues_in_insertion_order() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(clip("a.wav"));
        queue.enqueue(QueueEntry::All);
        queue.enqueue(clip("b.wav"));

        assert_eq!(queue.clips().len(), 2);
        assert_eq!(queue.dequeue(), Some(clip("a.wav")));
        assert_eq!(queue.dequeue(), Some(QueueEntry::All));
        assert_eq!(queue.dequeue(), Some(clip("b.wav")));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn does_not_deduplicate() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(clip("a.wav"));
        queue.enqueue(clip("a.wav"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn front_entry_jumps_the_line() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(clip("a.wav"));
        queue.enqueue_front(clip("urgent.wav"));
        assert_eq!(queue.dequeue(), Some(clip("urgent.wav")));
    }

    #[test]
    fn remove_drops_matching_clip() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(clip("a.wav"));
        queue.enqueue(clip("b.wav"));

        let target = ClipPath::resolve(Path::new("/clips"), "a.wav");
        assert!(queue.remove(&target));
        assert!(!queue.remove(&target));
        assert_eq!(queue.dequeue(), Some(clip("b.wav")));
        assert!(queue.is_empty());
    }
}
