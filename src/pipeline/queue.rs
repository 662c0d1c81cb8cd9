//! Work selection seam and a minimal in-memory queue.

use std::collections::{HashSet, VecDeque};
use tokio::time::Instant;

use crate::pipeline::WorkItem;

/// The host pipeline's own next-item selection.
pub trait WorkSource {
    type Item;

    fn next_item(&mut self) -> Option<Self::Item>;
}

/// FIFO queue with URL-based duplicate suppression.
///
/// Items marked `dont_filter` always enter; items whose `delay_until` lies
/// in the future are skipped until due.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    items: VecDeque<WorkItem>,
    seen: HashSet<String>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `item`. Returns false when it was dropped as a duplicate.
    pub fn push(&mut self, item: WorkItem) -> bool {
        let fresh = self.seen.insert(item.url.clone());
        if !fresh && !item.dont_filter {
            tracing::debug!(url = %item.url, "Filtered duplicate work item");
            return false;
        }
        self.items.push_back(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl WorkSource for MemoryQueue {
    type Item = WorkItem;

    fn next_item(&mut self) -> Option<WorkItem> {
        let now = Instant::now();
        let index = self.items.iter().position(|item| item.is_due(now))?;
        self.items.remove(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let mut queue = MemoryQueue::new();
        queue.push(WorkItem::new("https://example.com/1"));
        queue.push(WorkItem::new("https://example.com/2"));

        assert_eq!(queue.next_item().unwrap().url, "https://example.com/1");
        assert_eq!(queue.next_item().unwrap().url, "https://example.com/2");
        assert!(queue.next_item().is_none());
    }

    #[test]
    fn test_duplicates_filtered_unless_dont_filter() {
        let mut queue = MemoryQueue::new();
        assert!(queue.push(WorkItem::new("https://example.com/1")));
        assert!(!queue.push(WorkItem::new("https://example.com/1")));

        let mut replay = WorkItem::new("https://example.com/1");
        replay.dont_filter = true;
        assert!(queue.push(replay));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_delayed_items_wait() {
        let mut queue = MemoryQueue::new();
        let mut later = WorkItem::new("https://example.com/later");
        later.delay_until = Some(Instant::now() + Duration::from_secs(60));
        queue.push(later);
        queue.push(WorkItem::new("https://example.com/now"));

        assert_eq!(queue.next_item().unwrap().url, "https://example.com/now");
        assert!(queue.next_item().is_none());
        assert_eq!(queue.len(), 1);
    }
}
