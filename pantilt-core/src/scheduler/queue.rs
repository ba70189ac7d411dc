//! Bounded FIFO of pending steps

use heapless::Deque;

use super::step::QueueItem;

/// Maximum number of pending steps
pub const QUEUE_CAPACITY: usize = 20;

/// Fixed-capacity FIFO of [`QueueItem`]s
#[derive(Debug, Clone, Default)]
pub struct StepQueue {
    items: Deque<QueueItem, QUEUE_CAPACITY>,
}

impl StepQueue {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
        }
    }

    /// Number of pending steps
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    /// Remaining capacity
    pub fn free(&self) -> usize {
        QUEUE_CAPACITY - self.items.len()
    }

    /// Append a step; a full queue hands the step back unchanged
    pub fn push(&mut self, item: QueueItem) -> Result<(), QueueItem> {
        self.items.push_back(item)
    }

    /// Take the oldest step
    pub fn pop(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    /// Drop all pending steps
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Pending steps, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }
}
