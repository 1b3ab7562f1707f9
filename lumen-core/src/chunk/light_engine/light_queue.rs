//! FIFO queue for light propagation entries.
//!
//! Uses a simple power-of-two ring buffer so that wrapping is a mask instead of a modulo.

use super::queue_entry::QueueEntry;

/// A FIFO queue for light propagation using a ring buffer.
///
/// Entries carry their own position, so the queue stores plain `QueueEntry` words.
/// Processing order is strictly first-in first-out, which keeps the flood fill breadth-first.
#[derive(Debug)]
pub struct LightQueue {
    buffer: Box<[QueueEntry]>,
    mask: usize,
    head: usize,
    size: usize,
}

impl LightQueue {
    /// Default capacity, enough for a torch placed in open air without growing.
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// Creates a new empty light queue with pre-allocated capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a new light queue with at least the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(16).next_power_of_two();
        Self {
            buffer: Self::allocate(capacity),
            mask: capacity - 1,
            head: 0,
            size: 0,
        }
    }

    fn allocate(capacity: usize) -> Box<[QueueEntry]> {
        vec![QueueEntry::default(); capacity].into_boxed_slice()
    }

    /// Enqueues an entry for processing.
    #[inline]
    pub fn enqueue(&mut self, entry: QueueEntry) {
        if self.size == self.buffer.len() {
            self.grow();
        }

        let tail = (self.head + self.size) & self.mask;
        self.buffer[tail] = entry;
        self.size += 1;
    }

    /// Dequeues the next entry.
    ///
    /// Returns `None` if the queue is empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        if self.size == 0 {
            return None;
        }

        let item = self.buffer[self.head];
        self.head = (self.head + 1) & self.mask;
        self.size -= 1;

        Some(item)
    }

    /// Checks if the queue is empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of entries in the queue.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns the number of entries the queue holds before it has to grow.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Clears all entries from the queue.
    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.size = 0;
    }

    /// Doubles the buffer, unwrapping the live entries to the front.
    fn grow(&mut self) {
        let new_capacity = self.buffer.len() * 2;
        let mut new_buffer = Self::allocate(new_capacity);

        for (i, slot) in new_buffer.iter_mut().take(self.size).enumerate() {
            *slot = self.buffer[(self.head + i) & self.mask];
        }

        self.buffer = new_buffer;
        self.mask = new_capacity - 1;
        self.head = 0;
    }
}

impl Default for LightQueue {
    fn default() -> Self {
        Self::new()
    }
}
