//! Bounded FIFO of chunks waiting to be scheduled.

use std::collections::VecDeque;
use varipitch_transport::TransportChunk;

/// Oldest-drop chunk queue owned by the consumer.
#[derive(Debug)]
pub struct PlaybackQueue {
    chunks: VecDeque<TransportChunk>,
    capacity: usize,
    queued_samples: usize,
}

impl PlaybackQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chunks: VecDeque::with_capacity(capacity),
            capacity,
            queued_samples: 0,
        }
    }

    /// Append a chunk. When full, the oldest chunk is evicted and returned.
    pub fn push(&mut self, chunk: TransportChunk) -> Option<TransportChunk> {
        let evicted = if self.chunks.len() == self.capacity {
            self.pop()
        } else {
            None
        };
        self.queued_samples += chunk.len();
        self.chunks.push_back(chunk);
        evicted
    }

    pub fn pop(&mut self) -> Option<TransportChunk> {
        let chunk = self.chunks.pop_front()?;
        self.queued_samples -= chunk.len();
        Some(chunk)
    }

    pub fn front(&self) -> Option<&TransportChunk> {
        self.chunks.front()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples across all queued chunks.
    pub fn queued_samples(&self) -> usize {
        self.queued_samples
    }

    /// Drop everything. Returns the number of chunks discarded.
    pub fn clear(&mut self) -> usize {
        let count = self.chunks.len();
        self.chunks.clear();
        self.queued_samples = 0;
        count
    }
}
