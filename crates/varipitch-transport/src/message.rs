//! Chunked message mode.
//!
//! The producer accumulates processed samples locally and, once the accumulator crosses the
//! drain threshold, moves the whole buffer into a bounded lock-free queue as one chunk. A full
//! queue evicts its oldest chunk so the producer never blocks.
//!
//! Payload vectors circulate through a recycle queue: the producer takes its next accumulator
//! from it and returns evicted payloads to it, and the consumer hands finished payloads back
//! through [`TransportReader::recycle`]. In steady state the producer neither allocates nor
//! frees.

use crate::{
    MessageConfig, TransportChunk, TransportMetrics, TransportMode, TransportReader,
    TransportWriter,
};
use crossbeam::queue::ArrayQueue;
use std::sync::Arc;

/// Create a connected writer/reader pair.
pub fn message_channel(
    config: MessageConfig,
    sample_rate: u32,
    metrics: Arc<TransportMetrics>,
) -> (ChunkWriter, ChunkReader) {
    let queue_capacity = config.queue_capacity.max(1);
    let queue = Arc::new(ArrayQueue::new(queue_capacity));
    // Enough payloads for a full queue plus one held by each side.
    let recycle = Arc::new(ArrayQueue::new(2 * queue_capacity + 2));
    for _ in 0..queue_capacity + 2 {
        let _ = recycle.push(Vec::with_capacity(config.accumulator_capacity));
    }
    let writer = ChunkWriter {
        queue: Arc::clone(&queue),
        recycle: Arc::clone(&recycle),
        accumulator: Vec::with_capacity(config.accumulator_capacity),
        accumulator_capacity: config.accumulator_capacity,
        drain_threshold: config.drain_threshold(),
        chunk_start: 0,
        sample_rate,
        metrics,
    };
    let reader = ChunkReader {
        queue,
        recycle,
        accumulator_capacity: config.accumulator_capacity,
    };
    (writer, reader)
}

fn give_back(recycle: &ArrayQueue<Vec<f32>>, mut payload: Vec<f32>, min_capacity: usize) {
    if payload.capacity() < min_capacity {
        return;
    }
    payload.clear();
    let _ = recycle.push(payload);
}

/// Producer side of the message queue.
pub struct ChunkWriter {
    queue: Arc<ArrayQueue<TransportChunk>>,
    recycle: Arc<ArrayQueue<Vec<f32>>>,
    accumulator: Vec<f32>,
    accumulator_capacity: usize,
    drain_threshold: usize,
    chunk_start: u64,
    sample_rate: u32,
    metrics: Arc<TransportMetrics>,
}

impl ChunkWriter {
    /// Samples waiting in the accumulator.
    pub fn pending(&self) -> usize {
        self.accumulator.len()
    }

    pub fn drain_threshold(&self) -> usize {
        self.drain_threshold
    }

    fn drain(&mut self) {
        if self.accumulator.is_empty() {
            return;
        }
        let next = self.recycle.pop().unwrap_or_else(|| {
            self.metrics.record_payload_allocation();
            Vec::with_capacity(self.accumulator_capacity)
        });
        let payload = std::mem::replace(&mut self.accumulator, next);
        let chunk = TransportChunk::new(payload, self.sample_rate, self.chunk_start);
        self.metrics.record_chunk_sent();
        if let Some(evicted) = self.queue.force_push(chunk) {
            self.metrics.record_chunk_dropped();
            tracing::trace!(
                timestamp = evicted.timestamp,
                "message queue full, dropped oldest chunk"
            );
            give_back(&self.recycle, evicted.into_payload(), 0);
        }
    }
}

impl TransportWriter for ChunkWriter {
    fn write_block(&mut self, samples: &[f32], frame_position: u64) {
        if samples.is_empty() {
            return;
        }
        if self.accumulator.is_empty() {
            self.chunk_start = frame_position;
        }
        self.accumulator.extend_from_slice(samples);
        if self.accumulator.len() >= self.drain_threshold {
            self.drain();
        }
    }

    fn flush(&mut self) {
        self.drain();
    }

    fn discard(&mut self) {
        self.accumulator.clear();
    }

    fn mode(&self) -> TransportMode {
        TransportMode::Message
    }
}

/// Consumer side of the message queue.
pub struct ChunkReader {
    queue: Arc<ArrayQueue<TransportChunk>>,
    recycle: Arc<ArrayQueue<Vec<f32>>>,
    accumulator_capacity: usize,
}

impl ChunkReader {
    /// Chunks currently queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Payloads waiting to be reused by the producer.
    pub fn recycled(&self) -> usize {
        self.recycle.len()
    }

    /// Drop everything queued.
    pub fn clear(&self) {
        while let Some(chunk) = self.queue.pop() {
            give_back(&self.recycle, chunk.into_payload(), self.accumulator_capacity);
        }
    }
}

impl TransportReader for ChunkReader {
    fn poll(&mut self, _max_frames: usize) -> Option<TransportChunk> {
        self.queue.pop()
    }

    /// Payloads smaller than an accumulator are dropped rather than handed to the producer,
    /// which would have to grow them.
    fn recycle(&mut self, payload: Vec<f32>) {
        give_back(&self.recycle, payload, self.accumulator_capacity);
    }

    fn mode(&self) -> TransportMode {
        TransportMode::Message
    }
}
