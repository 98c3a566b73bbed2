//! Transport counters.
//!
//! Updated from the real-time producer with relaxed atomics and read from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for chunks and frames crossing the transport.
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Chunks handed to the message queue
    chunks_sent: AtomicU64,
    /// Chunks evicted because the queue was full
    chunks_dropped: AtomicU64,
    /// Frames committed to the shared ring
    frames_written: AtomicU64,
    /// Frames that did not fit in the shared ring
    frames_overflowed: AtomicU64,
    /// Chunk payloads the producer had to allocate because none were recycled
    payload_allocations: AtomicU64,
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_chunk_sent(&self) {
        self.chunks_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_chunk_dropped(&self) {
        self.chunks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_frames_written(&self, frames: u64) {
        self.frames_written.fetch_add(frames, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_overflow(&self, frames: u64) {
        self.frames_overflowed.fetch_add(frames, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_payload_allocation(&self) {
        self.payload_allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TransportMetricsSnapshot {
        TransportMetricsSnapshot {
            chunks_sent: self.chunks_sent.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            frames_overflowed: self.frames_overflowed.load(Ordering::Relaxed),
            payload_allocations: self.payload_allocations.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.chunks_sent.store(0, Ordering::Relaxed);
        self.chunks_dropped.store(0, Ordering::Relaxed);
        self.frames_written.store(0, Ordering::Relaxed);
        self.frames_overflowed.store(0, Ordering::Relaxed);
        self.payload_allocations.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`TransportMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportMetricsSnapshot {
    pub chunks_sent: u64,
    pub chunks_dropped: u64,
    pub frames_written: u64,
    pub frames_overflowed: u64,
    pub payload_allocations: u64,
}
