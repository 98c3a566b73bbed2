//! Consumer-side counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PlaybackMetrics {
    chunks_enqueued: AtomicU64,
    /// Oldest chunks evicted from a full playback queue
    chunks_dropped: AtomicU64,
    /// Chunks discarded by a stop
    chunks_flushed: AtomicU64,
    buffers_scheduled: AtomicU64,
    frames_scheduled: AtomicU64,
    /// Buffers the sink refused
    buffers_rejected: AtomicU64,
    underruns: AtomicU64,
    quality_events: AtomicU64,
    max_consecutive_underruns: AtomicU64,
    previews_emitted: AtomicU64,
    previews_dropped: AtomicU64,
}

impl PlaybackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_chunk_enqueued(&self) {
        self.chunks_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_dropped(&self) {
        self.chunks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunks_flushed(&self, count: u64) {
        self.chunks_flushed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_buffer_scheduled(&self, frames: u64) {
        self.buffers_scheduled.fetch_add(1, Ordering::Relaxed);
        self.frames_scheduled.fetch_add(frames, Ordering::Relaxed);
    }

    pub fn record_buffer_rejected(&self) {
        self.buffers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one underrun as part of a run of `consecutive`.
    pub fn record_underrun(&self, consecutive: u64) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
        self.max_consecutive_underruns
            .fetch_max(consecutive, Ordering::Relaxed);
    }

    pub fn record_quality_event(&self) {
        self.quality_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preview(&self, delivered: bool) {
        if delivered {
            self.previews_emitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.previews_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> PlaybackMetricsSnapshot {
        PlaybackMetricsSnapshot {
            chunks_enqueued: self.chunks_enqueued.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            chunks_flushed: self.chunks_flushed.load(Ordering::Relaxed),
            buffers_scheduled: self.buffers_scheduled.load(Ordering::Relaxed),
            frames_scheduled: self.frames_scheduled.load(Ordering::Relaxed),
            buffers_rejected: self.buffers_rejected.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            quality_events: self.quality_events.load(Ordering::Relaxed),
            max_consecutive_underruns: self.max_consecutive_underruns.load(Ordering::Relaxed),
            previews_emitted: self.previews_emitted.load(Ordering::Relaxed),
            previews_dropped: self.previews_dropped.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.chunks_enqueued,
            &self.chunks_dropped,
            &self.chunks_flushed,
            &self.buffers_scheduled,
            &self.frames_scheduled,
            &self.buffers_rejected,
            &self.underruns,
            &self.quality_events,
            &self.max_consecutive_underruns,
            &self.previews_emitted,
            &self.previews_dropped,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackMetricsSnapshot {
    pub chunks_enqueued: u64,
    pub chunks_dropped: u64,
    pub chunks_flushed: u64,
    pub buffers_scheduled: u64,
    pub frames_scheduled: u64,
    pub buffers_rejected: u64,
    pub underruns: u64,
    pub quality_events: u64,
    pub max_consecutive_underruns: u64,
    pub previews_emitted: u64,
    pub previews_dropped: u64,
}

impl PlaybackMetricsSnapshot {
    /// Any sustained underrun or data loss on the consumer side.
    pub fn has_quality_issues(&self) -> bool {
        self.quality_events > 0 || self.chunks_dropped > 0 || self.buffers_rejected > 0
    }
}
