//! Turns irregular chunks into back-to-back playback buffers.
//!
//! Scheduling is driven by the sink's sample clock: every buffer starts exactly where the
//! previous one ends, so there is neither a gap nor an overlap while data keeps up. The
//! scheduler holds off until a small cushion is queued, and treats an empty queue at the end
//! of the previous buffer as an underrun to retry after a short delay.

use crate::{PlaybackConfig, PlaybackMetrics, PlaybackQueue, PlaybackSink, Result, ScheduledBuffer};
use std::sync::Arc;
use std::time::Duration;
use varipitch_core::sanitize;
use varipitch_transport::TransportChunk;

/// Result of one [`PlaybackScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Stopped,
    /// Waiting for the initial cushion.
    Buffering { queued: usize, needed: usize },
    Scheduled { buffers: usize, frames: usize },
    /// Enough is scheduled ahead of the clock.
    Ahead { scheduled_until: u64 },
    /// The previous buffer has finished and nothing is queued.
    Underrun { retry_after: Duration },
}

pub struct PlaybackScheduler {
    config: PlaybackConfig,
    queue: PlaybackQueue,
    min_buffer_samples: usize,
    is_running: bool,
    is_buffering: bool,
    next_start: Option<u64>,
    consecutive_underruns: u32,
    /// Payloads of chunks merged into an earlier one, kept for the transport to reuse
    spent: Vec<Vec<f32>>,
    metrics: Arc<PlaybackMetrics>,
}

impl PlaybackScheduler {
    /// Created stopped; call [`start`](Self::start) to begin buffering.
    pub fn new(
        config: PlaybackConfig,
        sample_rate: u32,
        metrics: Arc<PlaybackMetrics>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            queue: PlaybackQueue::new(config.queue_capacity),
            min_buffer_samples: config.min_buffer_samples(sample_rate),
            config,
            is_running: false,
            is_buffering: true,
            next_start: None,
            consecutive_underruns: 0,
            spent: Vec::with_capacity(config.max_merge),
            metrics,
        })
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_buffering(&self) -> bool {
        self.is_buffering
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn min_buffer_samples(&self) -> usize {
        self.min_buffer_samples
    }

    /// End frame of the last scheduled buffer.
    pub fn next_start(&self) -> Option<u64> {
        self.next_start
    }

    pub fn metrics(&self) -> Arc<PlaybackMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn enqueue(&mut self, chunk: TransportChunk) {
        if chunk.is_empty() {
            return;
        }
        self.metrics.record_chunk_enqueued();
        if let Some(evicted) = self.queue.push(chunk) {
            self.metrics.record_chunk_dropped();
            tracing::debug!(
                timestamp = evicted.timestamp,
                "playback queue full, dropped oldest chunk"
            );
        }
    }

    pub fn start(&mut self) {
        if self.is_running {
            return;
        }
        self.is_running = true;
        self.is_buffering = true;
        self.next_start = None;
        self.consecutive_underruns = 0;
        tracing::debug!(needed = self.min_buffer_samples, "playback started");
    }

    /// Stop scheduling and flush the queue. Buffers already handed to the sink play out.
    /// Returns the number of chunks discarded.
    pub fn stop(&mut self) -> usize {
        let flushed = self.queue.clear();
        self.metrics.record_chunks_flushed(flushed as u64);
        self.is_running = false;
        self.is_buffering = true;
        self.next_start = None;
        self.consecutive_underruns = 0;
        tracing::debug!(flushed, "playback stopped");
        flushed
    }

    /// Schedule as many buffers as fit within one target buffer of lookahead.
    pub fn tick(&mut self, sink: &mut dyn PlaybackSink) -> TickOutcome {
        if !self.is_running {
            return TickOutcome::Stopped;
        }

        if self.is_buffering {
            let queued = self.queue.queued_samples();
            if queued < self.min_buffer_samples {
                return TickOutcome::Buffering {
                    queued,
                    needed: self.min_buffer_samples,
                };
            }
            self.is_buffering = false;
            tracing::trace!(queued, "playback cushion filled");
        }

        let now = sink.current_frame();
        let horizon = now + self.config.target_buffer_frames as u64;
        let mut buffers = 0;
        let mut frames = 0;

        while !self.queue.is_empty() {
            let start = match self.next_start {
                Some(end) if end >= now => end,
                _ => now,
            };
            if start > horizon {
                break;
            }

            let samples = self.build_buffer();
            let len = samples.len();
            if !sink.schedule(ScheduledBuffer::new(start, samples)) {
                self.metrics.record_buffer_rejected();
                tracing::warn!(start, len, "playback sink full, buffer dropped");
                break;
            }
            self.metrics.record_buffer_scheduled(len as u64);
            self.next_start = Some(start + len as u64);
            buffers += 1;
            frames += len;
        }

        if buffers > 0 {
            self.consecutive_underruns = 0;
            return TickOutcome::Scheduled { buffers, frames };
        }

        match self.next_start {
            Some(end) if end > now => TickOutcome::Ahead {
                scheduled_until: end,
            },
            _ => self.underrun(),
        }
    }

    /// Payloads emptied by merging since the last call.
    pub fn drain_spent(&mut self) -> impl Iterator<Item = Vec<f32>> + '_ {
        self.spent.drain(..)
    }

    fn underrun(&mut self) -> TickOutcome {
        self.consecutive_underruns += 1;
        self.metrics
            .record_underrun(self.consecutive_underruns as u64);

        if self.consecutive_underruns >= self.config.underrun_report_threshold {
            self.metrics.record_quality_event();
            tracing::warn!(
                consecutive = self.consecutive_underruns,
                "sustained playback underrun, rebuffering"
            );
            self.consecutive_underruns = 0;
            self.is_buffering = true;
            self.next_start = None;
        }

        TickOutcome::Underrun {
            retry_after: self.config.retry_delay(),
        }
    }

    /// Merge up to `max_merge` chunks, stopping early once `target_buffer_frames` is reached.
    fn build_buffer(&mut self) -> Vec<f32> {
        let mut samples: Vec<f32> = Vec::new();
        let mut merged = 0;
        while merged < self.config.max_merge
            && (merged == 0 || samples.len() < self.config.target_buffer_frames)
        {
            let Some(chunk) = self.queue.pop() else {
                break;
            };
            if merged == 0 {
                samples = chunk.into_payload();
            } else {
                samples.extend_from_slice(&chunk.payload);
                self.spent.push(chunk.into_payload());
            }
            merged += 1;
        }

        let limit = self.config.output_limit;
        for sample in samples.iter_mut() {
            *sample = sanitize(*sample, limit);
        }
        samples
    }
}
