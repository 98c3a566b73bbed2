//! Sample-accurate renderer for scheduled buffers.
//!
//! The scheduler side holds a [`TimelineHandle`]; the output side (a device callback or a
//! test) owns the [`PlaybackTimeline`] and advances the shared clock by rendering.

use crate::{PlaybackSink, ScheduledBuffer};
use crossbeam::queue::ArrayQueue;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use varipitch_core::{sanitize, CONSUMER_LIMIT};

struct TimelineShared {
    clock: AtomicU64,
    pending: ArrayQueue<ScheduledBuffer>,
    /// Sample vectors of finished buffers, waiting for the scheduler side to take them back
    spent: ArrayQueue<Vec<f32>>,
}

/// Create a connected timeline and handle. `capacity` bounds buffers in flight.
pub fn playback_timeline(capacity: usize) -> (PlaybackTimeline, TimelineHandle) {
    let capacity = capacity.max(1);
    let shared = Arc::new(TimelineShared {
        clock: AtomicU64::new(0),
        pending: ArrayQueue::new(capacity),
        spent: ArrayQueue::new(2 * capacity),
    });
    (
        PlaybackTimeline {
            shared: Arc::clone(&shared),
            active: VecDeque::with_capacity(capacity),
            late_frames: 0,
        },
        TimelineHandle { shared },
    )
}

/// Output side. Renders whatever is scheduled at the current clock position.
pub struct PlaybackTimeline {
    shared: Arc<TimelineShared>,
    active: VecDeque<ScheduledBuffer>,
    late_frames: u64,
}

impl PlaybackTimeline {
    pub fn current_frame(&self) -> u64 {
        self.shared.clock.load(Ordering::Acquire)
    }

    /// Buffers accepted but not yet finished.
    pub fn active_buffers(&self) -> usize {
        self.active.len() + self.shared.pending.len()
    }

    /// Frames skipped because their buffer arrived after their time had passed.
    pub fn late_frames(&self) -> u64 {
        self.late_frames
    }

    /// Render `out.len() / channels` frames, copying the mono signal to every channel, and
    /// advance the clock. Frames with nothing scheduled are silent.
    ///
    /// Buffers stay pinned to their start frame: a late buffer loses the head whose time has
    /// passed and never slides into the next buffer's frames.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        let clock = self.current_frame();
        let window_end = clock + frames as u64;

        while let Some(buffer) = self.shared.pending.pop() {
            if buffer.start_frame < clock {
                self.late_frames += (clock - buffer.start_frame).min(buffer.samples.len() as u64);
            }
            self.active.push_back(buffer);
        }

        out.fill(0.0);
        for buffer in self.active.iter() {
            if buffer.start_frame >= window_end {
                continue;
            }
            let skip = clock.saturating_sub(buffer.start_frame) as usize;
            let offset = buffer.start_frame.saturating_sub(clock) as usize;
            let Some(source) = buffer.samples.get(skip..) else {
                continue;
            };
            for (frame, &sample) in out[offset * channels..]
                .chunks_exact_mut(channels)
                .zip(source)
            {
                for slot in frame.iter_mut() {
                    *slot += sample;
                }
            }
        }
        for sample in out.iter_mut() {
            *sample = sanitize(*sample, CONSUMER_LIMIT);
        }

        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].end_frame() > window_end {
                i += 1;
                continue;
            }
            if let Some(finished) = self.active.swap_remove_back(i) {
                let _ = self.shared.spent.push(finished.samples);
            }
        }
        self.shared.clock.store(window_end, Ordering::Release);
    }
}

/// Scheduler side.
#[derive(Clone)]
pub struct TimelineHandle {
    shared: Arc<TimelineShared>,
}

impl PlaybackSink for TimelineHandle {
    fn current_frame(&self) -> u64 {
        self.shared.clock.load(Ordering::Acquire)
    }

    fn schedule(&mut self, buffer: ScheduledBuffer) -> bool {
        self.shared.pending.push(buffer).is_ok()
    }

    fn reclaim(&mut self) -> Option<Vec<f32>> {
        self.shared.spent.pop()
    }
}
