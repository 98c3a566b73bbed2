//! Where the scheduler sends finished playback buffers.

/// A mono playback buffer pinned to a start frame on the sink's sample clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledBuffer {
    pub start_frame: u64,
    pub samples: Vec<f32>,
}

impl ScheduledBuffer {
    pub fn new(start_frame: u64, samples: Vec<f32>) -> Self {
        Self {
            start_frame,
            samples,
        }
    }

    /// First frame after the buffer.
    pub fn end_frame(&self) -> u64 {
        self.start_frame + self.samples.len() as u64
    }
}

/// Sample-clock output the [`PlaybackScheduler`](crate::PlaybackScheduler) schedules onto.
pub trait PlaybackSink: Send {
    /// Frame currently being played.
    fn current_frame(&self) -> u64;

    /// Queue a buffer for playback. Returns `false` if the sink cannot take it.
    fn schedule(&mut self, buffer: ScheduledBuffer) -> bool;

    /// Take back the samples of a buffer that has finished playing, if the sink keeps them.
    fn reclaim(&mut self) -> Option<Vec<f32>> {
        None
    }
}
