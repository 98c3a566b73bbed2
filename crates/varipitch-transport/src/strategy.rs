//! Transport strategy seams.

use crate::{TransportChunk, TransportMode};

/// Producer half of a transport.
///
/// Called from the real-time thread. Implementations never block and never wait on the
/// consumer; when the consumer falls behind they drop data and count it.
pub trait TransportWriter: Send {
    /// Push one processed block. `frame_position` is the producer clock at `samples[0]`.
    fn write_block(&mut self, samples: &[f32], frame_position: u64);

    /// Hand over anything held locally.
    fn flush(&mut self) {}

    /// Forget anything held locally without sending it.
    fn discard(&mut self) {}

    fn mode(&self) -> TransportMode;
}

/// Consumer half of a transport.
pub trait TransportReader: Send {
    /// Take the next chunk in submission order, reading at most `max_frames` where the
    /// strategy is frame-oriented.
    fn poll(&mut self, max_frames: usize) -> Option<TransportChunk>;

    /// Return a payload the consumer has finished with so the producer can reuse it.
    fn recycle(&mut self, _payload: Vec<f32>) {}

    fn mode(&self) -> TransportMode;
}
