//! Transport configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which transport strategy carries processed audio to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// Chunks accumulated locally and moved through a bounded queue.
    #[default]
    Message,
    /// Lock-free SPSC ring over a shared memory segment.
    SharedRing,
}

/// Chunked message mode parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Maximum chunks held in the queue before the oldest is dropped (default: 32)
    pub queue_capacity: usize,
    /// Producer accumulator size in samples (default: 4096)
    pub accumulator_capacity: usize,
    /// Fraction of the accumulator that triggers a drain (default: 0.4)
    pub drain_fraction: f32,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            accumulator_capacity: 4096,
            drain_fraction: 0.4,
        }
    }
}

impl MessageConfig {
    /// Accumulated length at which a chunk is handed to the queue.
    pub fn drain_threshold(&self) -> usize {
        ((self.accumulator_capacity as f32 * self.drain_fraction).ceil() as usize).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "Message queue capacity must be at least 1".to_string(),
            ));
        }
        if self.accumulator_capacity == 0 {
            return Err(Error::InvalidConfig(
                "Accumulator capacity must be at least 1".to_string(),
            ));
        }
        if !(self.drain_fraction > 0.0 && self.drain_fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "Drain fraction must be in (0, 1], got {}",
                self.drain_fraction
            )));
        }
        Ok(())
    }
}

/// Shared-memory ring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    /// Ring size in frames, one slot is reserved (default: 8192)
    pub capacity_frames: usize,
    /// Interleaved channels per frame (default: 2)
    pub channels: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity_frames: 8192,
            channels: 2,
        }
    }
}

impl RingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity_frames < 2 || self.capacity_frames > u32::MAX as usize || self.channels == 0
        {
            return Err(Error::InvalidLayout {
                capacity: self.capacity_frames,
                channels: self.channels,
            });
        }
        Ok(())
    }
}

/// Complete transport configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    pub mode: TransportMode,
    pub message: MessageConfig,
    pub ring: RingConfig,
}

impl TransportConfig {
    pub fn validate(&self) -> Result<()> {
        self.message.validate()?;
        self.ring.validate()
    }
}
