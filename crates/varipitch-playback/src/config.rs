//! Consumer-side tuning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback scheduler and thread parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Queued audio required before scheduling starts (default: 20ms)
    pub min_buffer_ms: u32,
    /// Chunks held before the oldest is dropped (default: 32)
    pub queue_capacity: usize,
    /// Chunks merged into one playback buffer at most (default: 4)
    pub max_merge: usize,
    /// Preferred playback buffer length, also the scheduling lookahead (default: 1024)
    pub target_buffer_frames: usize,
    /// Wait before retrying after an underrun (default: 5ms)
    pub retry_delay_ms: u64,
    /// Idle poll period of the playback thread (default: 2ms)
    pub poll_interval_ms: u64,
    /// Consecutive underruns reported as one quality event (default: 4)
    pub underrun_report_threshold: u32,
    /// Consumer-side clamp (default: 0.98)
    pub output_limit: f32,
    /// Preview events buffered for subscribers (default: 64)
    pub preview_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_buffer_ms: 20,
            queue_capacity: 32,
            max_merge: 4,
            target_buffer_frames: 1024,
            retry_delay_ms: 5,
            poll_interval_ms: 2,
            underrun_report_threshold: 4,
            output_limit: varipitch_core::CONSUMER_LIMIT,
            preview_capacity: 64,
        }
    }
}

impl PlaybackConfig {
    /// `min_buffer_ms` in samples at `sample_rate`.
    pub fn min_buffer_samples(&self, sample_rate: u32) -> usize {
        (sample_rate as u64 * self.min_buffer_ms as u64 / 1000) as usize
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_merge == 0 {
            return Err(Error::InvalidConfig(
                "max_merge must be at least 1".to_string(),
            ));
        }
        if self.target_buffer_frames == 0 {
            return Err(Error::InvalidConfig(
                "target_buffer_frames must be at least 1".to_string(),
            ));
        }
        if self.underrun_report_threshold == 0 {
            return Err(Error::InvalidConfig(
                "underrun_report_threshold must be at least 1".to_string(),
            ));
        }
        if !(self.output_limit > 0.0 && self.output_limit <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "output_limit must be in (0, 1], got {}",
                self.output_limit
            )));
        }
        if self.preview_capacity == 0 {
            return Err(Error::InvalidConfig(
                "preview_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
