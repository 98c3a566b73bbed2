//! Minimum read/write cursor separation as a function of pitch ratio.
//!
//! Above unity the read cursor gains on the write cursor by `ratio - 1` samples per sample,
//! so the margin grows with the ratio in three increasingly steep segments. At or below unity
//! the reader falls behind and only a minimal constant is needed. The margin never exceeds
//! `capacity / capacity_divisor` so it cannot consume the whole line.
//!
//! The defaults are tuned for 128-frame blocks: for every ratio up to
//! [`MAX_PITCH_RATIO`](crate::MAX_PITCH_RATIO), the distance the reader can close between two
//! collision checks (including step damping) plus one block stays below the margin restored at
//! the check. Check intervals are counted in samples, so smaller blocks keep the same cadence.

use serde::{Deserialize, Serialize};

/// Piecewise-linear safety-distance policy and collision check cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    /// Margin at or below unity (default: 512)
    pub base_distance: usize,
    /// Samples per unit ratio on (1.0, 1.5] (default: 5120)
    pub gentle_slope: f32,
    /// Samples per unit ratio on (1.5, 2.5] (default: 6144)
    pub steep_slope: f32,
    /// Samples per unit ratio above 2.5 (default: 8192)
    pub steepest_slope: f32,
    /// Margin is clamped to `capacity / capacity_divisor` (default: 6)
    pub capacity_divisor: usize,
    /// Callback size the check intervals are expressed in (default: 128)
    pub reference_block: usize,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            base_distance: 512,
            gentle_slope: 5120.0,
            steep_slope: 6144.0,
            steepest_slope: 8192.0,
            capacity_divisor: 6,
            reference_block: 128,
        }
    }
}

impl SafetyPolicy {
    pub fn min_safe_distance(&self, pitch_ratio: f32, capacity: usize) -> usize {
        let base = self.base_distance as f32;
        let distance = if pitch_ratio <= 1.0 {
            base
        } else if pitch_ratio <= 1.5 {
            base + (pitch_ratio - 1.0) * self.gentle_slope
        } else if pitch_ratio <= 2.5 {
            base + 0.5 * self.gentle_slope + (pitch_ratio - 1.5) * self.steep_slope
        } else {
            base + 0.5 * self.gentle_slope
                + self.steep_slope
                + (pitch_ratio - 2.5) * self.steepest_slope
        };
        let ceiling = capacity / self.capacity_divisor.max(1);
        (distance.round() as usize).min(ceiling)
    }

    /// Reference blocks between collision checks. Faster readers are checked more often.
    pub fn check_interval(&self, pitch_ratio: f32) -> u32 {
        if pitch_ratio > 2.0 {
            16
        } else if pitch_ratio > 1.5 {
            24
        } else if pitch_ratio > 1.2 {
            32
        } else {
            48
        }
    }

    /// [`check_interval`](Self::check_interval) in samples. The collision check runs before
    /// more than this many samples are read since the previous one, whatever the callback size.
    pub fn check_interval_samples(&self, pitch_ratio: f32) -> usize {
        self.check_interval(pitch_ratio) as usize * self.reference_block
    }

    /// Largest block the margins hold for. Every sample of a block is written before any is
    /// read, so one block closes the gap by up to `ratio * block` at once; longer host
    /// callbacks must be processed in slices of at most this size.
    pub fn max_block_size(&self) -> usize {
        self.reference_block
    }

    /// Largest lag tolerated below unity before the writer could lap the reader between
    /// two checks.
    pub fn lag_ceiling(&self, pitch_ratio: f32, capacity: usize) -> usize {
        let headroom = self.check_interval_samples(pitch_ratio) + self.reference_block;
        capacity
            .saturating_sub(self.min_safe_distance(pitch_ratio, capacity))
            .saturating_sub(headroom)
    }
}

/// [`SafetyPolicy::min_safe_distance`] with the default policy.
pub fn min_safe_distance(pitch_ratio: f32, capacity: usize) -> usize {
    SafetyPolicy::default().min_safe_distance(pitch_ratio, capacity)
}

/// Throttling and gating state owned by the resampler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyState {
    /// Samples read since the last collision check
    pub samples_since_check: usize,
    /// Samples that must be written after a reset before output resumes
    pub min_buffer_fill: usize,
    /// Samples written since the last reset
    pub filled_since_reset: usize,
    pub is_buffer_ready: bool,
}

impl SafetyState {
    pub(crate) fn arm(&mut self, min_buffer_fill: usize) {
        self.samples_since_check = 0;
        self.min_buffer_fill = min_buffer_fill;
        self.filled_since_reset = 0;
        self.is_buffer_ready = min_buffer_fill == 0;
    }

    pub(crate) fn record_written(&mut self, samples: usize) {
        self.filled_since_reset = self.filled_since_reset.saturating_add(samples);
        if self.filled_since_reset >= self.min_buffer_fill {
            self.is_buffer_ready = true;
        }
    }
}
