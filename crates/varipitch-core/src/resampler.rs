//! Variable-rate read head over the delay line.
//!
//! The read cursor advances by the pitch ratio per output sample, damped when a fast reader
//! gets close to the write cursor. A throttled collision check restores the safety margin by
//! relocating the cursor, and a buffering gate keeps the output silent after a reset until
//! enough fresh samples exist behind the write cursor.

use crate::safety::{SafetyPolicy, SafetyState};
use crate::DelayLine;
use serde::{Deserialize, Serialize};

/// Step damping applied to fast readers near the write cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampingPolicy {
    /// Damping only applies above this ratio (default: 1.8)
    pub ratio_threshold: f32,
    /// Distance below this fraction of capacity uses `near_factor` (default: 0.2)
    pub near_fraction: f32,
    /// (default: 0.8)
    pub near_factor: f32,
    /// Distance below this fraction of capacity uses `far_factor` (default: 0.3)
    pub far_fraction: f32,
    /// (default: 0.9)
    pub far_factor: f32,
}

impl Default for DampingPolicy {
    fn default() -> Self {
        Self {
            ratio_threshold: 1.8,
            near_fraction: 0.2,
            near_factor: 0.8,
            far_fraction: 0.3,
            far_factor: 0.9,
        }
    }
}

impl DampingPolicy {
    /// Multiplier for the nominal step at the given live distance.
    #[inline]
    pub fn factor(&self, pitch_ratio: f32, distance: f64, capacity: usize) -> f64 {
        if pitch_ratio <= self.ratio_threshold {
            return 1.0;
        }
        let capacity = capacity as f64;
        if distance < self.near_fraction as f64 * capacity {
            self.near_factor as f64
        } else if distance < self.far_fraction as f64 * capacity {
            self.far_factor as f64
        } else {
            1.0
        }
    }
}

/// Outcome of [`PitchResampler::check_collision`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionCheck {
    /// Not due this callback.
    Skipped,
    Safe { distance: f64 },
    /// A fast reader was moved back to restore the margin.
    Relocated { distance: f64, min_distance: usize },
    /// A slow reader lagged so far that the writer would lap it; moved forward.
    LagRelocated { distance: f64, min_distance: usize },
    /// Below unity with too small a gap. The caller emits silence and holds the cursor.
    NotSafe { distance: f64, min_distance: usize },
}

/// Fractional read cursor plus the safety bookkeeping that governs it.
#[derive(Debug, Clone)]
pub struct PitchResampler {
    read_pos: f64,
    capacity: usize,
    pitch_ratio: f32,
    policy: SafetyPolicy,
    damping: DampingPolicy,
    state: SafetyState,
    check_pending: bool,
    travelled: f64,
    active_samples: u64,
}

impl PitchResampler {
    /// Start `min_safe_distance(pitch_ratio)` samples behind `write_cursor`, gated until that
    /// many samples have been written.
    pub fn new(
        capacity: usize,
        pitch_ratio: f32,
        policy: SafetyPolicy,
        damping: DampingPolicy,
        write_cursor: usize,
    ) -> Self {
        let mut resampler = Self {
            read_pos: 0.0,
            capacity: capacity.max(2),
            pitch_ratio,
            policy,
            damping,
            state: SafetyState::default(),
            check_pending: false,
            travelled: 0.0,
            active_samples: 0,
        };
        let start = resampler.min_safe_distance();
        resampler.place_behind(write_cursor, start);
        resampler.state.arm(start);
        resampler
    }

    #[inline]
    pub fn read_position(&self) -> f64 {
        self.read_pos
    }

    #[inline]
    pub fn pitch_ratio(&self) -> f32 {
        self.pitch_ratio
    }

    pub fn safety_state(&self) -> SafetyState {
        self.state
    }

    pub fn is_buffer_ready(&self) -> bool {
        self.state.is_buffer_ready
    }

    /// Sum of every resampling step taken, excluding relocations and gated samples.
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    /// Samples read while the gate was open.
    pub fn active_samples(&self) -> u64 {
        self.active_samples
    }

    pub fn min_safe_distance(&self) -> usize {
        self.policy.min_safe_distance(self.pitch_ratio, self.capacity)
    }

    /// Samples between the read cursor and the write cursor, going forward.
    #[inline]
    pub fn distance(&self, write_cursor: usize) -> f64 {
        (write_cursor as f64 - self.read_pos).rem_euclid(self.capacity as f64)
    }

    /// Change the nominal ratio. The next callback runs a collision check.
    pub fn set_pitch_ratio(&mut self, pitch_ratio: f32) {
        if pitch_ratio != self.pitch_ratio {
            self.pitch_ratio = pitch_ratio;
            self.check_pending = true;
        }
    }

    /// Account for samples written to the line since the last reset.
    pub fn record_written(&mut self, samples: usize) {
        self.state.record_written(samples);
    }

    /// Run the throttled collision check. Call once per block, after writing the block and
    /// before reading `block_len` samples. The check fires whenever reading the block would
    /// take the reader past its interval since the last check.
    pub fn check_collision(&mut self, write_cursor: usize, block_len: usize) -> CollisionCheck {
        let interval = self.policy.check_interval_samples(self.pitch_ratio);
        let due = self.state.samples_since_check + block_len > interval;
        if !self.check_pending && !due {
            self.state.samples_since_check += block_len;
            return CollisionCheck::Skipped;
        }
        self.check_pending = false;
        self.state.samples_since_check = block_len;

        let min_distance = self.min_safe_distance();
        let distance = self.distance(write_cursor);

        if distance < min_distance as f64 {
            if self.pitch_ratio > 1.0 {
                self.place_behind(write_cursor, min_distance);
                return CollisionCheck::Relocated {
                    distance,
                    min_distance,
                };
            }
            return CollisionCheck::NotSafe {
                distance,
                min_distance,
            };
        }

        if self.pitch_ratio < 1.0
            && distance > self.policy.lag_ceiling(self.pitch_ratio, self.capacity) as f64
        {
            self.place_behind(write_cursor, min_distance);
            return CollisionCheck::LagRelocated {
                distance,
                min_distance,
            };
        }

        CollisionCheck::Safe { distance }
    }

    /// Smart reset. Above unity the cursor is moved to `min_safe_distance` behind the writer
    /// and the gate re-armed for that many samples; at or below unity only the check
    /// throttle restarts. Returns whether the cursor moved.
    pub fn reset(&mut self, write_cursor: usize) -> bool {
        self.state.samples_since_check = 0;
        if self.pitch_ratio > 1.0 {
            let min_distance = self.min_safe_distance();
            self.place_behind(write_cursor, min_distance);
            self.state.arm(min_distance);
            true
        } else {
            false
        }
    }

    /// Nominal step with damping applied for the current live distance.
    #[inline]
    pub fn step(&self, write_cursor: usize) -> f64 {
        let factor =
            self.damping
                .factor(self.pitch_ratio, self.distance(write_cursor), self.capacity);
        self.pitch_ratio as f64 * factor
    }

    /// Move the cursor forward by `step`, wrapping at capacity.
    ///
    /// At or above unity a step that would leave the integer part unchanged is widened to
    /// land on the next integer, so no sample is read twice. Below unity the reader revisits
    /// a slot at a different fractional offset by construction.
    #[inline]
    pub fn advance(&mut self, step: f64) {
        let current = self.read_pos.floor();
        let mut next = self.read_pos + step;
        if self.pitch_ratio >= 1.0 && next.floor() <= current {
            next = current + 1.0;
        }
        self.travelled += next - self.read_pos;
        self.active_samples += 1;
        self.read_pos = next.rem_euclid(self.capacity as f64);
    }

    /// Read one interpolated sample and advance. `None` while the buffering gate is closed;
    /// the cursor then tracks the writer one sample at a time.
    #[inline]
    pub fn next_sample(&mut self, line: &DelayLine) -> Option<f32> {
        if !self.state.is_buffer_ready {
            self.read_pos = (self.read_pos + 1.0).rem_euclid(self.capacity as f64);
            return None;
        }
        let value = line.read_at(self.read_pos);
        let step = self.step(line.write_cursor());
        self.advance(step);
        Some(value)
    }

    fn place_behind(&mut self, write_cursor: usize, distance: usize) {
        let distance = distance % self.capacity;
        self.read_pos = ((write_cursor % self.capacity + self.capacity - distance)
            % self.capacity) as f64;
    }
}
