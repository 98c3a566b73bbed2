//! Pitch and processor configuration.

use crate::resampler::DampingPolicy;
use crate::safety::SafetyPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Highest pitch ratio the safety-distance defaults are tuned for.
pub const MAX_PITCH_RATIO: f32 = 4.0;

/// User-facing pitch parameters, applied once per callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchConfig {
    /// Read-rate multiplier, > 1 raises pitch
    pub pitch_ratio: f32,
    /// Carried with the config for hosts that track it; not used by the resampler
    pub formant_ratio: f32,
    /// 0 = raw interpolated signal, 1 = fully high-passed
    pub dry_wet: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            pitch_ratio: 1.0,
            formant_ratio: 1.0,
            dry_wet: 0.0,
        }
    }
}

impl PitchConfig {
    pub fn new(pitch_ratio: f32, formant_ratio: f32, dry_wet: f32) -> Self {
        Self {
            pitch_ratio,
            formant_ratio,
            dry_wet,
        }
    }

    pub fn with_pitch_ratio(pitch_ratio: f32) -> Self {
        Self {
            pitch_ratio,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pitch_ratio.is_finite() || self.pitch_ratio <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "Pitch ratio must be positive, got {}",
                self.pitch_ratio
            )));
        }
        if self.pitch_ratio > MAX_PITCH_RATIO {
            return Err(Error::InvalidConfig(format!(
                "Pitch ratio {} exceeds maximum {}",
                self.pitch_ratio, MAX_PITCH_RATIO
            )));
        }
        if !self.formant_ratio.is_finite() || self.formant_ratio < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "Formant ratio must be non-negative, got {}",
                self.formant_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.dry_wet) {
            return Err(Error::InvalidConfig(format!(
                "Dry/wet must be between 0.0 and 1.0, got {}",
                self.dry_wet
            )));
        }
        Ok(())
    }

    /// True when moving to `next` flips which side of unity the ratio is on.
    pub fn crosses_unity(&self, next: &PitchConfig) -> bool {
        (self.pitch_ratio > 1.0) != (next.pitch_ratio > 1.0)
    }
}

/// Delay line size and the tunable constants that keep the read cursor safe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResamplerSettings {
    /// Delay line capacity in samples (default: 32768)
    pub capacity: usize,
    pub safety: SafetyPolicy,
    pub damping: DampingPolicy,
}

impl Default for ResamplerSettings {
    fn default() -> Self {
        Self {
            capacity: 32768,
            safety: SafetyPolicy::default(),
            damping: DampingPolicy::default(),
        }
    }
}

impl ResamplerSettings {
    /// Smallest line the check cadence can protect.
    pub const MIN_CAPACITY: usize = 4096;

    pub fn validate(&self) -> Result<()> {
        if self.capacity < Self::MIN_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "Delay line capacity must be at least {}, got {}",
                Self::MIN_CAPACITY,
                self.capacity
            )));
        }
        if self.safety.capacity_divisor < 2 {
            return Err(Error::InvalidConfig(
                "Safety capacity divisor must be at least 2".to_string(),
            ));
        }
        if self.safety.reference_block == 0 {
            return Err(Error::InvalidConfig(
                "Reference block must be at least 1 sample".to_string(),
            ));
        }
        let damping = &self.damping;
        let factors_ok = damping.near_factor > 0.0
            && damping.near_factor <= 1.0
            && damping.far_factor > 0.0
            && damping.far_factor <= 1.0;
        let fractions_ok = damping.near_fraction >= 0.0
            && damping.near_fraction <= damping.far_fraction
            && damping.far_fraction <= 1.0;
        if !factors_ok || !fractions_ok {
            return Err(Error::InvalidConfig(format!(
                "Invalid damping policy: {:?}",
                damping
            )));
        }
        Ok(())
    }
}

/// High-pass pole for the tone stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSettings {
    /// (default: 0.95)
    pub alpha: f32,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self { alpha: 0.95 }
    }
}

impl ToneSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "Filter alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Everything needed to build a [`PitchProcessor`](crate::PitchProcessor).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// (default: 48000)
    pub sample_rate: u32,
    /// Processing slice; longer callbacks are split, at most the safety reference block
    /// (default: 128)
    pub max_block_size: usize,
    pub pitch: PitchConfig,
    pub resampler: ResamplerSettings,
    pub tone: ToneSettings,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            max_block_size: 128,
            pitch: PitchConfig::default(),
            resampler: ResamplerSettings::default(),
            tone: ToneSettings::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig(
                "Sample rate must be positive".to_string(),
            ));
        }
        self.resampler.validate()?;
        let limit = self.resampler.safety.max_block_size();
        if self.max_block_size == 0 || self.max_block_size > limit {
            return Err(Error::InvalidConfig(format!(
                "Block size must be between 1 and {}, got {}",
                limit, self.max_block_size
            )));
        }
        if self.max_block_size * 4 > self.resampler.capacity {
            return Err(Error::InvalidConfig(format!(
                "Block size {} exceeds a quarter of capacity {}",
                self.max_block_size, self.resampler.capacity
            )));
        }
        self.pitch.validate()?;
        self.tone.validate()
    }
}
