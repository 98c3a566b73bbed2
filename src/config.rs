//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use varipitch_core::{PitchConfig, ProcessorConfig, ResamplerSettings, ToneSettings};
use varipitch_playback::PlaybackConfig;
use varipitch_transport::TransportConfig;

/// Everything the engine needs, in one serializable struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Processing slice in samples, at most 128; longer callbacks are split
    pub block_size: usize,
    pub pitch: PitchConfig,
    pub resampler: ResamplerSettings,
    pub tone: ToneSettings,
    pub transport: TransportConfig,
    pub playback: PlaybackConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 128,
            pitch: PitchConfig::default(),
            resampler: ResamplerSettings::default(),
            tone: ToneSettings::default(),
            transport: TransportConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000..=384_000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        self.processor_config().validate()?;
        self.transport.validate()?;
        self.playback.validate()?;
        Ok(())
    }

    /// The producer's share of the configuration.
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            sample_rate: self.sample_rate,
            max_block_size: self.block_size,
            pitch: self.pitch,
            resampler: self.resampler,
            tone: self.tone,
        }
    }
}
