//! Builder for configuring and constructing a `VaripitchEngine`.

use crate::{EngineConfig, Result, VaripitchEngine};
use varipitch_core::PitchConfig;
use varipitch_playback::PlaybackConfig;
use varipitch_transport::TransportMode;

const DEFAULT_COMMAND_CAPACITY: usize = 256;

/// # Example
///
/// ```
/// use varipitch::prelude::*;
///
/// let mut engine = VaripitchEngine::builder()
///     .sample_rate(44100)
///     .block_size(128)
///     .pitch(PitchConfig::with_pitch_ratio(1.25))
///     .build()?;
///
/// let processor = engine.take_processor().unwrap();
/// assert_eq!(processor.sample_rate(), 44100);
/// # Ok::<(), varipitch::Error>(())
/// ```
pub struct VaripitchEngineBuilder {
    config: EngineConfig,
    command_capacity: usize,
}

impl Default for VaripitchEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

impl VaripitchEngineBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 48000
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 128
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    pub fn pitch(mut self, pitch: PitchConfig) -> Self {
        self.config.pitch = pitch;
        self
    }

    /// Default: [`TransportMode::Message`]
    pub fn transport_mode(mut self, mode: TransportMode) -> Self {
        self.config.transport.mode = mode;
        self
    }

    pub fn playback(mut self, playback: PlaybackConfig) -> Self {
        self.config.playback = playback;
        self
    }

    /// Control commands buffered for the real-time thread. Default: 256
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<VaripitchEngine> {
        self.config.validate()?;
        VaripitchEngine::from_config(self.config, self.command_capacity)
    }
}
