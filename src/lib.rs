//! # Varipitch - Real-time Pitch-Shift Engine
//!
//! A variable-rate circular-buffer resampler for live audio, a producer/consumer transport
//! that moves processed audio off the real-time thread, and a scheduler that turns irregular
//! chunks into gapless playback.
//!
//! ## Architecture
//!
//! Varipitch is an umbrella crate that coordinates:
//! - **varipitch-core** - Delay line, safety-distance policy, pitch resampler, tone shaping,
//!   command channel and the real-time [`PitchProcessor`]
//! - **varipitch-transport** - Chunked message queue and shared-memory SPSC ring
//! - **varipitch-playback** - Playback queue, sample-clock scheduler, timeline and consumer thread
//!
//! ## Quick Start
//!
//! ```
//! use varipitch::prelude::*;
//!
//! let mut engine = VaripitchEngine::builder()
//!     .sample_rate(48000)
//!     .pitch(PitchConfig::with_pitch_ratio(1.5))
//!     .build()?;
//!
//! // Hand the processor to the audio callback
//! let mut processor = engine.take_processor().unwrap();
//! let input = [0.0f32; 128];
//! let mut output = [0.0f32; 128];
//! processor.process(&input, &mut output);
//!
//! // Control from any thread
//! engine.update_config(PitchConfig::new(0.8, 1.0, 0.3))?;
//! engine.start_transmission()?;
//! # engine.shutdown();
//! # Ok::<(), varipitch::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `device` - CPAL output for the playback timeline ([`playback::DeviceOutput`])

/// Re-export of varipitch-core for direct access
pub use varipitch_core as core;
/// Re-export of varipitch-playback for direct access
pub use varipitch_playback as playback;
/// Re-export of varipitch-transport for direct access
pub use varipitch_transport as transport;

pub use varipitch_core::{
    command_channel, CommandSender, ControlMessage, EngineCommand, PitchConfig, PitchProcessor,
    ProcessorMetricsSnapshot, ProcessorStatus, MAX_PITCH_RATIO,
};
pub use varipitch_playback::{PlaybackConfig, PlaybackMetricsSnapshot, PlaybackTimeline};
pub use varipitch_transport::{
    PreviewEvent, SharedSegment, TransportChunk, TransportConfig, TransportMetricsSnapshot,
    TransportMode,
};

pub mod error;
pub use error::{Error, Result};

mod builder;
mod config;
mod engine;

pub use builder::VaripitchEngineBuilder;
pub use config::EngineConfig;
pub use engine::{EngineMetrics, VaripitchEngine};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{EngineConfig, EngineMetrics, VaripitchEngine, VaripitchEngineBuilder};

    // Producer
    pub use crate::{ControlMessage, PitchConfig, PitchProcessor, MAX_PITCH_RATIO};

    // Transport and consumer
    pub use crate::{PlaybackConfig, PlaybackTimeline, PreviewEvent, TransportMode};

    // Error handling
    pub use crate::{Error, Result};
}
