//! Real-time pitch-shift core.
//!
//! A circular delay line is written at unit rate and read back by a fractional cursor that
//! advances by the pitch ratio per output sample. A throttled collision check keeps the
//! reader a ratio-dependent distance behind the writer, a buffering gate silences the output
//! while that distance refills after a reset, and a one-pole high-pass with dry/wet mix shapes
//! the result.
//!
//! # Primary API
//!
//! - [`PitchProcessor`]: the per-stream producer driven by the audio callback
//! - [`command_channel`] / [`CommandSender`]: control from any thread
//! - [`PitchConfig`] / [`ProcessorConfig`]: parameters and their validation
//! - [`ProcessorStatus`] / [`ProcessorMetrics`]: lock-free observation
//!
//! The DSP building blocks ([`DelayLine`], [`PitchResampler`], [`ToneShaper`],
//! [`SafetyPolicy`]) are public for tests and offline use.

pub mod error;
pub use error::{Error, Result};

mod command;
pub use command::{command_channel, CommandReceiver, CommandSender, ControlMessage, EngineCommand};

mod config;
pub use config::{
    PitchConfig, ProcessorConfig, ResamplerSettings, ToneSettings, MAX_PITCH_RATIO,
};

mod delay_line;
pub use delay_line::DelayLine;

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat, ProcessorStatus};

mod metrics;
pub use metrics::{ProcessorMetrics, ProcessorMetricsSnapshot};

mod processor;
pub use processor::PitchProcessor;

mod resampler;
pub use resampler::{CollisionCheck, DampingPolicy, PitchResampler};

mod safety;
pub use safety::{min_safe_distance, SafetyPolicy, SafetyState};

mod tone;
pub use tone::{
    sanitize, FilterState, ToneShaper, CONSUMER_LIMIT, DRY_WET_THRESHOLD, PRODUCER_LIMIT,
};
