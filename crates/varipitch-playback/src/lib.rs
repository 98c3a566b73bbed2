//! Consumer side of the varipitch engine.
//!
//! Chunks drained from the transport land in a bounded [`PlaybackQueue`]. The
//! [`PlaybackScheduler`] holds off until a small cushion is queued, then turns chunks into
//! playback buffers scheduled back to back on a [`PlaybackSink`]'s sample clock. The
//! [`PlaybackThread`] runs this loop off the real-time thread, and [`PlaybackTimeline`] renders
//! the scheduled buffers sample-accurately from an output callback.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use varipitch_playback::{
//!     playback_timeline, PlaybackConfig, PlaybackMetrics, PlaybackScheduler, TickOutcome,
//! };
//! use varipitch_transport::TransportChunk;
//!
//! let (mut timeline, mut handle) = playback_timeline(16);
//! let mut scheduler =
//!     PlaybackScheduler::new(PlaybackConfig::default(), 48000, Arc::new(PlaybackMetrics::new()))?;
//! scheduler.start();
//!
//! scheduler.enqueue(TransportChunk::new(vec![0.5; 1024], 48000, 0));
//! assert!(matches!(scheduler.tick(&mut handle), TickOutcome::Scheduled { .. }));
//!
//! let mut out = [0.0f32; 256];
//! timeline.render(&mut out, 1);
//! assert_eq!(out[0], 0.5);
//! # Ok::<(), varipitch_playback::Error>(())
//! ```
//!
//! # Features
//!
//! - `device`: [`DeviceOutput`], a CPAL output stream rendering a [`PlaybackTimeline`]

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::PlaybackConfig;

mod metrics;
pub use metrics::{PlaybackMetrics, PlaybackMetricsSnapshot};

mod queue;
pub use queue::PlaybackQueue;

mod scheduler;
pub use scheduler::{PlaybackScheduler, TickOutcome};

mod sink;
pub use sink::{PlaybackSink, ScheduledBuffer};

mod thread;
pub use thread::{PlaybackCommand, PlaybackThread};

mod timeline;
pub use timeline::{playback_timeline, PlaybackTimeline, TimelineHandle};

#[cfg(feature = "device")]
mod device;
#[cfg(feature = "device")]
pub use device::DeviceOutput;
