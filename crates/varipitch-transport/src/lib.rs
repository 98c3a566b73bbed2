//! Transport between the real-time pitch processor and the playback consumer.
//!
//! Two interchangeable strategies carry processed audio across threads:
//!
//! - **Message mode** ([`message_channel`]): the producer accumulates samples and moves whole
//!   [`TransportChunk`]s through a bounded lock-free queue. A full queue drops its oldest chunk.
//! - **Shared ring mode** ([`SharedSegment`]): an SPSC ring of interleaved frames with atomic
//!   cursors, usable in-process or across processes through a mapped file.
//!
//! Both sides are reached through the [`TransportWriter`] / [`TransportReader`] traits, so the
//! producer and consumer never depend on which strategy is active.
//!
//! # Example
//!
//! ```
//! use varipitch_transport::{SharedSegment, TransportReader, TransportWriter};
//!
//! let (mut writer, mut reader) = SharedSegment::anonymous(1024, 2)?.split();
//! writer.write_block(&[0.25; 128], 0);
//!
//! let chunk = reader.poll(usize::MAX).unwrap();
//! assert_eq!(chunk.len(), 128);
//! # Ok::<(), varipitch_transport::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod chunk;
pub use chunk::{PreviewEvent, TransportChunk};

mod config;
pub use config::{MessageConfig, RingConfig, TransportConfig, TransportMode};

mod message;
pub use message::{message_channel, ChunkReader, ChunkWriter};

mod metrics;
pub use metrics::{TransportMetrics, TransportMetricsSnapshot};

mod shared_ring;
pub use shared_ring::{
    available_read, available_write, SharedRingReader, SharedRingWriter, SharedSegment,
};

mod strategy;
pub use strategy::{TransportReader, TransportWriter};
