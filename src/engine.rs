//! VaripitchEngine that wires the producer, transport and consumer together.

use crate::{EngineConfig, Result, VaripitchEngineBuilder};
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use varipitch_core::{
    command_channel, CommandSender, PitchConfig, PitchProcessor, ProcessorMetrics,
    ProcessorMetricsSnapshot, ProcessorStatus,
};
use varipitch_playback::{
    playback_timeline, PlaybackMetricsSnapshot, PlaybackThread, PlaybackTimeline,
};
use varipitch_transport::{
    message_channel, PreviewEvent, SharedSegment, TransportMetrics, TransportMetricsSnapshot,
    TransportMode, TransportReader, TransportWriter,
};

/// Point-in-time counters from every stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    pub processor: ProcessorMetricsSnapshot,
    pub transport: TransportMetricsSnapshot,
    pub playback: PlaybackMetricsSnapshot,
}

/// Pitch-shift engine: one real-time producer, one transport, one playback consumer.
///
/// The [`PitchProcessor`] is handed to the host's audio callback with
/// [`take_processor`](Self::take_processor); the [`PlaybackTimeline`] goes to whatever renders
/// the consumer output with [`take_timeline`](Self::take_timeline). Everything else on this
/// type is control-side and may be called from any thread.
///
/// # Example
///
/// ```
/// use varipitch::prelude::*;
///
/// let mut engine = VaripitchEngine::builder().build()?;
/// let mut processor = engine.take_processor().unwrap();
///
/// engine.update_config(PitchConfig::with_pitch_ratio(0.75))?;
/// let mut output = [0.0f32; 128];
/// processor.process(&[0.0; 128], &mut output);
///
/// assert_eq!(engine.status().pitch_ratio(), 0.75);
/// engine.shutdown();
/// # Ok::<(), varipitch::Error>(())
/// ```
pub struct VaripitchEngine {
    config: EngineConfig,
    commands: CommandSender,
    processor: Option<PitchProcessor>,
    timeline: Option<PlaybackTimeline>,
    playback: PlaybackThread,
    processor_metrics: Arc<ProcessorMetrics>,
    processor_status: Arc<ProcessorStatus>,
    transport_metrics: Arc<TransportMetrics>,
    transmitting: AtomicBool,
    previewing: AtomicBool,
}

impl VaripitchEngine {
    pub fn builder() -> VaripitchEngineBuilder {
        VaripitchEngineBuilder::default()
    }

    pub(crate) fn from_config(config: EngineConfig, command_capacity: usize) -> Result<Self> {
        let sample_rate = config.sample_rate;
        let transport_metrics = Arc::new(TransportMetrics::new());

        let (writer, reader): (Box<dyn TransportWriter>, Box<dyn TransportReader>) =
            match config.transport.mode {
                TransportMode::Message => {
                    let (writer, reader) = message_channel(
                        config.transport.message,
                        sample_rate,
                        Arc::clone(&transport_metrics),
                    );
                    (Box::new(writer), Box::new(reader))
                }
                TransportMode::SharedRing => {
                    let ring = config.transport.ring;
                    let (writer, reader) =
                        SharedSegment::anonymous(ring.capacity_frames, ring.channels)?.split();
                    (
                        Box::new(writer.with_metrics(Arc::clone(&transport_metrics))),
                        Box::new(reader.with_sample_rate(sample_rate)),
                    )
                }
            };

        let (commands, receiver) = command_channel(command_capacity);
        let processor =
            PitchProcessor::new(config.processor_config(), receiver)?.with_transport(writer);

        let (timeline, handle) = playback_timeline(config.playback.queue_capacity);
        let playback =
            PlaybackThread::spawn(config.playback, sample_rate, reader, Box::new(handle))?;

        tracing::debug!(
            sample_rate,
            block_size = config.block_size,
            mode = ?config.transport.mode,
            "varipitch engine built"
        );

        Ok(Self {
            config,
            commands,
            processor_metrics: processor.metrics(),
            processor_status: processor.status(),
            processor: Some(processor),
            timeline: Some(timeline),
            playback,
            transport_metrics,
            transmitting: AtomicBool::new(false),
            previewing: AtomicBool::new(false),
        })
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// The real-time producer. `None` once taken.
    pub fn take_processor(&mut self) -> Option<PitchProcessor> {
        self.processor.take()
    }

    /// The consumer-side renderer. `None` once taken.
    pub fn take_timeline(&mut self) -> Option<PlaybackTimeline> {
        self.timeline.take()
    }

    /// Another handle for sending commands from a different thread.
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Validated here; applied before the processor's next block.
    pub fn update_config(&self, config: PitchConfig) -> Result<()> {
        self.commands.update_config(config)?;
        Ok(())
    }

    /// Route processed audio to the consumer and start playback.
    pub fn start_transmission(&self) -> Result<()> {
        self.playback.start()?;
        self.commands.start_transmission()?;
        self.transmitting.store(true, Ordering::Release);
        Ok(())
    }

    pub fn stop_transmission(&self) -> Result<()> {
        self.commands.stop_transmission()?;
        self.transmitting.store(false, Ordering::Release);
        if !self.is_previewing() {
            self.playback.stop()?;
        }
        Ok(())
    }

    /// Route processed audio to the consumer and emit a [`PreviewEvent`] per drained chunk.
    pub fn start_preview(&self) -> Result<()> {
        self.playback.set_previews(true)?;
        self.playback.start()?;
        self.commands.start_preview()?;
        self.previewing.store(true, Ordering::Release);
        Ok(())
    }

    pub fn stop_preview(&self) -> Result<()> {
        self.commands.stop_preview()?;
        self.previewing.store(false, Ordering::Release);
        self.playback.set_previews(false)?;
        if !self.is_transmitting() {
            self.playback.stop()?;
        }
        Ok(())
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting.load(Ordering::Acquire)
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing.load(Ordering::Acquire)
    }

    /// Switch the transport to a fresh in-process shared ring.
    pub fn attach_shared_buffer(&self, capacity: usize, channels: usize) -> Result<()> {
        self.attach_segment(SharedSegment::anonymous(capacity, channels)?)
    }

    /// Switch the transport to an existing shared segment, e.g. one opened by name.
    pub fn attach_segment(&self, segment: SharedSegment) -> Result<()> {
        tracing::debug!(
            capacity = segment.capacity(),
            channels = segment.channels(),
            "attaching shared ring"
        );
        let (writer, reader) = segment.split();
        let writer = writer.with_metrics(Arc::clone(&self.transport_metrics));
        let reader = reader.with_sample_rate(self.config.sample_rate);

        // Reader first so nothing the producer writes to the ring goes unread.
        self.playback.switch_reader(Box::new(reader))?;
        self.commands.attach_shared_buffer(writer)?;
        Ok(())
    }

    /// Preview event stream. Clones share one stream.
    pub fn subscribe_previews(&self) -> Receiver<PreviewEvent> {
        self.playback.subscribe_previews()
    }

    /// Published by the processor once per block.
    pub fn status(&self) -> Arc<ProcessorStatus> {
        Arc::clone(&self.processor_status)
    }

    pub fn metrics(&self) -> EngineMetrics {
        EngineMetrics {
            processor: self.processor_metrics.snapshot(),
            transport: self.transport_metrics.snapshot(),
            playback: self.playback.metrics().snapshot(),
        }
    }

    /// Stop the playback thread. Also runs on drop.
    pub fn shutdown(&mut self) {
        self.playback.shutdown();
    }
}
