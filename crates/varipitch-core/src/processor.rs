//! The real-time producer.
//!
//! One [`PitchProcessor`] per stream, driven by the host's audio callback. It owns the delay
//! line, read cursor, safety state and filter memory outright; control threads reach it only
//! through the command channel and observe it through [`ProcessorStatus`] and
//! [`ProcessorMetrics`].

use crate::{
    CollisionCheck, CommandReceiver, ControlMessage, DelayLine, EngineCommand, FilterState,
    PitchConfig, PitchResampler, ProcessorConfig, ProcessorMetrics, ProcessorStatus, Result,
    ToneShaper,
};
use std::sync::Arc;
use varipitch_transport::{TransportMode, TransportWriter};

/// Delay-line pitch shifter with switchable output routing.
///
/// ```
/// use varipitch_core::{command_channel, PitchConfig, PitchProcessor, ProcessorConfig};
///
/// let (commands, receiver) = command_channel(16);
/// let mut processor = PitchProcessor::new(ProcessorConfig::default(), receiver)?;
///
/// commands.update_config(PitchConfig::with_pitch_ratio(0.8))?;
/// let input = [0.0f32; 128];
/// let mut output = [0.0f32; 128];
/// processor.process(&input, &mut output);
/// assert_eq!(processor.config().pitch_ratio, 0.8);
/// # Ok::<(), varipitch_core::Error>(())
/// ```
pub struct PitchProcessor {
    line: DelayLine,
    resampler: PitchResampler,
    tone: ToneShaper,
    config: PitchConfig,
    sample_rate: u32,
    transmitting: bool,
    previewing: bool,
    transport: Option<Box<dyn TransportWriter>>,
    commands: CommandReceiver,
    metrics: Arc<ProcessorMetrics>,
    status: Arc<ProcessorStatus>,
    input_scratch: Vec<f32>,
    max_block_size: usize,
    frames_processed: u64,
}

impl PitchProcessor {
    pub fn new(config: ProcessorConfig, commands: CommandReceiver) -> Result<Self> {
        config.validate()?;

        let line = DelayLine::new(config.resampler.capacity);
        let resampler = PitchResampler::new(
            line.capacity(),
            config.pitch.pitch_ratio,
            config.resampler.safety,
            config.resampler.damping,
            line.write_cursor(),
        );

        tracing::debug!(
            sample_rate = config.sample_rate,
            capacity = line.capacity(),
            pitch_ratio = config.pitch.pitch_ratio,
            "pitch processor created"
        );

        Ok(Self {
            line,
            resampler,
            tone: ToneShaper::new(config.tone.alpha, config.pitch.dry_wet),
            config: config.pitch,
            sample_rate: config.sample_rate,
            transmitting: false,
            previewing: false,
            transport: None,
            commands,
            metrics: Arc::new(ProcessorMetrics::new()),
            status: Arc::new(ProcessorStatus::new(
                config.pitch.pitch_ratio,
                config.pitch.dry_wet,
            )),
            input_scratch: Vec::with_capacity(config.max_block_size),
            max_block_size: config.max_block_size,
            frames_processed: 0,
        })
    }

    /// Transport used while transmitting or previewing.
    pub fn with_transport(mut self, transport: Box<dyn TransportWriter>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn transport_mode(&self) -> Option<TransportMode> {
        self.transport.as_ref().map(|t| t.mode())
    }

    pub fn metrics(&self) -> Arc<ProcessorMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn status(&self) -> Arc<ProcessorStatus> {
        Arc::clone(&self.status)
    }

    /// Last valid pitch config.
    pub fn config(&self) -> PitchConfig {
        self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Read cursor and its trace counters.
    pub fn resampler(&self) -> &PitchResampler {
        &self.resampler
    }

    pub fn delay_line(&self) -> &DelayLine {
        &self.line
    }

    pub fn filter_state(&self) -> FilterState {
        self.tone.filter_state()
    }

    /// Whether processed audio currently goes to the transport.
    pub fn is_routed(&self) -> bool {
        self.transmitting || self.previewing
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Apply every queued command. Called at the start of [`process`](Self::process).
    pub fn process_commands(&mut self) {
        while let Some(command) = self.commands.try_recv() {
            self.apply_command(command);
        }
    }

    /// Process one callback.
    ///
    /// `input` is written to the delay line and `output.len()` shaped samples are read back.
    /// Callbacks longer than `max_block_size` are processed in `max_block_size` pieces.
    /// While routed to the transport the samples are handed over and `output` is silenced.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        self.process_commands();
        self.metrics.record_callback();

        // Longer callbacks run as several slices: the scratch buffer never grows and no
        // single read outruns the safety margin.
        let max = self.max_block_size;
        if input.len() <= max && output.len() <= max {
            self.process_block(input, output);
            return;
        }
        let blocks = input.len().max(output.len()).div_ceil(max);
        for i in 0..blocks {
            let input = &input[(i * max).min(input.len())..((i + 1) * max).min(input.len())];
            let out_len = output.len();
            let output = &mut output[(i * max).min(out_len)..((i + 1) * max).min(out_len)];
            self.process_block(input, output);
        }
    }

    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        self.input_scratch.clear();
        let mut invalid = 0u64;
        for &sample in input {
            if sample.is_finite() {
                self.input_scratch.push(sample);
            } else {
                invalid += 1;
                self.input_scratch.push(0.0);
            }
        }
        self.metrics.record_invalid_samples(invalid);

        self.line.write(&self.input_scratch);
        self.resampler.record_written(input.len());

        let check = self
            .resampler
            .check_collision(self.line.write_cursor(), output.len());
        if self.handle_collision_check(check) {
            let mut gated = 0u64;
            for out in output.iter_mut() {
                *out = match self.resampler.next_sample(&self.line) {
                    Some(raw) => self.tone.apply(raw),
                    None => {
                        gated += 1;
                        0.0
                    }
                };
            }
            self.metrics.record_gated_samples(gated);
        } else {
            output.fill(0.0);
        }

        let routed = self.is_routed();
        if routed {
            if let Some(transport) = self.transport.as_mut() {
                transport.write_block(output, self.frames_processed);
                self.metrics.record_transmitted_block();
            }
            output.fill(0.0);
        }

        self.frames_processed += output.len() as u64;
        self.status.publish_block(
            routed,
            self.resampler.is_buffer_ready(),
            self.frames_processed,
        );
    }

    /// Returns whether the block may be read.
    fn handle_collision_check(&mut self, check: CollisionCheck) -> bool {
        match check {
            CollisionCheck::Skipped => true,
            CollisionCheck::Safe { .. } => {
                self.metrics.record_collision_check();
                true
            }
            CollisionCheck::Relocated {
                distance,
                min_distance,
            } => {
                self.metrics.record_collision_check();
                self.metrics.record_relocation();
                tracing::warn!(
                    distance,
                    min_distance,
                    pitch_ratio = self.config.pitch_ratio,
                    "read cursor too close to writer, relocated"
                );
                true
            }
            CollisionCheck::LagRelocated {
                distance,
                min_distance,
            } => {
                self.metrics.record_collision_check();
                self.metrics.record_relocation();
                tracing::warn!(
                    distance,
                    min_distance,
                    pitch_ratio = self.config.pitch_ratio,
                    "read cursor about to be lapped, relocated"
                );
                true
            }
            CollisionCheck::NotSafe {
                distance,
                min_distance,
            } => {
                self.metrics.record_collision_check();
                self.metrics.record_unsafe_block();
                tracing::warn!(
                    distance,
                    min_distance,
                    pitch_ratio = self.config.pitch_ratio,
                    "read cursor too close to writer below unity, emitting silence"
                );
                false
            }
        }
    }

    fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Control(ControlMessage::UpdateConfig(config)) => {
                self.apply_config(config)
            }
            EngineCommand::Control(ControlMessage::StartTransmission) => {
                if !self.transmitting {
                    self.transmitting = true;
                    self.smart_reset();
                }
            }
            EngineCommand::Control(ControlMessage::StopTransmission) => {
                if self.transmitting {
                    self.transmitting = false;
                    self.halt_emission();
                    self.smart_reset();
                }
            }
            EngineCommand::Control(ControlMessage::StartPreview) => {
                if !self.previewing {
                    self.previewing = true;
                    self.smart_reset();
                }
            }
            EngineCommand::Control(ControlMessage::StopPreview) => {
                if self.previewing {
                    self.previewing = false;
                    self.halt_emission();
                    self.smart_reset();
                }
            }
            EngineCommand::AttachSharedBuffer(writer) => {
                tracing::info!(
                    capacity = writer.capacity(),
                    channels = writer.channels(),
                    "attached shared ring transport"
                );
                if let Some(previous) = self.transport.as_mut() {
                    previous.discard();
                }
                self.transport = Some(writer);
            }
        }
    }

    fn apply_config(&mut self, config: PitchConfig) {
        if let Err(e) = config.validate() {
            self.metrics.record_rejected_config();
            tracing::warn!(error = %e, "rejected pitch config, keeping previous");
            return;
        }

        let crossed = self.config.crosses_unity(&config);
        self.config = config;
        self.resampler.set_pitch_ratio(config.pitch_ratio);
        self.tone.set_dry_wet(config.dry_wet);
        self.status
            .publish_config(config.pitch_ratio, config.dry_wet);

        if crossed {
            self.smart_reset();
        }
    }

    fn halt_emission(&mut self) {
        if !self.is_routed() {
            if let Some(transport) = self.transport.as_mut() {
                transport.discard();
            }
        }
    }

    fn smart_reset(&mut self) {
        let relocated = self.resampler.reset(self.line.write_cursor());
        self.tone.reset();
        self.metrics.record_reset();
        if relocated {
            self.metrics.record_relocation();
        }
        tracing::debug!(
            pitch_ratio = self.config.pitch_ratio,
            relocated,
            "smart reset"
        );
    }
}
