//! The consumer domain.
//!
//! A named thread drains the transport reader into the scheduler and ticks it against the
//! sink. It wakes on control commands, on the poll interval, or after the underrun retry
//! delay, and never touches producer-owned state.

use crate::{
    Error, PlaybackConfig, PlaybackMetrics, PlaybackScheduler, PlaybackSink, Result, TickOutcome,
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::Arc;
use std::thread;
use varipitch_transport::{PreviewEvent, TransportReader};

const COMMAND_QUEUE_SIZE: usize = 64;

pub enum PlaybackCommand {
    /// Begin buffering and scheduling.
    Start,
    /// Flush queued chunks and stop scheduling.
    Stop,
    /// Emit a [`PreviewEvent`] for every drained chunk.
    SetPreviews(bool),
    /// Replace the transport reader, e.g. after attaching a shared ring.
    SwitchReader(Box<dyn TransportReader>),
    Shutdown,
}

impl std::fmt::Debug for PlaybackCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Stop => write!(f, "Stop"),
            Self::SetPreviews(enabled) => write!(f, "SetPreviews({})", enabled),
            Self::SwitchReader(reader) => write!(f, "SwitchReader({:?})", reader.mode()),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Handle to the playback thread. Shuts the thread down when dropped.
pub struct PlaybackThread {
    commands: Sender<PlaybackCommand>,
    previews: Receiver<PreviewEvent>,
    metrics: Arc<PlaybackMetrics>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl PlaybackThread {
    pub fn spawn(
        config: PlaybackConfig,
        sample_rate: u32,
        reader: Box<dyn TransportReader>,
        sink: Box<dyn PlaybackSink>,
    ) -> Result<Self> {
        let metrics = Arc::new(PlaybackMetrics::new());
        let scheduler = PlaybackScheduler::new(config, sample_rate, Arc::clone(&metrics))?;
        let (command_tx, command_rx) = bounded(COMMAND_QUEUE_SIZE);
        let (preview_tx, preview_rx) = bounded(config.preview_capacity);

        let worker = Worker {
            config,
            scheduler,
            reader,
            sink,
            commands: command_rx,
            previews: preview_tx,
            previews_enabled: false,
            metrics: Arc::clone(&metrics),
        };

        let thread_handle = thread::Builder::new()
            .name("varipitch-playback".to_string())
            .spawn(move || worker.run())
            .map_err(Error::ThreadSpawn)?;

        Ok(Self {
            commands: command_tx,
            previews: preview_rx,
            metrics,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn send(&self, command: PlaybackCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::ChannelClosed)
    }

    pub fn start(&self) -> Result<()> {
        self.send(PlaybackCommand::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(PlaybackCommand::Stop)
    }

    pub fn set_previews(&self, enabled: bool) -> Result<()> {
        self.send(PlaybackCommand::SetPreviews(enabled))
    }

    pub fn switch_reader(&self, reader: Box<dyn TransportReader>) -> Result<()> {
        self.send(PlaybackCommand::SwitchReader(reader))
    }

    /// Receiver for preview events. Clones share one stream; each event goes to one of them.
    pub fn subscribe_previews(&self) -> Receiver<PreviewEvent> {
        self.previews.clone()
    }

    pub fn metrics(&self) -> Arc<PlaybackMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the thread and wait for it. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.commands.send(PlaybackCommand::Shutdown);
            if handle.join().is_err() {
                tracing::error!("playback thread panicked");
            }
        }
    }
}

impl Drop for PlaybackThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    config: PlaybackConfig,
    scheduler: PlaybackScheduler,
    reader: Box<dyn TransportReader>,
    sink: Box<dyn PlaybackSink>,
    commands: Receiver<PlaybackCommand>,
    previews: Sender<PreviewEvent>,
    previews_enabled: bool,
    metrics: Arc<PlaybackMetrics>,
}

impl Worker {
    fn run(mut self) {
        tracing::debug!(mode = ?self.reader.mode(), "playback thread started");
        let mut wait = self.config.poll_interval();

        loop {
            match self.commands.recv_timeout(wait) {
                Ok(PlaybackCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
            }

            wait = match self.pump() {
                TickOutcome::Underrun { retry_after } => retry_after,
                _ => self.config.poll_interval(),
            };
        }

        self.scheduler.stop();
        tracing::debug!("playback thread stopped");
    }

    fn handle(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Start => self.scheduler.start(),
            PlaybackCommand::Stop => {
                self.scheduler.stop();
                // Whatever is still in transit belongs to the stopped stream.
                while let Some(chunk) = self.reader.poll(usize::MAX) {
                    self.reader.recycle(chunk.into_payload());
                }
            }
            PlaybackCommand::SetPreviews(enabled) => self.previews_enabled = enabled,
            PlaybackCommand::SwitchReader(reader) => {
                tracing::debug!(
                    from = ?self.reader.mode(),
                    to = ?reader.mode(),
                    "switching transport reader"
                );
                self.reader = reader;
            }
            PlaybackCommand::Shutdown => {}
        }
    }

    fn pump(&mut self) -> TickOutcome {
        if !self.scheduler.is_running() {
            return TickOutcome::Stopped;
        }

        let max_frames = self.config.target_buffer_frames;
        while let Some(chunk) = self.reader.poll(max_frames) {
            if self.previews_enabled {
                self.emit_preview(PreviewEvent::from(&chunk));
            }
            self.scheduler.enqueue(chunk);
        }

        let outcome = self.scheduler.tick(self.sink.as_mut());
        self.recycle_payloads();
        outcome
    }

    /// Hand merged and finished payloads back to the transport for reuse by the producer.
    fn recycle_payloads(&mut self) {
        for payload in self.scheduler.drain_spent() {
            self.reader.recycle(payload);
        }
        while let Some(payload) = self.sink.reclaim() {
            self.reader.recycle(payload);
        }
    }

    fn emit_preview(&self, event: PreviewEvent) {
        match self.previews.try_send(event) {
            Ok(()) => self.metrics.record_preview(true),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.metrics.record_preview(false)
            }
        }
    }
}
