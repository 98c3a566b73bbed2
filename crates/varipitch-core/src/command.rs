//! Commands from control threads to the real-time processor.
//!
//! Commands travel over a bounded lock-free channel and are drained with `try_recv` at the
//! start of every callback, so each one takes effect before the next block is processed.

use crate::{Error, PitchConfig, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use varipitch_transport::SharedRingWriter;

/// Serializable control messages.
///
/// ```
/// use varipitch_core::ControlMessage;
///
/// let msg: ControlMessage = serde_json::from_str(
///     r#"{"type":"update-config","pitchRatio":1.5,"formantRatio":1.0,"dryWet":0.2}"#,
/// )?;
/// assert!(matches!(msg, ControlMessage::UpdateConfig(c) if c.pitch_ratio == 1.5));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Replace the pitch config. Rejected by the processor if invalid.
    UpdateConfig(PitchConfig),
    /// Route processed audio to the transport.
    StartTransmission,
    StopTransmission,
    /// Route processed audio to the transport for monitoring.
    StartPreview,
    StopPreview,
}

/// Everything the processor accepts.
pub enum EngineCommand {
    Control(ControlMessage),
    /// Switch the transport to the shared ring behind this writer.
    AttachSharedBuffer(Box<SharedRingWriter>),
}

impl From<ControlMessage> for EngineCommand {
    fn from(msg: ControlMessage) -> Self {
        EngineCommand::Control(msg)
    }
}

impl std::fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineCommand::Control(msg) => f.debug_tuple("Control").field(msg).finish(),
            EngineCommand::AttachSharedBuffer(writer) => f
                .debug_struct("AttachSharedBuffer")
                .field("capacity", &writer.capacity())
                .field("channels", &writer.channels())
                .finish(),
        }
    }
}

/// Create a bounded command channel.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Control-side handle. Cheap to clone.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<EngineCommand>,
}

impl CommandSender {
    /// Queue a command without blocking.
    pub fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => Error::ChannelFull,
            TrySendError::Disconnected(_) => Error::ChannelClosed,
        })
    }

    /// Validate and queue a config update. Invalid configs are never sent.
    pub fn update_config(&self, config: PitchConfig) -> Result<()> {
        config.validate()?;
        self.send(ControlMessage::UpdateConfig(config).into())
    }

    pub fn start_transmission(&self) -> Result<()> {
        self.send(ControlMessage::StartTransmission.into())
    }

    pub fn stop_transmission(&self) -> Result<()> {
        self.send(ControlMessage::StopTransmission.into())
    }

    pub fn start_preview(&self) -> Result<()> {
        self.send(ControlMessage::StartPreview.into())
    }

    pub fn stop_preview(&self) -> Result<()> {
        self.send(ControlMessage::StopPreview.into())
    }

    pub fn attach_shared_buffer(&self, writer: SharedRingWriter) -> Result<()> {
        self.send(EngineCommand::AttachSharedBuffer(Box::new(writer)))
    }
}

/// Real-time side of the command channel.
pub struct CommandReceiver {
    rx: Receiver<EngineCommand>,
}

impl CommandReceiver {
    #[inline]
    pub fn try_recv(&self) -> Option<EngineCommand> {
        self.rx.try_recv().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
