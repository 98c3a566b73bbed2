//! Error types for the playback side.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn playback thread")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("Playback thread is not running")]
    ChannelClosed,

    #[error(transparent)]
    Transport(#[from] varipitch_transport::Error),

    #[cfg(feature = "device")]
    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[cfg(feature = "device")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "device")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "device")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),
}

pub type Result<T> = std::result::Result<T, Error>;
