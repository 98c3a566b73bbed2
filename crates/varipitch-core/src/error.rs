//! Error types for varipitch-core.

use thiserror::Error;

/// Error type for control-side operations. The real-time path never returns errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Command channel full")]
    ChannelFull,

    #[error("Command channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Transport(#[from] varipitch_transport::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
