//! Centralized error type for the varipitch umbrella crate.
//!
//! Wraps all member crate errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] varipitch_core::Error),

    #[error("Transport: {0}")]
    Transport(#[from] varipitch_transport::Error),

    #[error("Playback: {0}")]
    Playback(#[from] varipitch_playback::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
