//! Error types for varipitch-transport.

use thiserror::Error;

/// Error type for transport setup. Steady-state transfer never fails; it drops and counts.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid ring layout: capacity={capacity}, channels={channels}")]
    InvalidLayout { capacity: usize, channels: usize },

    #[error("Shared memory error: {0}")]
    SharedMemory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
