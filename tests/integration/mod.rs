//! Integration test modules for varipitch
//!
//! - engine: builder, lifecycle, routing and both transport modes end to end
//! - processor: the real-time producer driven block by block
//! - transport: message queue and shared ring
//! - playback: scheduler plus timeline

pub mod engine;
pub mod playback;
pub mod processor;
pub mod transport;
