//! Test helpers and fixtures for varipitch integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity pitch)
//! - `DSP_EPSILON` (1e-4): DSP processing (interpolation, filters)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use std::time::{Duration, Instant};
use varipitch::core::CommandSender;
use varipitch::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: u32 = 48000;

/// Real-time callback size used throughout the tests
pub const TEST_BLOCK_SIZE: usize = 128;

/// Route `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Create an engine with default configuration.
pub fn test_engine() -> VaripitchEngine {
    init_tracing();
    VaripitchEngine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .block_size(TEST_BLOCK_SIZE)
        .build()
        .expect("Failed to create test engine")
}

/// Standalone processor with its command sender, no consumer attached.
pub fn test_processor(pitch: PitchConfig) -> (PitchProcessor, CommandSender) {
    init_tracing();
    let (commands, receiver) = varipitch::command_channel(64);
    let config = EngineConfig {
        pitch,
        ..Default::default()
    };
    let processor = PitchProcessor::new(config.processor_config(), receiver)
        .expect("Failed to create test processor");
    (processor, commands)
}

/// Feed `input` through the processor in `TEST_BLOCK_SIZE` callbacks and collect the output.
pub fn run_blocks(processor: &mut PitchProcessor, input: &[f32]) -> Vec<f32> {
    let mut output = Vec::with_capacity(input.len());
    let mut block = [0.0f32; TEST_BLOCK_SIZE];
    for chunk in input.chunks(TEST_BLOCK_SIZE) {
        let out = &mut block[..chunk.len()];
        processor.process(chunk, out);
        output.extend_from_slice(out);
    }
    output
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Rising ramp in [0, 1) followed by `padding` samples of silence.
pub fn generate_padded_ramp(num_samples: usize, padding: usize) -> Vec<f32> {
    let mut samples: Vec<f32> = (0..num_samples)
        .map(|i| i as f32 / num_samples as f32)
        .collect();
    samples.resize(num_samples + padding, 0.0);
    samples
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Assert every sample is finite and within `[-limit, limit]`.
pub fn assert_bounded(samples: &[f32], limit: f32) {
    for (i, s) in samples.iter().enumerate() {
        assert!(
            s.is_finite() && s.abs() <= limit,
            "Sample {} out of range: {}",
            i,
            s
        );
    }
}

/// Poll `condition` every millisecond until it holds or `max_wait_ms` elapses.
pub fn wait_until(max_wait_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(max_wait_ms);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}
