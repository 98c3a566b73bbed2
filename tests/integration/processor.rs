//! The real-time producer driven block by block, without a consumer.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use varipitch::prelude::*;

#[test]
fn test_identity_for_odd_lengths() {
    for len in [TEST_BLOCK_SIZE, 1000, 4097] {
        let (mut processor, _commands) = test_processor(PitchConfig::default());
        let input = generate_sine(1000.0, TEST_SAMPLE_RATE, len + 512);
        let output = run_blocks(&mut processor, &input);

        assert_silence(&output[..512], SILENCE_THRESHOLD);
        for (t, &sample) in output.iter().enumerate().skip(512) {
            assert_abs_diff_eq!(sample, input[t - 512], epsilon = FLOAT_EPSILON);
        }
    }
}

#[test]
fn test_pitch_sweep_stays_bounded() {
    let (mut processor, commands) = test_processor(PitchConfig::default());
    let input = generate_sine(220.0, TEST_SAMPLE_RATE, 64 * TEST_BLOCK_SIZE);

    for ratio in [0.25, 0.5, 0.9, 1.0, 1.1, 1.7, 2.2, 3.0, 4.0, 1.5, 0.6] {
        commands
            .update_config(PitchConfig::new(ratio, 1.0, 0.2))
            .unwrap();
        let output = run_blocks(&mut processor, &input);
        assert_bounded(&output, 1.0);
    }

    let metrics = processor.metrics().snapshot();
    assert_eq!(metrics.invalid_samples, 0);
    assert_eq!(metrics.rejected_configs, 0);
    assert!(metrics.collision_checks > 0);
}

#[test]
fn test_high_pass_removes_dc_when_wet() {
    let (mut processor, _commands) = test_processor(PitchConfig::new(1.0, 1.0, 1.0));
    let input = vec![0.5f32; 200 * TEST_BLOCK_SIZE];
    let output = run_blocks(&mut processor, &input);

    // Settled high-pass output of a constant input decays to zero.
    let tail = &output[output.len() - TEST_BLOCK_SIZE..];
    assert_silence(tail, DSP_EPSILON);
    assert!(peak(&output[512..1024]) > 0.1);
}

#[test]
fn test_dry_passes_dc() {
    let (mut processor, _commands) = test_processor(PitchConfig::default());
    let input = vec![0.5f32; 40 * TEST_BLOCK_SIZE];
    let output = run_blocks(&mut processor, &input);
    let tail = &output[output.len() - TEST_BLOCK_SIZE..];
    assert!(tail.iter().all(|&s| s == 0.5));
}

#[test]
fn test_non_finite_input_never_escapes() {
    let (mut processor, _commands) = test_processor(PitchConfig::new(1.3, 1.0, 0.7));
    let mut input = generate_sine(500.0, TEST_SAMPLE_RATE, 40 * TEST_BLOCK_SIZE);
    for i in (0..input.len()).step_by(97) {
        input[i] = if i % 2 == 0 { f32::NAN } else { f32::NEG_INFINITY };
    }

    let output = run_blocks(&mut processor, &input);
    assert_bounded(&output, 1.0);
    assert!(processor.metrics().snapshot().invalid_samples > 0);
}

#[test]
fn test_pitch_up_halves_the_period() {
    let (mut processor, _commands) = test_processor(PitchConfig::with_pitch_ratio(2.0));
    let input = generate_sine(300.0, TEST_SAMPLE_RATE, 96 * TEST_BLOCK_SIZE);
    let output = run_blocks(&mut processor, &input);

    let gate = varipitch::core::min_safe_distance(2.0, 32768);
    let window = &output[gate + 256..gate + 256 + 2048];
    let crossings = window
        .windows(2)
        .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
        .count();
    // 300 Hz input gives 12.8 cycles per 2048 samples; read at 2x, damped by at most 0.8.
    assert!((17..=30).contains(&crossings), "crossings {}", crossings);
}

#[test]
fn test_status_tracks_frames() {
    let (mut processor, _commands) = test_processor(PitchConfig::default());
    let status = processor.status();
    run_blocks(&mut processor, &generate_silence(10 * TEST_BLOCK_SIZE));
    assert_eq!(status.frames_processed(), 10 * TEST_BLOCK_SIZE as u64);
    assert!(status.is_buffer_ready());
    assert!(!status.is_routed());
}
