//! End-to-end scenarios for the pitch processor and playback queue.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::tolerances::*;
use helpers::*;
use std::sync::Arc;
use varipitch::playback::{PlaybackConfig, PlaybackMetrics, PlaybackScheduler};
use varipitch::prelude::*;
use varipitch::transport::TransportChunk;

#[test]
fn scenario_unity_passthrough() {
    let (mut processor, _commands) = test_processor(PitchConfig::new(1.0, 1.0, 0.0));

    let sine = generate_sine(1000.0, TEST_SAMPLE_RATE, 480);
    let mut input = sine.clone();
    input.resize(8 * TEST_BLOCK_SIZE, 0.0);
    let output = run_blocks(&mut processor, &input);

    let delay = 512;
    assert_silence(&output[..delay], SILENCE_THRESHOLD);
    for (i, (&out, &expected)) in output[delay..delay + 480].iter().zip(&sine).enumerate() {
        assert!(
            (out - expected).abs() <= FLOAT_EPSILON,
            "sample {}: {} != {}",
            i,
            out,
            expected
        );
    }
    assert_silence(&output[delay + 480..], SILENCE_THRESHOLD);
}

#[test]
fn scenario_double_pitch_reads_two_samples_per_output() {
    let (mut processor, _commands) = test_processor(PitchConfig::with_pitch_ratio(2.0));

    // Output stays gated until min_safe_distance(2.0) samples are buffered.
    let gate = varipitch::core::min_safe_distance(2.0, 32768);
    let input = generate_padded_ramp(2048, gate + 2048);
    let output = run_blocks(&mut processor, &input);
    assert_eq!(output.len(), input.len());
    assert_silence(&output[..gate], SILENCE_THRESHOLD);

    let resampler = processor.resampler();
    assert!(resampler.active_samples() > 0);
    let advance = resampler.travelled() / resampler.active_samples() as f64;
    // Above 1.8 the step may be damped near the writer, never below 0.8x.
    assert!(
        (0.8 * 2.0..=2.0 + 1e-9).contains(&advance),
        "average advance {}",
        advance
    );
    assert_bounded(&output, 1.0);
}

#[test]
fn scenario_boundary_crossing() {
    let (mut processor, commands) = test_processor(PitchConfig::new(0.8, 1.0, 0.5));
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, 45 * TEST_BLOCK_SIZE);
    run_blocks(&mut processor, &input[..20 * TEST_BLOCK_SIZE]);
    let before = processor.metrics().snapshot();

    commands
        .update_config(PitchConfig::new(1.3, 1.0, 0.5))
        .unwrap();
    let mut output = run_blocks(&mut processor, &input[20 * TEST_BLOCK_SIZE..21 * TEST_BLOCK_SIZE]);

    let crossed = processor.metrics().snapshot();
    assert_eq!(crossed.resets - before.resets, 1);
    assert_eq!(crossed.relocations - before.relocations, 1);
    assert!(processor.filter_state().is_zeroed());

    // The reset re-arms the buffering gate; keep going until audio comes back.
    output.extend(run_blocks(&mut processor, &input[21 * TEST_BLOCK_SIZE..]));
    let after = processor.metrics().snapshot();
    let gated = (after.gated_samples - before.gated_samples) as usize;
    assert!(gated > 0, "gate did not re-arm on the reset");
    assert!(gated + 100 <= output.len(), "gate still closed after {} samples", gated);
    assert_eq!(after.resets, crossed.resets);

    assert_silence(&output[..gated], SILENCE_THRESHOLD);
    let audible = &output[gated..gated + 100];
    assert_bounded(audible, 1.0);
    assert_has_audio(audible, 0.01);
}

#[test]
fn scenario_queue_overflow() {
    let config = PlaybackConfig::default();
    let metrics = Arc::new(PlaybackMetrics::new());
    let mut scheduler =
        PlaybackScheduler::new(config, TEST_SAMPLE_RATE, Arc::clone(&metrics)).unwrap();

    let qmax = config.queue_capacity;
    for i in 0..qmax + 5 {
        scheduler.enqueue(TransportChunk::new(
            vec![0.1; TEST_BLOCK_SIZE],
            TEST_SAMPLE_RATE,
            (i * TEST_BLOCK_SIZE) as u64,
        ));
        assert!(scheduler.queue().len() <= qmax);
    }

    assert_eq!(scheduler.queue().len(), qmax);
    assert_eq!(metrics.snapshot().chunks_dropped, 5);
    assert_eq!(
        scheduler.queue().front().map(|chunk| chunk.timestamp),
        Some((5 * TEST_BLOCK_SIZE) as u64)
    );
}
