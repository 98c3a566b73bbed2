//! Engine lifecycle and end-to-end routing tests.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use std::time::Duration;
use varipitch::prelude::*;

fn drive(processor: &mut PitchProcessor, blocks: usize) -> Vec<f32> {
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, blocks * TEST_BLOCK_SIZE);
    run_blocks(processor, &input)
}

#[test]
fn test_processor_and_timeline_taken_once() {
    let mut engine = test_engine();
    assert!(engine.take_processor().is_some());
    assert!(engine.take_processor().is_none());
    assert!(engine.take_timeline().is_some());
    assert!(engine.take_timeline().is_none());
    assert_eq!(engine.sample_rate(), TEST_SAMPLE_RATE);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = VaripitchEngine::builder()
        .pitch(PitchConfig::with_pitch_ratio(MAX_PITCH_RATIO + 1.0))
        .build();
    assert!(matches!(result, Err(Error::Core(_))));

    let result = VaripitchEngine::builder().sample_rate(0).build();
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_update_config_validated_at_boundary() {
    let mut engine = test_engine();
    let mut processor = engine.take_processor().unwrap();

    assert!(engine
        .update_config(PitchConfig::new(-1.0, 1.0, 0.0))
        .is_err());
    assert!(engine
        .update_config(PitchConfig::new(1.0, 1.0, 1.5))
        .is_err());
    engine
        .update_config(PitchConfig::new(1.25, 1.0, 0.5))
        .unwrap();

    drive(&mut processor, 1);
    let status = engine.status();
    assert_eq!(status.pitch_ratio(), 1.25);
    assert_eq!(status.dry_wet(), 0.5);
    assert_eq!(engine.metrics().processor.rejected_configs, 0);
}

#[test]
fn test_message_mode_end_to_end() {
    let mut engine = test_engine();
    let mut processor = engine.take_processor().unwrap();
    let mut timeline = engine.take_timeline().unwrap();

    engine.start_transmission().unwrap();
    let direct = drive(&mut processor, 64);
    assert_silence(&direct, SILENCE_THRESHOLD);
    assert!(engine.status().is_routed());

    assert!(wait_until(2000, || engine.metrics().playback.buffers_scheduled > 0));

    // Gate at unity holds the first 512 samples.
    let mut out = vec![0.0f32; 1536];
    timeline.render(&mut out, 1);
    assert_silence(&out[..512], SILENCE_THRESHOLD);
    assert_has_audio(&out[512..], 0.5);
    assert_bounded(&out, 0.98);

    let metrics = engine.metrics();
    assert!(metrics.transport.chunks_sent > 0);
    assert_eq!(metrics.transport.chunks_dropped, 0);
    assert_eq!(metrics.processor.transmitted_blocks, 64);
    engine.shutdown();
}

#[test]
fn test_shared_ring_mode_end_to_end() {
    init_tracing();
    let mut engine = VaripitchEngine::builder()
        .transport_mode(TransportMode::SharedRing)
        .build()
        .unwrap();
    let mut processor = engine.take_processor().unwrap();
    let mut timeline = engine.take_timeline().unwrap();

    engine.start_transmission().unwrap();
    drive(&mut processor, 40);

    assert!(wait_until(2000, || engine.metrics().playback.buffers_scheduled > 0));
    let mut out = vec![0.0f32; 2048];
    timeline.render(&mut out, 2);

    let metrics = engine.metrics();
    assert_eq!(metrics.transport.frames_written, 40 * TEST_BLOCK_SIZE as u64);
    assert_eq!(metrics.transport.frames_overflowed, 0);
    // Stereo render: the mono signal lands on both channels.
    for frame in out.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
    assert_has_audio(&out[1024..], 0.3);
}

#[test]
fn test_attach_shared_buffer_switches_mode() {
    let mut engine = test_engine();
    let mut processor = engine.take_processor().unwrap();

    engine.attach_shared_buffer(4096, 2).unwrap();
    engine.start_transmission().unwrap();
    drive(&mut processor, 8);

    assert_eq!(processor.transport_mode(), Some(TransportMode::SharedRing));
    assert_eq!(
        engine.metrics().transport.frames_written,
        8 * TEST_BLOCK_SIZE as u64
    );
    assert!(wait_until(2000, || engine.metrics().playback.chunks_enqueued > 0));
}

#[test]
fn test_preview_events_delivered() {
    let mut engine = test_engine();
    let mut processor = engine.take_processor().unwrap();
    let previews = engine.subscribe_previews();

    engine.start_preview().unwrap();
    assert!(engine.is_previewing());
    drive(&mut processor, 32);

    let event = previews
        .recv_timeout(Duration::from_secs(2))
        .expect("no preview event");
    assert_eq!(event.sample_rate, TEST_SAMPLE_RATE);
    assert_eq!(event.buffer_size, event.payload.len());
    assert_eq!(event.timestamp, 0);

    engine.stop_preview().unwrap();
    assert!(!engine.is_previewing());
}

#[test]
fn test_stop_transmission_restores_direct_output() {
    let mut engine = test_engine();
    let mut processor = engine.take_processor().unwrap();

    engine.start_transmission().unwrap();
    drive(&mut processor, 8);
    engine.stop_transmission().unwrap();
    let direct = drive(&mut processor, 8);

    assert!(!engine.is_transmitting());
    assert!(!engine.status().is_routed());
    assert_has_audio(&direct, 0.5);
    // start + stop
    assert_eq!(engine.metrics().processor.resets, 2);
}

#[test]
fn test_preview_and_transmission_share_routing() {
    let mut engine = test_engine();
    let mut processor = engine.take_processor().unwrap();

    engine.start_transmission().unwrap();
    engine.start_preview().unwrap();
    engine.stop_transmission().unwrap();
    let out = drive(&mut processor, 4);

    assert!(engine.status().is_routed());
    assert_silence(&out, SILENCE_THRESHOLD);
}

#[test]
fn test_shutdown_idempotent() {
    let mut engine = test_engine();
    engine.shutdown();
    engine.shutdown();
    assert!(engine.start_transmission().is_err());
}
