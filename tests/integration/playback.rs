//! Scheduler and timeline driven together on one thread, with a manual clock.

use crate::helpers::*;
use std::sync::Arc;
use varipitch::playback::{
    playback_timeline, PlaybackConfig, PlaybackMetrics, PlaybackScheduler, PlaybackThread,
    TickOutcome,
};
use varipitch::transport::{
    message_channel, MessageConfig, TransportChunk, TransportMetrics, TransportWriter,
};

const RENDER_FRAMES: usize = 256;

fn started_scheduler(config: PlaybackConfig) -> PlaybackScheduler {
    let mut scheduler =
        PlaybackScheduler::new(config, TEST_SAMPLE_RATE, Arc::new(PlaybackMetrics::new()))
            .unwrap();
    scheduler.start();
    scheduler
}

#[test]
fn test_irregular_chunks_play_gapless() {
    let mut scheduler = started_scheduler(PlaybackConfig::default());
    let (mut timeline, mut handle) = playback_timeline(64);

    let total = 6000;
    let ramp: Vec<f32> = (0..total).map(|i| i as f32 * 1e-4).collect();
    let mut offset = 0;
    for len in [100, 333, 700, 1639, 57, 900, 1200, 1071] {
        let payload = ramp[offset..offset + len].to_vec();
        scheduler.enqueue(TransportChunk::new(payload, TEST_SAMPLE_RATE, offset as u64));
        offset += len;
    }
    assert_eq!(offset, total);

    let mut rendered = Vec::new();
    let mut block = [0.0f32; RENDER_FRAMES];
    while rendered.len() < total + RENDER_FRAMES {
        scheduler.tick(&mut handle);
        timeline.render(&mut block, 1);
        rendered.extend_from_slice(&block);
    }

    assert_eq!(&rendered[..total], &ramp[..]);
    assert_silence(&rendered[total..], 0.0);

    let metrics = scheduler.metrics().snapshot();
    assert_eq!(metrics.frames_scheduled, total as u64);
    assert_eq!(metrics.chunks_dropped, 0);
}

#[test]
fn test_merge_limits_buffer_count() {
    let mut scheduler = started_scheduler(PlaybackConfig::default());
    let (_timeline, mut handle) = playback_timeline(64);

    for i in 0..16u64 {
        scheduler.enqueue(TransportChunk::new(vec![0.1; 64], TEST_SAMPLE_RATE, i * 64));
    }

    // 1024 queued, four 64-frame chunks per buffer, every start within the lookahead.
    assert_eq!(
        scheduler.tick(&mut handle),
        TickOutcome::Scheduled {
            buffers: 4,
            frames: 1024
        }
    );
    assert!(scheduler.queue().is_empty());
}

#[test]
fn test_queue_overflow_drops_oldest() {
    let config = PlaybackConfig::default();
    let mut scheduler = started_scheduler(config);

    for i in 0..(config.queue_capacity + 5) as u64 {
        scheduler.enqueue(TransportChunk::new(vec![0.0; 16], TEST_SAMPLE_RATE, i * 16));
    }

    assert_eq!(scheduler.queue().len(), config.queue_capacity);
    assert_eq!(scheduler.queue().front().map(|c| c.timestamp), Some(5 * 16));
    let metrics = scheduler.metrics().snapshot();
    assert_eq!(metrics.chunks_enqueued, config.queue_capacity as u64 + 5);
    assert_eq!(metrics.chunks_dropped, 5);
}

#[test]
fn test_underrun_rebuffers_and_resumes_at_now() {
    let config = PlaybackConfig::default();
    let mut scheduler = started_scheduler(config);
    let (mut timeline, mut handle) = playback_timeline(16);

    scheduler.enqueue(TransportChunk::new(vec![0.5; 1000], TEST_SAMPLE_RATE, 0));
    assert!(matches!(
        scheduler.tick(&mut handle),
        TickOutcome::Scheduled { buffers: 1, .. }
    ));

    let mut out = vec![0.0f32; 1024];
    timeline.render(&mut out, 1);
    assert_has_audio(&out[..1000], 0.4);
    assert_silence(&out[1000..], 0.0);

    for _ in 0..config.underrun_report_threshold {
        assert!(matches!(
            scheduler.tick(&mut handle),
            TickOutcome::Underrun { .. }
        ));
    }
    assert!(scheduler.is_buffering());

    let metrics = scheduler.metrics().snapshot();
    assert_eq!(metrics.underruns, config.underrun_report_threshold as u64);
    assert_eq!(metrics.quality_events, 1);
    assert!(metrics.has_quality_issues());

    scheduler.enqueue(TransportChunk::new(vec![0.25; 960], TEST_SAMPLE_RATE, 1000));
    assert!(matches!(
        scheduler.tick(&mut handle),
        TickOutcome::Scheduled { buffers: 1, frames: 960 }
    ));
    assert_eq!(scheduler.next_start(), Some(1024 + 960));

    timeline.render(&mut out, 1);
    assert!(out[..960].iter().all(|&s| s == 0.25));
}

#[test]
fn test_output_is_limited() {
    let mut scheduler = started_scheduler(PlaybackConfig::default());
    let (mut timeline, mut handle) = playback_timeline(16);

    let mut payload = vec![1.5f32; 1024];
    payload[3] = f32::NAN;
    payload[4] = -7.0;
    scheduler.enqueue(TransportChunk::new(payload, TEST_SAMPLE_RATE, 0));
    scheduler.tick(&mut handle);

    let mut out = vec![0.0f32; 2048];
    timeline.render(&mut out, 2);
    assert_bounded(&out, 0.98);
    assert_eq!(out[6], 0.0);
    assert_eq!(out[8], -0.98);
}

#[test]
fn test_thread_pumps_message_queue_into_timeline() {
    init_tracing();
    let transport_metrics = Arc::new(TransportMetrics::new());
    let message = MessageConfig {
        accumulator_capacity: 512,
        drain_fraction: 1.0,
        ..Default::default()
    };
    let (mut writer, reader) = message_channel(message, TEST_SAMPLE_RATE, transport_metrics);
    let (mut timeline, handle) = playback_timeline(32);

    let mut thread = PlaybackThread::spawn(
        PlaybackConfig::default(),
        TEST_SAMPLE_RATE,
        Box::new(reader),
        Box::new(handle),
    )
    .unwrap();
    thread.start().unwrap();

    let block = vec![0.3f32; TEST_BLOCK_SIZE];
    for i in 0..16 {
        writer.write_block(&block, (i * TEST_BLOCK_SIZE) as u64);
    }

    let metrics = thread.metrics();
    assert!(wait_until(1000, || metrics.snapshot().buffers_scheduled > 0));

    let mut out = vec![0.0f32; 512];
    timeline.render(&mut out, 1);
    assert!(out.iter().all(|&s| s == 0.3));

    thread.shutdown();
    assert!(!thread.is_running());
}
