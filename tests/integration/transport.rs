//! Both transport strategies exercised through the public traits.

use crate::helpers::*;
use std::sync::Arc;
use varipitch::transport::{
    message_channel, MessageConfig, SharedSegment, TransportMetrics, TransportReader,
    TransportWriter,
};

#[test]
fn test_named_segment_across_handles() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("varipitch-ring");

    let producer = SharedSegment::create_at(&path, 2048, 2).unwrap();
    let consumer = SharedSegment::open_at(&path).unwrap();
    assert_eq!(consumer.capacity(), 2048);
    assert_eq!(consumer.channels(), 2);

    let metrics = Arc::new(TransportMetrics::new());
    let mut writer = producer.into_writer().with_metrics(Arc::clone(&metrics));
    let mut reader = consumer.into_reader().with_sample_rate(TEST_SAMPLE_RATE);

    let block = generate_sine(440.0, TEST_SAMPLE_RATE, TEST_BLOCK_SIZE);
    for i in 0..4 {
        writer.write_block(&block, (i * TEST_BLOCK_SIZE) as u64);
    }
    assert_eq!(reader.available_read(), 4 * TEST_BLOCK_SIZE);

    let first = reader.poll(TEST_BLOCK_SIZE).unwrap();
    assert_eq!(first.timestamp, 0);
    assert_eq!(first.sample_rate, TEST_SAMPLE_RATE);
    // Mono in, identical channels, downmix returns the block unchanged.
    for (a, b) in first.payload.iter().zip(&block) {
        assert!((a - b).abs() < 1e-6);
    }

    let rest = reader.poll(usize::MAX).unwrap();
    assert_eq!(rest.timestamp, TEST_BLOCK_SIZE as u64);
    assert_eq!(rest.len(), 3 * TEST_BLOCK_SIZE);
    assert!(reader.poll(usize::MAX).is_none());
    assert_eq!(metrics.snapshot().frames_written, 4 * TEST_BLOCK_SIZE as u64);
}

#[test]
fn test_open_rejects_foreign_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-a-ring");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();
    assert!(SharedSegment::open_at(&path).is_err());
    assert!(SharedSegment::open_at(dir.path().join("missing")).is_err());
}

#[test]
fn test_ring_overflow_keeps_oldest_frames() {
    let metrics = Arc::new(TransportMetrics::new());
    let (writer, mut reader) = SharedSegment::anonymous(256, 1).unwrap().split();
    let mut writer = writer.with_metrics(Arc::clone(&metrics));

    let ramp: Vec<f32> = (0..400).map(|i| i as f32).collect();
    writer.write_block(&ramp, 0);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.frames_written, 255);
    assert_eq!(snapshot.frames_overflowed, 145);

    let chunk = reader.poll(usize::MAX).unwrap();
    assert_eq!(chunk.len(), 255);
    assert_eq!(chunk.payload[0], 0.0);
    assert_eq!(chunk.payload[254], 254.0);
}

#[test]
fn test_message_overflow_counts_drops() {
    let metrics = Arc::new(TransportMetrics::new());
    let config = MessageConfig {
        queue_capacity: 4,
        accumulator_capacity: 256,
        drain_fraction: 0.5,
    };
    let (mut writer, mut reader) = message_channel(config, TEST_SAMPLE_RATE, Arc::clone(&metrics));

    let block = generate_silence(TEST_BLOCK_SIZE);
    for i in 0..10 {
        writer.write_block(&block, (i * TEST_BLOCK_SIZE) as u64);
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.chunks_sent, 10);
    assert_eq!(snapshot.chunks_dropped, 6);
    assert_eq!(reader.len(), 4);

    let timestamps: Vec<u64> = std::iter::from_fn(|| reader.poll(usize::MAX))
        .map(|chunk| chunk.timestamp)
        .collect();
    assert_eq!(timestamps, vec![768, 896, 1024, 1152]);
}

#[test]
fn test_message_chunks_are_contiguous() {
    let metrics = Arc::new(TransportMetrics::new());
    let (mut writer, mut reader) =
        message_channel(MessageConfig::default(), TEST_SAMPLE_RATE, metrics);

    let input: Vec<f32> = (0..20 * TEST_BLOCK_SIZE).map(|i| i as f32).collect();
    for (i, block) in input.chunks(TEST_BLOCK_SIZE).enumerate() {
        writer.write_block(block, (i * TEST_BLOCK_SIZE) as u64);
    }
    writer.flush();

    let mut expected_start = 0u64;
    let mut joined = Vec::new();
    while let Some(chunk) = reader.poll(usize::MAX) {
        assert_eq!(chunk.timestamp, expected_start);
        expected_start += chunk.len() as u64;
        joined.extend(chunk.into_payload());
    }
    assert_eq!(joined, input);
}
