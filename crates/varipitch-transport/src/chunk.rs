//! Audio chunks handed from the producer to the consumer.

use serde::{Deserialize, Serialize};

/// A block of processed mono audio.
///
/// Immutable once created. In message mode the payload moves through the queue without copying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportChunk {
    pub payload: Vec<f32>,
    pub sample_rate: u32,
    /// Producer frame position of the first sample.
    pub timestamp: u64,
}

impl TransportChunk {
    pub fn new(payload: Vec<f32>, sample_rate: u32, timestamp: u64) -> Self {
        Self {
            payload,
            sample_rate,
            timestamp,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.payload.len() as f64 / self.sample_rate as f64
    }

    pub fn into_payload(self) -> Vec<f32> {
        self.payload
    }
}

/// Consumer-side notification carrying one drained chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEvent {
    pub payload: Vec<f32>,
    pub sample_rate: u32,
    pub timestamp: u64,
    pub buffer_size: usize,
}

impl From<&TransportChunk> for PreviewEvent {
    fn from(chunk: &TransportChunk) -> Self {
        Self {
            payload: chunk.payload.clone(),
            sample_rate: chunk.sample_rate,
            timestamp: chunk.timestamp,
            buffer_size: chunk.payload.len(),
        }
    }
}
