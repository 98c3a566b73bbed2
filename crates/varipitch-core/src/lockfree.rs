//! Lock-free cells shared between the real-time thread and control threads.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Cache-line aligned atomic f32.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFloat {
    value: AtomicF32,
}

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }
}

/// Processor state published once per callback for control threads to observe.
#[derive(Debug)]
pub struct ProcessorStatus {
    pitch_ratio: AtomicFloat,
    dry_wet: AtomicFloat,
    routed: AtomicFlag,
    buffer_ready: AtomicFlag,
    frames_processed: AtomicU64,
}

impl ProcessorStatus {
    pub fn new(pitch_ratio: f32, dry_wet: f32) -> Self {
        Self {
            pitch_ratio: AtomicFloat::new(pitch_ratio),
            dry_wet: AtomicFloat::new(dry_wet),
            routed: AtomicFlag::new(false),
            buffer_ready: AtomicFlag::new(false),
            frames_processed: AtomicU64::new(0),
        }
    }

    /// Pitch ratio currently applied by the processor.
    pub fn pitch_ratio(&self) -> f32 {
        self.pitch_ratio.get()
    }

    pub fn dry_wet(&self) -> f32 {
        self.dry_wet.get()
    }

    /// Whether processed audio goes to the transport instead of the real-time output.
    pub fn is_routed(&self) -> bool {
        self.routed.get()
    }

    /// Whether the buffering gate is open.
    pub fn is_buffer_ready(&self) -> bool {
        self.buffer_ready.get()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub(crate) fn publish_config(&self, pitch_ratio: f32, dry_wet: f32) {
        self.pitch_ratio.set(pitch_ratio);
        self.dry_wet.set(dry_wet);
    }

    pub(crate) fn publish_block(&self, routed: bool, buffer_ready: bool, frames_processed: u64) {
        self.routed.set(routed);
        self.buffer_ready.set(buffer_ready);
        self.frames_processed
            .store(frames_processed, Ordering::Relaxed);
    }
}
