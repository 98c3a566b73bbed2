//! Real-time processor counters.
//!
//! Every recoverable fault on the audio thread lands here instead of surfacing as an error.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by [`PitchProcessor`](crate::PitchProcessor).
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    callbacks: AtomicU64,
    collision_checks: AtomicU64,
    /// Read cursor moves, from resets and from collision checks
    relocations: AtomicU64,
    /// Blocks silenced because a slow reader was too close to the writer
    unsafe_blocks: AtomicU64,
    /// Non-finite input samples replaced with silence
    invalid_samples: AtomicU64,
    /// Smart resets (each one zeroes the filter)
    resets: AtomicU64,
    rejected_configs: AtomicU64,
    /// Samples held silent by the buffering gate
    gated_samples: AtomicU64,
    /// Blocks handed to the transport
    transmitted_blocks: AtomicU64,
}

impl ProcessorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_callback(&self) {
        self.callbacks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_collision_check(&self) {
        self.collision_checks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_relocation(&self) {
        self.relocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unsafe_block(&self) {
        self.unsafe_blocks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_invalid_samples(&self, count: u64) {
        if count > 0 {
            self.invalid_samples.fetch_add(count, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected_config(&self) {
        self.rejected_configs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_gated_samples(&self, count: u64) {
        if count > 0 {
            self.gated_samples.fetch_add(count, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_transmitted_block(&self) {
        self.transmitted_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProcessorMetricsSnapshot {
        ProcessorMetricsSnapshot {
            callbacks: self.callbacks.load(Ordering::Relaxed),
            collision_checks: self.collision_checks.load(Ordering::Relaxed),
            relocations: self.relocations.load(Ordering::Relaxed),
            unsafe_blocks: self.unsafe_blocks.load(Ordering::Relaxed),
            invalid_samples: self.invalid_samples.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            rejected_configs: self.rejected_configs.load(Ordering::Relaxed),
            gated_samples: self.gated_samples.load(Ordering::Relaxed),
            transmitted_blocks: self.transmitted_blocks.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.callbacks.store(0, Ordering::Relaxed);
        self.collision_checks.store(0, Ordering::Relaxed);
        self.relocations.store(0, Ordering::Relaxed);
        self.unsafe_blocks.store(0, Ordering::Relaxed);
        self.invalid_samples.store(0, Ordering::Relaxed);
        self.resets.store(0, Ordering::Relaxed);
        self.rejected_configs.store(0, Ordering::Relaxed);
        self.gated_samples.store(0, Ordering::Relaxed);
        self.transmitted_blocks.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`ProcessorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorMetricsSnapshot {
    pub callbacks: u64,
    pub collision_checks: u64,
    pub relocations: u64,
    pub unsafe_blocks: u64,
    pub invalid_samples: u64,
    pub resets: u64,
    pub rejected_configs: u64,
    pub gated_samples: u64,
    pub transmitted_blocks: u64,
}
