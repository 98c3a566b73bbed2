//! Tone shaping: single-pole high-pass, dry/wet mix and sample validation.

/// Below this dry/wet amount the raw signal passes untouched.
pub const DRY_WET_THRESHOLD: f32 = 0.01;

/// Output limit on the producer side.
pub const PRODUCER_LIMIT: f32 = 1.0;

/// Tighter limit applied by the consumer to leave headroom for later float drift.
pub const CONSUMER_LIMIT: f32 = 0.98;

/// Replace non-finite values with silence and clamp to `[-limit, limit]`.
#[inline]
pub fn sanitize(sample: f32, limit: f32) -> f32 {
    if sample.is_finite() {
        sample.clamp(-limit, limit)
    } else {
        0.0
    }
}

/// High-pass filter memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub prev_in: f32,
    pub prev_out: f32,
    /// Pole, in (0, 1)
    pub alpha: f32,
}

impl FilterState {
    pub fn new(alpha: f32) -> Self {
        Self {
            prev_in: 0.0,
            prev_out: 0.0,
            alpha,
        }
    }

    #[inline]
    pub fn is_zeroed(&self) -> bool {
        self.prev_in == 0.0 && self.prev_out == 0.0
    }
}

/// High-pass plus dry/wet mixer.
#[derive(Debug, Clone)]
pub struct ToneShaper {
    filter: FilterState,
    dry_wet: f32,
}

impl ToneShaper {
    pub fn new(alpha: f32, dry_wet: f32) -> Self {
        Self {
            filter: FilterState::new(alpha),
            dry_wet,
        }
    }

    pub fn filter_state(&self) -> FilterState {
        self.filter
    }

    pub fn dry_wet(&self) -> f32 {
        self.dry_wet
    }

    pub fn set_dry_wet(&mut self, dry_wet: f32) {
        self.dry_wet = dry_wet;
    }

    /// Zero the filter memory.
    pub fn reset(&mut self) {
        self.filter.prev_in = 0.0;
        self.filter.prev_out = 0.0;
    }

    /// Shape one interpolated sample. The filter runs even when fully dry so that raising
    /// the mix later starts from settled memory.
    #[inline]
    pub fn apply(&mut self, raw: f32) -> f32 {
        let filtered = raw - self.filter.prev_in + self.filter.alpha * self.filter.prev_out;
        if filtered.is_finite() {
            self.filter.prev_in = raw;
            self.filter.prev_out = filtered;
        } else {
            self.reset();
        }

        let mixed = if self.dry_wet < DRY_WET_THRESHOLD {
            raw
        } else {
            filtered * self.dry_wet + raw * (1.0 - self.dry_wet)
        };
        sanitize(mixed, PRODUCER_LIMIT)
    }
}
