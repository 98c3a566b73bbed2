//! Circular delay line with an integer write cursor and interpolated reads.

/// Fixed-capacity ring of samples.
///
/// The write cursor advances by exactly the number of samples written, modulo capacity.
/// Reads take a fractional position and interpolate linearly between `floor(pos)` and the
/// next slot, wrapping at the end. Positions outside `[0, capacity)` are normalized.
#[derive(Debug, Clone)]
pub struct DelayLine {
    samples: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Capacity is at least two slots so interpolation always has a neighbour.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(2)],
            write_pos: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Next slot to be written.
    #[inline]
    pub fn write_cursor(&self) -> usize {
        self.write_pos
    }

    /// Append samples at the write cursor, wrapping around the end.
    pub fn write(&mut self, input: &[f32]) {
        let capacity = self.samples.len();
        let mut remaining = input;
        while !remaining.is_empty() {
            let span = (capacity - self.write_pos).min(remaining.len());
            self.samples[self.write_pos..self.write_pos + span]
                .copy_from_slice(&remaining[..span]);
            remaining = &remaining[span..];
            self.write_pos = (self.write_pos + span) % capacity;
        }
    }

    /// Linearly interpolated sample at a fractional position.
    #[inline]
    pub fn read_at(&self, position: f64) -> f32 {
        let capacity = self.samples.len();
        let position = position.rem_euclid(capacity as f64);
        let floor = position.floor();
        // rem_euclid can round up to exactly `capacity` for tiny negative inputs.
        let index = (floor as usize) % capacity;
        let next = (index + 1) % capacity;
        let frac = (position - floor) as f32;
        self.samples[index] * (1.0 - frac) + self.samples[next] * frac
    }

    /// Zero the contents. The write cursor is kept.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }
}
