//! Append-only sample storage for one touch.
//!
//! Positions are kept alongside relative timestamps (f32 seconds since the
//! first sample) with the first absolute timestamp held separately in f64.
//! Splitting the clock this way keeps per-sample storage small without the
//! precision loss of stuffing wall-clock seconds into f32: after a few
//! minutes of uptime an f32 absolute timestamp cannot resolve a 60Hz frame.
//!
//! Accessors are index-clamped and return zeros on an empty stream; callers
//! in the statistics hot path index the raw slices directly.

/// Owned position + timestamp buffers for one touch.
#[derive(Debug, Clone)]
pub struct SampleStream {
    positions: Vec<[f32; 2]>,
    relative_timestamps: Vec<f32>,
    /// Absolute timestamp of the first sample; negative means unset.
    first_absolute_timestamp: f64,
    /// The most recent absolute timestamp, kept in f64 because the f32
    /// round trip occasionally loses enough precision to matter when
    /// comparing against the monotonicity floor.
    most_recent_timestamp: f64,
}

impl Default for SampleStream {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStream {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            relative_timestamps: Vec::new(),
            first_absolute_timestamp: -0.001,
            most_recent_timestamp: -0.001,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn clamped_index(&self, index: usize) -> usize {
        index.min(self.positions.len().saturating_sub(1))
    }

    /// Append one sample. The first sample anchors the relative clock.
    pub fn add_point(&mut self, position: [f32; 2], timestamp: f64) {
        if self.positions.is_empty() {
            self.first_absolute_timestamp = timestamp;
        }

        self.most_recent_timestamp = timestamp;
        self.positions.push(position);
        self.relative_timestamps
            .push((timestamp - self.first_absolute_timestamp) as f32);
    }

    /// Position at `index`, clamped; zero on an empty stream.
    pub fn data(&self, index: usize) -> [f32; 2] {
        if self.positions.is_empty() {
            return [0.0, 0.0];
        }
        self.positions[self.clamped_index(index)]
    }

    /// Position counted from the end: `reverse_data(0)` is the last sample.
    pub fn reverse_data(&self, back: usize) -> [f32; 2] {
        if self.positions.is_empty() {
            return [0.0, 0.0];
        }
        let last = self.positions.len() - 1;
        self.positions[last.saturating_sub(back)]
    }

    /// Relative timestamp at `index`, clamped; zero on an empty stream.
    pub fn relative_timestamp(&self, index: usize) -> f32 {
        if self.relative_timestamps.is_empty() {
            return 0.0;
        }
        self.relative_timestamps[self.clamped_index(index)]
    }

    /// Relative timestamp counted from the end.
    pub fn reverse_relative_timestamp(&self, back: usize) -> f32 {
        if self.relative_timestamps.is_empty() {
            return 0.0;
        }
        let last = self.relative_timestamps.len() - 1;
        self.relative_timestamps[last.saturating_sub(back)]
    }

    pub fn last_relative_timestamp(&self) -> f32 {
        self.reverse_relative_timestamp(0)
    }

    /// Absolute timestamp at `index`, reconstructed from the relative clock.
    pub fn absolute_timestamp(&self, index: usize) -> f64 {
        if self.relative_timestamps.is_empty() {
            return 0.0;
        }
        let idx = self.clamped_index(index);
        if idx == self.relative_timestamps.len() - 1 {
            return self.most_recent_timestamp;
        }
        self.first_absolute_timestamp + f64::from(self.relative_timestamps[idx])
    }

    pub fn first_absolute_timestamp(&self) -> f64 {
        self.first_absolute_timestamp
    }

    pub fn set_first_absolute_timestamp(&mut self, t0: f64) {
        self.first_absolute_timestamp = t0;
    }

    pub fn last_absolute_timestamp(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.most_recent_timestamp
        }
    }

    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut Vec<[f32; 2]> {
        &mut self.positions
    }

    pub fn relative_timestamps(&self) -> &[f32] {
        &self.relative_timestamps
    }

    pub fn relative_timestamps_mut(&mut self) -> &mut Vec<f32> {
        &mut self.relative_timestamps
    }

    /// Copy a contiguous range `[a, b)` into a fresh stream. The parent's
    /// first absolute timestamp is carried over so absolute timestamps of
    /// the copied samples keep their meaning.
    pub fn slice(&self, a: usize, b: usize) -> SampleStream {
        let b = b.min(self.positions.len());
        let a = a.min(b);

        let mut out = SampleStream::new();
        out.positions = self.positions[a..b].to_vec();
        out.relative_timestamps = self.relative_timestamps[a..b].to_vec();
        out.first_absolute_timestamp = self.first_absolute_timestamp;
        out.most_recent_timestamp = if b > a {
            self.first_absolute_timestamp + f64::from(self.relative_timestamps[b - 1])
        } else {
            -0.001
        };
        out
    }
}
