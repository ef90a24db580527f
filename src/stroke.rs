//! Per-touch sample history and streaming statistics.
//!
//! A `Stroke` owns the ordered, append-only sample stream for one touch
//! plus an incrementally maintained `StrokeStatistics` block. The
//! statistics update runs once per appended sample and never walks the
//! full history; see the `statistics` module for the accumulator
//! definitions.
//!
//! Strokes come in two flavors:
//! - statistics-tracking (the normal case for live touches)
//! - statistics-free (throwaway sub-strokes and fit inputs, where
//!   allocating and replaying an aggregate would be wasted work; length
//!   and duration are computed on demand in O(N))
//!
//! Mutation must be serialized per touch by the caller. Distinct strokes
//! share no state and may be updated independently.

use tracing::warn;

use crate::finite_differences::{
    d2_orthogonal_to_velocity, d4_orthogonal_to_velocity, derivative, jerk_orthogonal_to_velocity,
};
use crate::polynomial::CubicPolynomial2;
use crate::screen::Screen;
use crate::statistics::{shrink_difference, shrink_magnitude, StatisticsConfig, StrokeStatistics};
use crate::stream::SampleStream;
use crate::types::{Interval, TouchSample};
use crate::vec2;

/// Minimum spacing between consecutive sample timestamps, in seconds.
/// Anything closer is a duplicate or reordered delivery from the touch
/// dispatch layer and is rejected.
pub const MIN_SAMPLE_TIMESTAMP_DELTA: f64 = 1e-4;

/// Sample count at or below which the early-statistics snapshot tracks the
/// live statistics; past it the snapshot freezes.
const EARLY_WINDOW: usize = 11;

/// The sample history and derived statistics for one touch.
#[derive(Debug, Clone)]
pub struct Stroke {
    stream: SampleStream,

    /// Present in statistics-tracking mode, absent on throwaway strokes.
    statistics: Option<StrokeStatistics>,

    /// Snapshot of the statistics as of the early window, for features
    /// that want an early-stroke view unaffected by later growth.
    early_statistics: Option<StrokeStatistics>,

    // Speed is a funny thing. You cannot recover it from positions and
    // timestamps alone: timestamps include time spent stopped, so any
    // trailing average turns artificially slow on pauses or dropped
    // samples. This side-stream holds sample-to-sample velocity supplied
    // by the touch logger, which implicitly assumes equal time increments
    // and ignores time spent not moving.
    velocity: Vec<[f32; 2]>,

    pressure: Vec<f32>,
    touch_radius: Vec<f32>,
}

impl Stroke {
    /// A statistics-tracking stroke with default tuning.
    pub fn new() -> Self {
        Self::with_config(StatisticsConfig::default())
    }

    /// A statistics-tracking stroke with explicit tuning.
    pub fn with_config(config: StatisticsConfig) -> Self {
        Self {
            stream: SampleStream::new(),
            statistics: Some(StrokeStatistics::new(config)),
            early_statistics: None,
            velocity: Vec::new(),
            pressure: Vec::new(),
            touch_radius: Vec::new(),
        }
    }

    /// A statistics-free stroke: length and duration are computed on
    /// demand rather than maintained incrementally.
    pub fn without_statistics() -> Self {
        Self {
            stream: SampleStream::new(),
            statistics: None,
            early_statistics: None,
            velocity: Vec::new(),
            pressure: Vec::new(),
            touch_radius: Vec::new(),
        }
    }

    /// A statistics-tracking stroke replaying `samples` in order.
    pub fn from_samples(samples: &[TouchSample]) -> Self {
        let mut stroke = Self::new();
        for sample in samples {
            match sample.pressure {
                Some(p) => stroke.add_point_with_pressure(sample.position, p, sample.timestamp),
                None => stroke.add_point(sample.position, sample.timestamp),
            }
        }
        stroke
    }

    pub fn len(&self) -> usize {
        self.stream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    pub fn tracks_statistics(&self) -> bool {
        self.statistics.is_some()
    }

    pub fn statistics(&self) -> Option<&StrokeStatistics> {
        self.statistics.as_ref()
    }

    pub fn early_statistics(&self) -> Option<&StrokeStatistics> {
        self.early_statistics.as_ref()
    }

    fn clamped_index(&self, index: usize) -> usize {
        index.min(self.stream.len().saturating_sub(1))
    }

    // =========================================================================
    // APPENDING
    // =========================================================================

    /// Append a sample.
    ///
    /// Timestamps must advance by at least `MIN_SAMPLE_TIMESTAMP_DELTA`
    /// past the previous sample. A violation is a contract bug in the
    /// dispatch layer: it asserts in debug builds and the sample is
    /// silently dropped in release builds so the monotonic statistics
    /// invariants stay intact.
    pub fn add_point(&mut self, position: [f32; 2], timestamp: f64) {
        if !self.stream.is_empty() {
            let floor = self.stream.last_absolute_timestamp() + MIN_SAMPLE_TIMESTAMP_DELTA;
            debug_assert!(
                timestamp >= floor,
                "non-monotonic sample timestamp: {} < {}",
                timestamp,
                floor
            );
            if timestamp < floor {
                warn!(
                    timestamp,
                    floor, "rejecting out-of-order touch sample"
                );
                return;
            }
        }

        self.stream.add_point(position, timestamp);

        if self.statistics.is_some() {
            self.update_summary_statistics();
        }
    }

    /// Append a sample carrying a pressure reading.
    pub fn add_point_with_pressure(&mut self, position: [f32; 2], pressure: f32, timestamp: f64) {
        let before = self.stream.len();
        self.add_point(position, timestamp);
        if self.stream.len() > before {
            self.pressure.push(pressure);
        }
    }

    /// Append a velocity sample, index-aligned with the position stream.
    /// The touch logger is responsible for keeping the two in lockstep.
    pub fn add_velocity(&mut self, velocity: [f32; 2]) {
        self.velocity.push(velocity);
    }

    /// Append a touch-radius sample.
    pub fn add_touch_radius(&mut self, radius: f32) {
        self.touch_radius.push(radius);
    }

    /// Append all of `other`'s samples, re-timestamped so the first
    /// appended sample lands `initial_dt` seconds after this stroke's
    /// first sample. Callers splicing a continuation pass their current
    /// duration plus one sampling interval.
    pub fn append_stroke(&mut self, other: &Stroke, initial_dt: f32) {
        let t0 = self.stream.first_absolute_timestamp();
        let other_start = other.relative_timestamp(0);

        for index in 0..other.len() {
            let rel = other.relative_timestamp(index) - other_start + initial_dt;
            let timestamp = t0 + f64::from(rel);
            match other.pressure_at(index) {
                Some(p) => self.add_point_with_pressure(other.xy(index), p, timestamp),
                None => self.add_point(other.xy(index), timestamp),
            }
        }
    }

    // =========================================================================
    // STREAMING STATISTICS UPDATE
    // =========================================================================

    /// The core streaming update, run once per appended sample.
    ///
    /// Each block below advances one family of accumulators strictly
    /// forward from its previous value; nothing here looks at more history
    /// than the fixed stencil it needs.
    pub fn update_summary_statistics(&mut self) {
        let stream = &self.stream;
        let Some(stats) = self.statistics.as_mut() else {
            return;
        };

        let n = stream.len();
        let config = stats.config.clone();

        if n > 1 {
            let xy = stream.reverse_data(0);
            let previous = stream.reverse_data(1);
            let ds = vec2::norm(vec2::sub(xy, previous));

            stats.arc_length += ds;
            let prior = stats.arclength_parameter[n - 2];
            stats.arclength_parameter.resize(n, 0.0);
            stats.arclength_parameter[n - 1] = prior + ds;

            stats.min_step_size = stats.min_step_size.min(ds);

            // Inter-sample delta-t mean and variance, Welford's update.
            let dt = stream.last_relative_timestamp() - stream.reverse_relative_timestamp(1);
            let n_dt = (n - 1) as f32;

            stats.stroke_time += dt;

            let mu_old = stats.dt_mean;
            let mu_new = mu_old + (dt - mu_old) / n_dt;
            stats.dt_mean = mu_new;

            stats.dt_sum_squared_variation += (dt - mu_old) * (dt - mu_new);
            stats.dt_variance = stats.dt_sum_squared_variation / (n_dt - 1.0).max(1.0);

            if n > 2 {
                let dt_err = ((dt - config.expected_sampling_rate).abs()
                    - config.sampling_rate_error_shrinkage)
                    .max(0.0);
                stats.sample_timing_squared_error += dt_err * dt_err;
                stats.sample_timing_mean_squared_error =
                    stats.sample_timing_squared_error / (n - 1) as f32;

                stats.max_delta_t = stats.max_delta_t.max(dt);
            } else {
                // The first interval is excluded from the timing-error
                // statistic: an initial pause before motion begins is
                // common and not diagnostic of palm jitter.
                stats.first_delta_t = dt;
            }

            let travel = vec2::norm(vec2::sub(stream.data(0), xy));
            stats.max_travel = stats.max_travel.max(travel);
        } else {
            // Already the constructor state; restated for the replay path.
            stats.arc_length = 0.0;
            stats.arclength_parameter = vec![0.0];
        }

        if n > 2 {
            // Central second difference over the last three samples, with
            // shrinkage denoising so pixelation noise does not accumulate.
            // This particularly helps very slow motion, where spurious
            // second differences are everywhere.
            let p = stream.reverse_data(2);
            let q = stream.reverse_data(1);
            let r = stream.reverse_data(0);

            let d1 = vec2::sub(r, p);
            let raw_d2 = vec2::sub(vec2::add(p, r), vec2::scale(q, 2.0));

            let speed = vec2::norm(d1);
            let d2 = shrink_difference(raw_d2, speed, config.d2_shrinkage);

            stats.total_d2_in_space = vec2::add(stats.total_d2_in_space, d2);
            stats.total_absolute_d2_in_space += vec2::norm(d2);
            stats.total_squared_d2_in_space += vec2::squared_norm(d2);

            // Dividing by |d1| gives the scale-invariant tangential
            // component.
            let dot = vec2::dot(d2, d1).abs();
            if vec2::squared_norm(d1) > 0.0 {
                stats.tangential_d2 += dot / vec2::norm(d1);
                stats.total_d2 += vec2::norm(d2);
            }

            // The same denoised second difference at every spatial scale:
            // points spaced k apart see curvature across a window of 2k
            // samples, so the classifier can compare curvature inside a
            // small window against curvature across the whole stroke.
            for k in 1..=config.scale_count {
                if n <= 2 * k {
                    break;
                }

                let a = stream.reverse_data(2 * k);
                let b = stream.reverse_data(k);
                let c = stream.reverse_data(0);

                let raw = vec2::sub(vec2::add(a, c), vec2::scale(b, 2.0));
                let span_speed = vec2::norm(vec2::sub(c, a));
                let d2k = shrink_difference(raw, span_speed, config.d2_shrinkage);

                stats.total_d2_at_scale[k - 1] += vec2::norm(d2k);
            }
        }

        if n > 4 && n <= EARLY_WINDOW {
            // Early-window normal-derivative features over the full (still
            // short) history, normalized by powers of arc length.
            let t = stream.relative_timestamps();
            let xy = stream.positions();

            let velocity = derivative(t, xy, 1);
            let normal2 = d2_orthogonal_to_velocity(t, xy);
            let normal3 = jerk_orthogonal_to_velocity(t, xy);
            let normal4 = d4_orthogonal_to_velocity(t, xy);

            let l = stats.arc_length;
            let l2 = l * l;
            let l3 = l2 * l;
            let l4 = l3 * l;

            stats.normal_d2 = frobenius_norm(&normal2) / (1e-4 + l2);
            stats.normal_d3 = frobenius_norm(&normal3) / (1e-4 + l3);
            stats.normal_d4 = frobenius_norm(&normal4) / (1e-4 + l4);

            // Length that penalizes wiggliness: speed counts for less
            // where the fourth difference is large.
            stats.smooth_length = velocity
                .iter()
                .zip(normal4.iter())
                .map(|(v, d4)| vec2::norm(*v) / (0.1 + vec2::norm(*d4) / (1e-4 + l4)))
                .sum();
        }

        if n >= 6 {
            // Fixed 5-point stencils over the trailing window for the
            // third and fourth differences, projected onto the motion
            // direction with heavier shrinkage (these stencils amplify
            // noise fourfold relative to the second difference).
            let zm2 = stream.reverse_data(4);
            let zm1 = stream.reverse_data(3);
            let z0 = stream.reverse_data(2);
            let zp1 = stream.reverse_data(1);
            let zp2 = stream.reverse_data(0);

            let d1 = vec2::sub(zp1, zm1);

            // 4th-order accurate first difference: [1/12, -2/3, 0, 2/3, -1/12].
            let d1_4 = vec2::add(
                vec2::add(vec2::scale(zm2, 0.0833), vec2::scale(zm1, -0.667)),
                vec2::add(vec2::scale(zp1, 0.667), vec2::scale(zp2, -0.0833)),
            );

            let d3 = vec2::add(
                vec2::sub(zp2, vec2::scale(zp1, 2.0)),
                vec2::sub(vec2::scale(zm1, 2.0), zm2),
            );
            let d4 = vec2::add(
                vec2::add(
                    vec2::sub(zp2, vec2::scale(zp1, 4.0)),
                    vec2::scale(z0, 6.0),
                ),
                vec2::sub(zm2, vec2::scale(zm1, 4.0)),
            );

            let dot3 = vec2::dot(d3, d1);
            let dot4 = vec2::dot(d4, d1_4);

            let speed = vec2::norm(d1);
            let base = 4.0 * config.d2_shrinkage;

            stats.tangential_d3 += shrink_magnitude(dot3, speed, base) / (1e-5 + speed);
            stats.tangential_d4 += shrink_magnitude(dot4, speed, base) / (1e-5 + speed);
        }

        let snapshot = if n <= EARLY_WINDOW {
            Some(stats.clone())
        } else {
            None
        };
        if snapshot.is_some() {
            self.early_statistics = snapshot;
        }
    }

    // =========================================================================
    // LENGTH AND TIME
    // =========================================================================

    /// Total polyline length. Precomputed in statistics mode; O(N)
    /// otherwise.
    pub fn arc_length(&self) -> f32 {
        if let Some(stats) = &self.statistics {
            return stats.arc_length;
        }

        self.stream
            .positions()
            .windows(2)
            .map(|w| vec2::norm(vec2::sub(w[1], w[0])))
            .sum()
    }

    /// Polyline length up to `end_index` (clamped).
    pub fn arc_length_to(&self, end_index: usize) -> f32 {
        if let Some(stats) = &self.statistics {
            return stats.arclength_at(self.clamped_index(end_index));
        }

        if self.stream.len() < 2 {
            return 0.0;
        }
        let end = self.clamped_index(end_index);
        self.stream.positions()[..=end]
            .windows(2)
            .map(|w| vec2::norm(vec2::sub(w[1], w[0])))
            .sum()
    }

    /// Total live time in seconds. Precomputed in statistics mode.
    pub fn stroke_time(&self) -> f32 {
        if let Some(stats) = &self.statistics {
            return stats.stroke_time;
        }

        if self.stream.len() < 2 {
            return 0.0;
        }
        self.stream.last_relative_timestamp() - self.stream.relative_timestamp(0)
    }

    /// Polyline length of the samples covered by `interval`.
    pub fn segment_length(&self, interval: Interval) -> f32 {
        if self.stream.len() < 2 {
            return 0.0;
        }

        let valid = interval.intersection(&self.maximal_interval());
        if valid.count < 2 {
            return 0.0;
        }

        self.stream.positions()[valid.index..valid.index + valid.count]
            .windows(2)
            .map(|w| vec2::norm(vec2::sub(w[1], w[0])))
            .sum()
    }

    /// Smooth length from the early-window feature pass, zero before
    /// enough samples exist to compute it.
    pub fn normalized_smooth_length(&self) -> f32 {
        match &self.statistics {
            Some(stats) if self.stream.len() >= 5 => stats.smooth_length,
            _ => 0.0,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Position at `index`, clamped; zero on an empty stroke.
    pub fn xy(&self, index: usize) -> [f32; 2] {
        self.stream.data(index)
    }

    pub fn x(&self, index: usize) -> f32 {
        self.xy(index)[0]
    }

    pub fn y(&self, index: usize) -> f32 {
        self.xy(index)[1]
    }

    /// Position counted from the end: `reverse_xy(0)` is the last sample.
    pub fn reverse_xy(&self, back: usize) -> [f32; 2] {
        self.stream.reverse_data(back)
    }

    pub fn first_point(&self) -> [f32; 2] {
        self.stream.data(0)
    }

    pub fn last_point(&self) -> [f32; 2] {
        self.stream.reverse_data(0)
    }

    pub fn relative_timestamp(&self, index: usize) -> f32 {
        self.stream.relative_timestamp(index)
    }

    pub fn last_relative_timestamp(&self) -> f32 {
        self.stream.last_relative_timestamp()
    }

    pub fn absolute_timestamp(&self, index: usize) -> f64 {
        self.stream.absolute_timestamp(index)
    }

    pub fn first_absolute_timestamp(&self) -> f64 {
        self.stream.first_absolute_timestamp()
    }

    pub fn last_absolute_timestamp(&self) -> f64 {
        self.stream.last_absolute_timestamp()
    }

    /// Timestamp of `index` relative to an arbitrary reference time.
    pub fn timestamp_relative_to_time(&self, index: usize, reference_time: f64) -> f32 {
        (self.absolute_timestamp(index) - reference_time) as f32
    }

    /// Age of the stroke: time from first to last sample.
    pub fn lifetime(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.last_relative_timestamp()
        }
    }

    pub fn last_valid_index(&self) -> Option<usize> {
        self.stream.len().checked_sub(1)
    }

    /// First index after 0 with a strictly later timestamp.
    pub fn second_valid_index(&self) -> Option<usize> {
        let t0 = self.absolute_timestamp(0);
        (1..self.stream.len()).find(|&i| self.absolute_timestamp(i) - t0 > 0.0)
    }

    /// Last index before the end with a strictly earlier timestamp.
    pub fn penultimate_valid_index(&self) -> Option<usize> {
        let last = self.last_valid_index()?;
        let t_last = self.absolute_timestamp(last);
        (0..last)
            .rev()
            .find(|&i| t_last - self.absolute_timestamp(i) > 0.0)
    }

    pub fn maximal_interval(&self) -> Interval {
        Interval::new(0, self.stream.len())
    }

    pub fn positions(&self) -> &[[f32; 2]] {
        self.stream.positions()
    }

    pub fn relative_timestamps(&self) -> &[f32] {
        self.stream.relative_timestamps()
    }

    /// Pressure at `index` (clamped), if a pressure stream exists.
    pub fn pressure_at(&self, index: usize) -> Option<f32> {
        if self.pressure.is_empty() {
            return None;
        }
        Some(self.pressure[index.min(self.pressure.len() - 1)])
    }

    pub fn pressure(&self) -> &[f32] {
        &self.pressure
    }

    /// Touch radius at `index` (clamped), if a radius stream exists.
    pub fn touch_radius_at(&self, index: usize) -> Option<f32> {
        if self.touch_radius.is_empty() {
            return None;
        }
        Some(self.touch_radius[index.min(self.touch_radius.len() - 1)])
    }

    pub fn touch_radius(&self) -> &[f32] {
        &self.touch_radius
    }

    // =========================================================================
    // VELOCITY SIDE-STREAM
    // =========================================================================

    pub fn velocity(&self) -> &[[f32; 2]] {
        &self.velocity
    }

    /// Velocity at `index`, zero out of range.
    pub fn velocity_for_point_at_index(&self, index: usize) -> [f32; 2] {
        self.velocity.get(index).copied().unwrap_or([0.0, 0.0])
    }

    pub fn speed_for_point_at_index(&self, index: usize) -> f32 {
        vec2::norm(self.velocity_for_point_at_index(index))
    }

    /// Finite difference of the velocity stream over `smooth_radius`
    /// samples. The first point is differenced against rest rather than a
    /// clamped copy of itself: that matches a pen placed first and then
    /// moved, and avoids reporting zero acceleration at index 0 followed
    /// by a jump at index 1.
    pub fn acceleration_for_point_at_index(&self, index: usize, smooth_radius: usize) -> [f32; 2] {
        if index >= self.velocity.len() {
            return [0.0, 0.0];
        }

        let vb = self.velocity[index];
        let va = if index == 0 || index < smooth_radius {
            [0.0, 0.0]
        } else {
            self.velocity[index - smooth_radius]
        };

        vec2::sub(vb, va)
    }

    /// Net displacement across the trailing `radius` samples.
    pub fn smooth_trailing_velocity(&self, radius: usize) -> [f32; 2] {
        let Some(b) = self.last_valid_index() else {
            return [0.0, 0.0];
        };
        let a = b.saturating_sub(radius);
        vec2::sub(self.xy(b), self.xy(a))
    }

    // =========================================================================
    // GEOMETRY OPERATIONS
    // =========================================================================

    /// Find the sample closest in time to `time`.
    ///
    /// Greedy scan: timestamps are monotonic, so the walk stops the first
    /// time the distance to `time` starts growing. Starting at index 1 is
    /// correct because index 0 seeds the running best, and if the second
    /// sample is already farther away the loop exits immediately (which
    /// happens whenever `time` precedes the midpoint of the first
    /// interval).
    pub fn index_closest_to_time(&self, time: f64) -> usize {
        let mut idx = 0;
        let mut current_diff = (time - self.first_absolute_timestamp()).abs();

        for i in 1..self.stream.len() {
            let new_diff = (time - self.absolute_timestamp(i)).abs();
            if new_diff < current_diff {
                idx = i;
                current_diff = new_diff;
            } else {
                break;
            }
        }

        idx
    }

    /// A statistics-free copy of the samples in `sub_interval`, clamped to
    /// the valid range.
    ///
    /// No statistics on sub-strokes: replaying every sample to rebuild the
    /// aggregate is wasted work in the loops that carve strokes up, and a
    /// sub-range aggregate rarely means anything anyway.
    pub fn sub_stroke(&self, sub_interval: Interval) -> Stroke {
        let mut sub = Stroke::without_statistics();

        if self.is_empty() {
            return sub;
        }

        let valid = sub_interval.intersection(&self.maximal_interval());
        if valid.is_empty() {
            return sub;
        }

        sub.stream = self.stream.slice(valid.index, valid.index + valid.count);
        sub
    }

    /// Replace the first sample's position with a convex blend toward a
    /// polynomial extrapolation fit to the samples after it.
    ///
    /// The very first touch sample is dominated by digitizer noise and
    /// destabilizes any fit or derivative that includes it. `lambda`
    /// blends between the recorded position (0) and the extrapolation (1);
    /// the correction never moves the point farther than `max_travel`.
    /// No-op for strokes of two or fewer samples.
    pub fn denoise_first_point(&mut self, lambda: f32, max_travel: f32) {
        let poly = match self.stream.len() {
            0..=2 => return,
            3 => CubicPolynomial2::line_with_values_at_times(
                self.xy(1),
                self.xy(2),
                self.relative_timestamp(1),
                self.relative_timestamp(2),
            ),
            _ => CubicPolynomial2::quadratic_with_values_at_times(
                self.xy(1),
                self.xy(2),
                self.xy(3),
                self.relative_timestamp(1),
                self.relative_timestamp(2),
                self.relative_timestamp(3),
            ),
        };

        let first = self.xy(0);
        let predicted = poly.value_at(self.relative_timestamp(0));
        let target = vec2::add(vec2::scale(first, 1.0 - lambda), vec2::scale(predicted, lambda));

        let correction = vec2::sub(target, first);
        let correction_norm = vec2::norm(correction);
        if correction_norm > 0.0 {
            let legal_length = correction_norm.min(max_travel);
            let capped = vec2::scale(correction, legal_length / correction_norm);
            self.stream.positions_mut()[0] = vec2::add(first, capped);
        }
    }

    /// Arc-length-weighted mean of consecutive segment midpoints.
    ///
    /// Degenerates to the single point for a one-sample stroke and to the
    /// origin for an empty one.
    pub fn weighted_center_of_mass(&self) -> [f32; 2] {
        let n = self.stream.len();

        if n == 0 {
            return [0.0, 0.0];
        }
        if n == 1 {
            return self.first_point();
        }

        let positions = self.stream.positions();

        let mut mu = [0.0f32; 2];
        let mut total_weight = 0.0f32;

        for w in positions.windows(2) {
            // The epsilon keeps a stationary pair from zeroing the total
            // weight.
            let ds = vec2::norm(vec2::sub(w[1], w[0])) + 1e-4;
            let midpoint = vec2::scale(vec2::add(w[0], w[1]), 0.5);
            mu = vec2::add(mu, vec2::scale(midpoint, ds));
            total_weight += ds;
        }

        vec2::scale(mu, 1.0 / total_weight)
    }

    // =========================================================================
    // COORDINATE TRANSFORMS
    // =========================================================================

    /// Map positions (and velocity) from screen points into the
    /// unit-square-centered frame: x and y each land in [-0.5, 0.5].
    pub fn to_normalized_coordinates(&mut self, screen: &Screen) {
        let w = screen.width_in_points;
        let h = screen.height_in_points;

        for p in self.stream.positions_mut() {
            p[0] = (p[0] - w * 0.5) / w;
            p[1] = (p[1] - h * 0.5) / h;
        }

        for v in &mut self.velocity {
            v[0] /= w;
            v[1] /= h;
        }
    }

    /// Inverse of `to_normalized_coordinates`.
    pub fn to_screen_coordinates(&mut self, screen: &Screen) {
        let w = screen.width_in_points;
        let h = screen.height_in_points;

        for p in self.stream.positions_mut() {
            p[0] = p[0] * w + w * 0.5;
            p[1] = p[1] * h + h * 0.5;
        }

        for v in &mut self.velocity {
            v[0] *= w;
            v[1] *= h;
        }
    }
}

impl Default for Stroke {
    fn default() -> Self {
        Self::new()
    }
}

fn frobenius_norm(rows: &[[f32; 2]]) -> f32 {
    rows.iter()
        .map(|r| vec2::squared_norm(*r))
        .sum::<f32>()
        .sqrt()
}
