//! Incrementally maintained per-stroke statistics.
//!
//! Every accumulator here is updated strictly forward from its previous
//! value as samples arrive; nothing is ever recomputed from the full
//! history. That keeps the per-sample update O(1) amortized regardless of
//! stroke length, except for one bounded loop over the fixed set of
//! spatial scales.
//!
//! The derived quantities fall into three families:
//! - path geometry: arc length (total and per-index), max travel from the
//!   first point, min step size
//! - timing: inter-sample delta-t mean/variance (Welford), deviation from
//!   the expected sampling rate, first and max delta-t
//! - curvature proxies: denoised second/third/fourth differences, raw and
//!   projected relative to the motion direction, plus second differences
//!   at every spatial scale up to `scale_count`

use serde::{Deserialize, Serialize};

/// Tuning constants for the statistics update.
///
/// These values were tuned on 60Hz tablet data in point coordinates;
/// change them together with the sampling rate of the target panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Shrinkage for denoising spatial second differences. Lots of little
    /// curvatures occur from rounding to pixel coordinates; real
    /// curvatures from palms are much larger.
    pub d2_shrinkage: f32,

    /// Expected inter-sample delta-t in seconds.
    pub expected_sampling_rate: f32,

    /// Shrinkage for sample-rate error. Small timing fluctuations are not
    /// uncommon and should not count as jitter.
    pub sampling_rate_error_shrinkage: f32,

    /// Number of spatial scales tracked by the multi-scale second
    /// difference. Tied to the expected sampling rate; at 60Hz, 44 scales
    /// reach roughly three quarters of a second back into the stroke.
    pub scale_count: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            d2_shrinkage: 2.0,
            expected_sampling_rate: 1.0 / 60.0,
            sampling_rate_error_shrinkage: 0.1 / 60.0,
            scale_count: 44,
        }
    }
}

/// The running aggregate for one stroke.
///
/// "In space" quantities take second differences of the sample points
/// without regard to arrival times.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStatistics {
    pub config: StatisticsConfig,

    /// Cumulative polyline length.
    pub arc_length: f32,
    /// Arc length up to each sample index; index-aligned with the stroke.
    pub arclength_parameter: Vec<f32>,

    /// Total live time of the stroke in seconds.
    pub stroke_time: f32,
    /// Running mean of inter-sample delta-t.
    pub dt_mean: f32,
    /// Running variance of inter-sample delta-t.
    pub dt_variance: f32,
    /// Welford accumulator backing `dt_variance`.
    pub dt_sum_squared_variation: f32,

    /// Vector sum of denoised second differences.
    pub total_d2_in_space: [f32; 2],
    /// Sum of denoised second-difference magnitudes.
    pub total_absolute_d2_in_space: f32,
    /// Sum of squared denoised second-difference norms.
    pub total_squared_d2_in_space: f32,

    /// Early-window second difference orthogonal to velocity, normalized
    /// by arc length squared.
    pub normal_d2: f32,
    /// Running tangential second difference (scale-invariant).
    pub tangential_d2: f32,
    /// Running total of denoised second-difference magnitudes taken only
    /// while the first difference is nonzero.
    pub total_d2: f32,

    pub normal_d3: f32,
    pub tangential_d3: f32,

    pub normal_d4: f32,
    pub tangential_d4: f32,

    /// Integral of speed divided by wiggliness. Like length, but prefers
    /// straight lines over wiggly curves.
    pub smooth_length: f32,

    /// Second-difference magnitude accumulated at each spatial scale:
    /// entry k-1 uses points spaced k indices apart.
    pub total_d2_at_scale: Vec<f32>,

    /// Deviation of sample timings from the expected sampling rate. Palms
    /// have irregular timing. The very first delta-t is excluded: people
    /// sometimes rest the pen and pause before moving, which is not
    /// diagnostic. See `first_delta_t` for that value.
    pub sample_timing_squared_error: f32,
    pub sample_timing_mean_squared_error: f32,

    /// Time between the first and second samples.
    pub first_delta_t: f32,
    /// Largest delta-t after the first.
    pub max_delta_t: f32,

    /// A poor man's diameter: maximum distance traveled from the first
    /// point.
    pub max_travel: f32,

    /// Shortest distance between two adjacent samples.
    pub min_step_size: f32,
}

impl StrokeStatistics {
    pub fn new(config: StatisticsConfig) -> Self {
        let scale_count = config.scale_count;
        Self {
            config,
            arc_length: 0.0,
            arclength_parameter: vec![0.0],
            stroke_time: 0.0,
            dt_mean: 0.0,
            dt_variance: 0.0,
            dt_sum_squared_variation: 0.0,
            total_d2_in_space: [0.0, 0.0],
            total_absolute_d2_in_space: 0.0,
            total_squared_d2_in_space: 0.0,
            normal_d2: 0.0,
            tangential_d2: 0.0,
            total_d2: 0.0,
            normal_d3: 0.0,
            tangential_d3: 0.0,
            normal_d4: 0.0,
            tangential_d4: 0.0,
            smooth_length: 0.0,
            total_d2_at_scale: vec![0.0; scale_count],
            sample_timing_squared_error: 0.0,
            sample_timing_mean_squared_error: 0.0,
            first_delta_t: 0.0,
            max_delta_t: 0.0,
            max_travel: 0.0,
            min_step_size: f32::MAX,
        }
    }

    /// Arc length at `index`, clamped to the recorded range.
    pub fn arclength_at(&self, index: usize) -> f32 {
        if self.arclength_parameter.is_empty() {
            return 0.0;
        }
        let idx = index.min(self.arclength_parameter.len() - 1);
        self.arclength_parameter[idx]
    }
}

impl Default for StrokeStatistics {
    fn default() -> Self {
        Self::new(StatisticsConfig::default())
    }
}

/// Speed-adaptive shrinkage of a finite-difference vector.
///
/// Shrinks the magnitude of `d` toward zero by an amount that fades out as
/// local speed rises: at low speed, pixel-quantization noise dominates the
/// difference, while genuine curvature at speed survives untouched.
/// `speed` is the span covered by the difference stencil in points.
pub(crate) fn shrink_difference(d: [f32; 2], speed: f32, base_shrinkage: f32) -> [f32; 2] {
    let d_norm = (d[0] * d[0] + d[1] * d[1]).sqrt();
    if d_norm <= 0.0 {
        return d;
    }

    let lambda = ((speed - 4.0) / 12.0).clamp(0.0, 1.0);
    let shrinkage = (1.0 - lambda) * base_shrinkage;
    let factor = (d_norm - shrinkage).max(0.0) / d_norm;

    [d[0] * factor, d[1] * factor]
}

/// Scalar counterpart of `shrink_difference` for tangential projections.
pub(crate) fn shrink_magnitude(value: f32, speed: f32, base_shrinkage: f32) -> f32 {
    let lambda = ((speed - 4.0) / 12.0).clamp(0.0, 1.0);
    let shrinkage = (1.0 - lambda) * base_shrinkage;
    (value.abs() - shrinkage).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values() {
        let stats = StrokeStatistics::default();
        assert_eq!(stats.arc_length, 0.0);
        assert_eq!(stats.arclength_parameter, vec![0.0]);
        assert_eq!(stats.total_d2_at_scale.len(), 44);
        assert_eq!(stats.min_step_size, f32::MAX);
        assert_eq!(stats.max_travel, 0.0);
    }

    #[test]
    fn test_scale_count_is_configurable() {
        let config = StatisticsConfig {
            scale_count: 10,
            ..StatisticsConfig::default()
        };
        let stats = StrokeStatistics::new(config);
        assert_eq!(stats.total_d2_at_scale.len(), 10);
    }

    #[test]
    fn test_arclength_at_clamps() {
        let mut stats = StrokeStatistics::default();
        stats.arclength_parameter = vec![0.0, 1.0, 3.0];
        assert_eq!(stats.arclength_at(1), 1.0);
        assert_eq!(stats.arclength_at(99), 3.0);
    }

    #[test]
    fn test_shrinkage_suppresses_slow_noise() {
        // At speed 0 the full shrinkage applies; a difference smaller than
        // the shrinkage collapses to zero.
        let shrunk = shrink_difference([1.0, 0.5], 0.0, 2.0);
        assert_eq!(shrunk, [0.0, 0.0]);
    }

    #[test]
    fn test_shrinkage_fades_with_speed() {
        // At speed >= 16, lambda saturates and the difference is untouched.
        let d = [1.0, 0.5];
        let shrunk = shrink_difference(d, 16.0, 2.0);
        assert!((shrunk[0] - d[0]).abs() < 1e-6);
        assert!((shrunk[1] - d[1]).abs() < 1e-6);
    }

    #[test]
    fn test_shrinkage_partial() {
        // Halfway: speed 10 gives lambda 0.5, shrinkage 1.0 on a
        // magnitude-2 vector leaves half the magnitude.
        let shrunk = shrink_difference([2.0, 0.0], 10.0, 2.0);
        assert!((shrunk[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shrink_magnitude_floor_at_zero() {
        assert_eq!(shrink_magnitude(0.5, 0.0, 2.0), 0.0);
        assert!((shrink_magnitude(3.0, 0.0, 2.0) - 1.0).abs() < 1e-6);
        assert!((shrink_magnitude(-3.0, 0.0, 2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = StatisticsConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: StatisticsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
