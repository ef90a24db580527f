//! Joint kinematic fit for two concurrent touches.
//!
//! Scores how well a pair of strokes matches an idealized two-finger
//! gesture: a pinch (opposing motion about an axis of symmetry) or a pan
//! (co-directional motion). Each stroke is modeled as a quadratic in time
//! per axis; for a pinch the second stroke is reflected about the symmetry
//! axis first, so both strokes are fit jointly as mirrored copies of one
//! curve. The final score combines fit quality, direction agreement, and a
//! displacement floor that excludes barely-moving touches.
//!
//! A `TwoTouchFit` holds the results of its last `fit` call; the regression
//! scratch lives on the stack of the call itself. Instances are not safe to
//! share across concurrent fits; use one per fit in flight.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stroke::Stroke;
use crate::types::Interval;
use crate::vec2;

/// Tuning for the two-touch fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Base weight on each residual row.
    pub identity_weight: f32,

    /// Weight on the first-difference smoothing band. Penalizes residual
    /// roughness along the time axis, separately per stroke; the band
    /// never spans the seam between the two strokes.
    pub first_difference_penalty: f32,

    /// Weight on the second-difference smoothing band.
    pub second_difference_penalty: f32,

    /// Direction-agreement threshold when the touches are still moving
    /// apart more slowly than they started (scale < 1).
    pub strict_target_dot: f32,

    /// Direction-agreement threshold once the separation has grown.
    pub loose_target_dot: f32,

    /// End-to-end displacement below which a stroke contributes nothing.
    pub min_displacement: f32,

    /// Displacement at which a stroke reaches full weight.
    pub full_weight_displacement: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            identity_weight: 1.0,
            first_difference_penalty: 0.5,
            second_difference_penalty: 0.25,
            strict_target_dot: 0.95,
            loose_target_dot: 0.75,
            min_displacement: 1.0,
            full_weight_displacement: 3.0,
        }
    }
}

/// Result holder for one two-touch fit.
#[derive(Debug, Clone)]
pub struct TwoTouchFit {
    config: FitConfig,

    // Fitted quadratic coefficients, one polynomial per axis:
    // x(t) = ax t^2 + bx t + cx, y(t) = ay t^2 + by t + cy.
    ax: f32,
    bx: f32,
    cx: f32,
    ay: f32,
    by: f32,
    cy: f32,

    score: f32,
    /// Ratio of ending to starting endpoint-separation norms.
    scale: f32,
    size_ok: bool,

    axis_of_symmetry: [f32; 2],
    target_direction: [f32; 2],
}

impl TwoTouchFit {
    pub fn new() -> Self {
        Self::with_config(FitConfig::default())
    }

    pub fn with_config(config: FitConfig) -> Self {
        Self {
            config,
            ax: 0.0,
            bx: 0.0,
            cx: 0.0,
            ay: 0.0,
            by: 0.0,
            cy: 0.0,
            score: -1.0,
            scale: 0.0,
            size_ok: false,
            axis_of_symmetry: [0.0, 0.0],
            target_direction: [0.0, 0.0],
        }
    }

    pub fn fit_pinch(&mut self, z: &Stroke, w: &Stroke, min_points: usize, max_points: usize) -> f32 {
        self.fit(z, w, min_points, max_points, true)
    }

    pub fn fit_pan(&mut self, z: &Stroke, w: &Stroke, min_points: usize, max_points: usize) -> f32 {
        self.fit(z, w, min_points, max_points, false)
    }

    /// Score how well `z` and `w` jointly match a pinch (`is_pinch`) or a
    /// pan. Returns a score in [0, 1]; exactly 0 when either stroke has
    /// fewer than `min_points` samples.
    pub fn fit(
        &mut self,
        z: &Stroke,
        w: &Stroke,
        min_points: usize,
        max_points: usize,
        is_pinch: bool,
    ) -> f32 {
        self.score = 0.0;
        self.size_ok = false;

        if z.len() < min_points || w.len() < min_points {
            return 0.0;
        }
        self.size_ok = true;

        // Work on truncated, denoised copies; the originals stay intact.
        let mut zc = z.sub_stroke(Interval::new(0, max_points));
        let mut wc = w.sub_stroke(Interval::new(0, max_points));
        zc.denoise_first_point(1.0, f32::INFINITY);
        wc.denoise_first_point(1.0, f32::INFINITY);

        // Anchor the regression at the moment the later touch arrived:
        // whichever stroke began first contributes the sample closest in
        // time to the other's first sample, and both series are translated
        // so this matched pair sits at a common origin. Overlapping time
        // spans are then compared in the same spatial frame; if the
        // strokes never overlap this degenerates and the fit comes out
        // poor, which is what a non-gesture pair deserves.
        let (anchor_z, anchor_w) = if wc.first_absolute_timestamp() > zc.first_absolute_timestamp()
        {
            let iz = zc.index_closest_to_time(wc.first_absolute_timestamp());
            (zc.xy(iz), wc.xy(0))
        } else {
            let iw = wc.index_closest_to_time(zc.first_absolute_timestamp());
            (zc.xy(0), wc.xy(iw))
        };

        // The symmetry axis comes from the endpoint separations: whichever
        // of the starting and ending separation is larger defines the
        // target direction, and its perpendicular is the reflection axis.
        let start_separation = vec2::sub(zc.first_point(), wc.first_point());
        let end_separation = vec2::sub(zc.last_point(), wc.last_point());

        let start_norm = vec2::norm(start_separation);
        let end_norm = vec2::norm(end_separation);

        self.scale = end_norm / start_norm.max(1e-5);

        let target = if end_norm > start_norm {
            vec2::normalized(end_separation)
        } else {
            vec2::normalized(start_separation)
        };
        self.target_direction = target;
        self.axis_of_symmetry = vec2::perpendicular(target);

        // Reflection about the symmetry axis.
        let v = self.axis_of_symmetry;
        let reflection = [
            [v[0] * v[0] - v[1] * v[1], 2.0 * v[0] * v[1]],
            [2.0 * v[0] * v[1], v[1] * v[1] - v[0] * v[0]],
        ];

        let zn = zc.len();
        let wn = wc.len();
        let m = zn + wn;

        let mut a = DMatrix::<f32>::zeros(m, 3);
        let mut b = DMatrix::<f32>::zeros(m, 2);

        for j in 0..zn {
            let t = zc.relative_timestamp(j);
            a[(j, 0)] = t * t;
            a[(j, 1)] = t;
            a[(j, 2)] = 1.0;

            let p = vec2::sub(zc.xy(j), anchor_z);
            b[(j, 0)] = p[0];
            b[(j, 1)] = p[1];
        }

        for k in 0..wn {
            let row = zn + k;
            let t = wc.relative_timestamp(k);
            a[(row, 0)] = t * t;
            a[(row, 1)] = t;
            a[(row, 2)] = 1.0;

            let mut p = vec2::sub(wc.xy(k), anchor_w);
            if is_pinch {
                p = [
                    reflection[0][0] * p[0] + reflection[0][1] * p[1],
                    reflection[1][0] * p[0] + reflection[1][1] * p[1],
                ];
            }
            b[(row, 0)] = p[0];
            b[(row, 1)] = p[1];
        }

        let weight = self.assemble_weight(zn, wn);

        // Weighted least squares via the normal equations; the weight is
        // symmetric positive definite by construction, so Cholesky applies.
        let atw = a.transpose() * &weight;
        let normal = &atw * &a;
        let rhs = &atw * &b;

        let coeff = match normal.cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => {
                debug!("two-touch fit: singular normal equations");
                return 0.0;
            }
        };

        self.ax = coeff[(0, 0)];
        self.bx = coeff[(1, 0)];
        self.cx = coeff[(2, 0)];
        self.ay = coeff[(0, 1)];
        self.by = coeff[(1, 1)];
        self.cy = coeff[(2, 1)];

        // R^2 against the weighted quadratic forms; zero variance (both
        // strokes pinned to their anchors) scores zero.
        let residual_matrix = &a * &coeff - &b;
        let residual = (residual_matrix.transpose() * &weight * &residual_matrix).trace();

        let mut centered = b.clone();
        let mean_x = b.column(0).mean();
        let mean_y = b.column(1).mean();
        for i in 0..m {
            centered[(i, 0)] -= mean_x;
            centered[(i, 1)] -= mean_y;
        }
        let total_variance = (centered.transpose() * &weight * &centered).trace();

        let r_squared = if total_variance > 0.0 {
            (1.0 - residual / total_variance).clamp(0.0, 1.0)
        } else {
            0.0
        };

        // Direction agreement from the unit end-to-end displacements.
        let z_displacement = vec2::sub(zc.last_point(), zc.first_point());
        let w_displacement = vec2::sub(wc.last_point(), wc.first_point());

        let uz = vec2::normalized(z_displacement);
        let uw = vec2::normalized(w_displacement);

        let direction_goodness = if is_pinch {
            let dot_z = vec2::dot(uz, target);
            let dot_w = vec2::dot(uw, target);
            let opposing = (-(dot_z * dot_w)).max(0.0).sqrt();

            // Deviation below the target dot is penalized; exceeding it is
            // not. The threshold loosens once the separation has grown,
            // because a pinch-out drifts off its starting axis.
            let threshold = if self.scale < 1.0 {
                self.config.strict_target_dot
            } else {
                self.config.loose_target_dot
            };
            (opposing / threshold).min(1.0)
        } else {
            vec2::dot(uz, uw).max(0.0)
        };

        let score = direction_goodness
            * r_squared
            * self.length_regularization(z_displacement)
            * self.length_regularization(w_displacement);

        debug!(
            samples = m,
            residual,
            r_squared,
            direction_goodness,
            score,
            is_pinch,
            "two-touch fit"
        );

        self.score = score;
        score
    }

    /// Analytic curvature of the fitted quadratic at relative time `t`:
    /// (x'y'' - y'x'') / speed^3.
    pub fn curvature(&self, t: f32) -> f32 {
        let xp = 2.0 * self.ax * t + self.bx;
        let yp = 2.0 * self.ay * t + self.by;

        let xpp = 2.0 * self.ax;
        let ypp = 2.0 * self.ay;

        let speed = (xp * xp + yp * yp).sqrt();
        if speed <= 0.0 {
            return 0.0;
        }

        (xp * ypp - yp * xpp) / (speed * speed * speed)
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn size_ok(&self) -> bool {
        self.size_ok
    }

    pub fn axis_of_symmetry(&self) -> [f32; 2] {
        self.axis_of_symmetry
    }

    pub fn target_direction(&self) -> [f32; 2] {
        self.target_direction
    }

    /// Fitted coefficients as ((ax, bx, cx), (ay, by, cy)).
    pub fn coefficients(&self) -> ([f32; 3], [f32; 3]) {
        ([self.ax, self.bx, self.cx], [self.ay, self.by, self.cy])
    }

    /// Ramp from zero weight at `min_displacement` to full weight at
    /// `full_weight_displacement`; strokes that barely move are excluded.
    fn length_regularization(&self, displacement: [f32; 2]) -> f32 {
        let span = (self.config.full_weight_displacement - self.config.min_displacement).max(1e-5);
        ((vec2::norm(displacement) - self.config.min_displacement) / span).clamp(0.0, 1.0)
    }

    /// Identity plus first/second-difference penalty bands, block-diagonal
    /// per stroke so the smoothing never couples the seam.
    fn assemble_weight(&self, zn: usize, wn: usize) -> DMatrix<f32> {
        let m = zn + wn;
        let mut weight = DMatrix::<f32>::identity(m, m) * self.config.identity_weight;

        for (offset, count) in [(0usize, zn), (zn, wn)] {
            if count >= 2 && self.config.first_difference_penalty > 0.0 {
                let mut d1 = DMatrix::<f32>::zeros(count - 1, count);
                for i in 0..count - 1 {
                    d1[(i, i)] = -1.0;
                    d1[(i, i + 1)] = 1.0;
                }
                let band = d1.transpose() * d1 * self.config.first_difference_penalty;
                let mut block = weight.view_mut((offset, offset), (count, count));
                block += band;
            }

            if count >= 3 && self.config.second_difference_penalty > 0.0 {
                let mut d2 = DMatrix::<f32>::zeros(count - 2, count);
                for i in 0..count - 2 {
                    d2[(i, i)] = 1.0;
                    d2[(i, i + 1)] = -2.0;
                    d2[(i, i + 2)] = 1.0;
                }
                let band = d2.transpose() * d2 * self.config.second_difference_penalty;
                let mut block = weight.view_mut((offset, offset), (count, count));
                block += band;
            }
        }

        weight
    }
}

impl Default for TwoTouchFit {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    /// A stroke moving from `start` with constant per-frame step `step`.
    fn moving_stroke(start: [f32; 2], step: [f32; 2], n: usize) -> Stroke {
        let mut stroke = Stroke::new();
        for i in 0..n {
            stroke.add_point(
                [start[0] + step[0] * i as f32, start[1] + step[1] * i as f32],
                i as f64 * DT,
            );
        }
        stroke
    }

    #[test]
    fn test_too_few_points_scores_exactly_zero() {
        let z = moving_stroke([5.0, 0.0], [-0.5, 0.0], 2);
        let w = moving_stroke([-5.0, 0.0], [0.5, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        let score = fit.fit(&z, &w, 3, 32, true);
        assert_eq!(score, 0.0);
        assert!(!fit.size_ok());
    }

    #[test]
    fn test_head_on_pinch_scores_near_one() {
        // Equal speed, directly toward each other along the x axis.
        let z = moving_stroke([5.0, 0.0], [-0.5, 0.0], 10);
        let w = moving_stroke([-5.0, 0.0], [0.5, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        let score = fit.fit_pinch(&z, &w, 3, 32);
        assert!(score > 0.9, "pinch score = {}", score);
        assert!(fit.size_ok());
        assert!(fit.scale() < 1.0);

        // The target direction is the separation axis; the symmetry axis
        // is its perpendicular.
        let target = fit.target_direction();
        assert!(target[0].abs() > 0.99 && target[1].abs() < 1e-3);
        let axis = fit.axis_of_symmetry();
        assert!(axis[1].abs() > 0.99 && axis[0].abs() < 1e-3);
    }

    #[test]
    fn test_co_directional_pair_is_not_a_pinch() {
        let z = moving_stroke([5.0, 0.0], [0.5, 0.0], 10);
        let w = moving_stroke([-5.0, 0.0], [0.5, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        let score = fit.fit_pinch(&z, &w, 3, 32);
        assert!(score < 0.05, "pan pair scored {} as pinch", score);
    }

    #[test]
    fn test_co_directional_pair_is_a_pan() {
        let z = moving_stroke([0.0, 0.0], [0.5, 0.0], 10);
        let w = moving_stroke([0.0, 30.0], [0.5, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        let score = fit.fit_pan(&z, &w, 3, 32);
        assert!(score > 0.9, "pan score = {}", score);
    }

    #[test]
    fn test_opposing_pair_is_not_a_pan() {
        let z = moving_stroke([5.0, 0.0], [-0.5, 0.0], 10);
        let w = moving_stroke([-5.0, 0.0], [0.5, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        let score = fit.fit_pan(&z, &w, 3, 32);
        assert!(score < 0.05, "pinch pair scored {} as pan", score);
    }

    #[test]
    fn test_stationary_strokes_score_zero() {
        // Displacement under the regularization floor contributes nothing.
        let z = moving_stroke([5.0, 0.0], [-0.05, 0.0], 10);
        let w = moving_stroke([-5.0, 0.0], [0.05, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        let score = fit.fit_pinch(&z, &w, 3, 32);
        assert_eq!(score, 0.0, "sub-floor displacement must be excluded");
    }

    #[test]
    fn test_pinch_out_uses_loose_threshold() {
        // Strokes moving apart: separation grows, scale > 1.
        let z = moving_stroke([1.0, 0.0], [0.5, 0.0], 10);
        let w = moving_stroke([-1.0, 0.0], [-0.5, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        let score = fit.fit_pinch(&z, &w, 3, 32);
        assert!(score > 0.9, "pinch-out score = {}", score);
        assert!(fit.scale() > 1.0);
    }

    #[test]
    fn test_max_points_truncation() {
        // A pair that starts as a clean pinch and then degenerates into
        // noise; truncating to the clean prefix must keep the score up.
        let mut z = moving_stroke([5.0, 0.0], [-0.4, 0.0], 10);
        let mut w = moving_stroke([-5.0, 0.0], [0.4, 0.0], 10);
        for i in 10..24 {
            let wiggle = if i % 2 == 0 { 3.0 } else { -3.0 };
            z.add_point([1.0 + wiggle, 5.0 * wiggle], i as f64 * DT);
            w.add_point([-1.0 - wiggle, -4.0 * wiggle], i as f64 * DT);
        }

        let mut truncated = TwoTouchFit::new();
        let truncated_score = truncated.fit_pinch(&z, &w, 3, 10);

        let mut full = TwoTouchFit::new();
        let full_score = full.fit_pinch(&z, &w, 3, 64);

        assert!(
            truncated_score > full_score,
            "truncated {} vs full {}",
            truncated_score,
            full_score
        );
    }

    #[test]
    fn test_late_second_touch_is_anchored() {
        // W begins while Z is mid-flight; the fit should still recognize
        // the opposing motion.
        let z = moving_stroke([8.0, 0.0], [-0.5, 0.0], 16);

        let mut w = Stroke::new();
        for i in 0..10 {
            w.add_point([-8.0 + 0.5 * i as f32, 0.0], (i + 6) as f64 * DT);
        }

        let mut fit = TwoTouchFit::new();
        let score = fit.fit_pinch(&z, &w, 3, 32);
        assert!(score > 0.3, "late-arrival pinch score = {}", score);
    }

    #[test]
    fn test_curvature_of_straight_fit_is_zero() {
        let z = moving_stroke([5.0, 0.0], [-0.5, 0.0], 10);
        let w = moving_stroke([-5.0, 0.0], [0.5, 0.0], 10);

        let mut fit = TwoTouchFit::new();
        fit.fit_pinch(&z, &w, 3, 32);

        let kappa = fit.curvature(5.0 * DT as f32);
        assert!(kappa.abs() < 1e-3, "curvature = {}", kappa);
    }

    #[test]
    fn test_curvature_zero_speed_guard() {
        let fit = TwoTouchFit::new();
        // Freshly constructed: all coefficients zero, speed zero.
        assert_eq!(fit.curvature(1.0), 0.0);
    }
}
