//! Screen geometry used by palm and edge heuristics.
//!
//! Stateless value object: bounds, distance and direction to the nearest
//! edge, and edge-proximity classification with two separate tolerances.
//! A point can be merely *near* an edge (`nearby_edges`) or close enough
//! that its motion features should not be trusted (`is_unreliable_point`).
//!
//! The host application constructs one `Screen` for the active display and
//! passes it by reference into every operation that needs it; there is no
//! process-wide singleton.

use serde::{Deserialize, Serialize};

use crate::stroke::Stroke;
use crate::vec2;

/// Bitmask of screen edges.
pub type Edge = u32;

pub const EDGE_NONE: Edge = 0;
pub const EDGE_LEFT: Edge = 1;
pub const EDGE_RIGHT: Edge = 1 << 1;
pub const EDGE_TOP: Edge = 1 << 2;
pub const EDGE_BOTTOM: Edge = 1 << 3;

/// Display geometry and edge tolerances.
///
/// Tolerances are in points and were tuned on tablet-sized displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    /// Display width in points.
    pub width_in_points: f32,
    /// Display height in points.
    pub height_in_points: f32,
    /// Pixels per point.
    pub scale: f32,
    /// Within this distance of an edge a point counts as an edge point.
    pub min_edge_distance: f32,
    /// Within this (looser) distance of an edge a sample's motion features
    /// are unreliable: the digitizer clips and distorts positions there.
    pub unreliable_sample_edge_distance: f32,
}

impl Screen {
    /// A screen with the default edge tolerances.
    pub fn new(width_in_points: f32, height_in_points: f32, scale: f32) -> Self {
        Self {
            width_in_points,
            height_in_points,
            scale,
            min_edge_distance: 10.0,
            unreliable_sample_edge_distance: 15.0,
        }
    }

    /// Distance from `p` to the closest of the four edges.
    pub fn distance_to_nearest_edge(&self, p: [f32; 2]) -> f32 {
        let d_left = p[0].abs();
        let d_right = (p[0] - self.width_in_points).abs();
        let d_top = p[1].abs();
        let d_bottom = (p[1] - self.height_in_points).abs();

        d_left.min(d_right).min(d_top.min(d_bottom))
    }

    /// True when `p` lies inside the screen bounds (inclusive).
    pub fn is_on_screen(&self, p: [f32; 2]) -> bool {
        p[0] >= 0.0
            && p[0] <= self.width_in_points
            && p[1] >= 0.0
            && p[1] <= self.height_in_points
    }

    /// Bitmask of edges within `min_edge_distance` of `p`.
    ///
    /// Note: as currently written the bottom-edge branch sets `EDGE_RIGHT`,
    /// not `EDGE_BOTTOM`, so a point near the bottom edge and a point near
    /// the right edge produce the same mask. The classification layer that
    /// consumes this mask only distinguishes edge from non-edge, but do not
    /// change the bit without confirming with that layer first.
    pub fn nearby_edges(&self, p: [f32; 2]) -> Edge {
        let width = self.width_in_points;
        let height = self.height_in_points;
        let tol = self.min_edge_distance;

        let mut edges = EDGE_NONE;

        if p[0] < tol {
            edges |= EDGE_LEFT;
        }

        if p[0] > width - tol {
            edges |= EDGE_RIGHT;
        }

        if p[1] < tol {
            edges |= EDGE_TOP;
        }

        if p[1] > height - tol {
            edges |= EDGE_RIGHT;
        }

        edges
    }

    /// True when any edge is within `min_edge_distance`.
    /// Assumes the point is on the screen.
    pub fn is_edge_point(&self, p: [f32; 2]) -> bool {
        self.nearby_edges(p) != EDGE_NONE
    }

    /// True when `p` is within `unreliable_sample_edge_distance` of any
    /// edge and its motion features should be discounted.
    pub fn is_unreliable_point(&self, p: [f32; 2]) -> bool {
        let width = self.width_in_points;
        let height = self.height_in_points;
        let tol = self.unreliable_sample_edge_distance;

        p[0] < tol || p[0] > width - tol || p[1] < tol || p[1] > height - tol
    }

    /// First sample of `stroke` that lies on the screen, or zero when the
    /// whole stroke is offscreen.
    pub fn first_onscreen_point(&self, stroke: &Stroke) -> [f32; 2] {
        for j in 0..stroke.len() {
            let p = stroke.xy(j);
            if self.is_on_screen(p) {
                return p;
            }
        }

        [0.0, 0.0]
    }

    /// Signed unit vector toward the single nearest edge.
    ///
    /// The non-dominant axis is zeroed so the result always points straight
    /// at one edge.
    pub fn direction_to_nearest_edge(&self, p: [f32; 2]) -> [f32; 2] {
        let mut d = [0.0f32; 2];

        let d_left = p[0];
        let d_right = self.width_in_points - p[0];
        let d_up = p[1];
        let d_down = self.height_in_points - p[1];

        d[0] = if d_left < d_right { -d_left } else { d_right };
        d[1] = if d_up < d_down { -d_up } else { d_down };

        if d[1].abs() > d[0].abs() {
            d[1] = 0.0;
        } else {
            d[0] = 0.0;
        }

        vec2::normalized(d)
    }
}

impl Default for Screen {
    fn default() -> Self {
        // iPad-class display in points.
        Self::new(768.0, 1024.0, 2.0)
    }
}
