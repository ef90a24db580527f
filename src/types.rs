//! Core data types for the touch contact sensing engine.
//!
//! This module defines the fundamental types used throughout the stroke
//! statistics and classification-scoring pipeline. All types are designed
//! to minimize allocation and make intent obvious: if a concept exists, it
//! gets a type. Raw tuples never cross module boundaries.
//!
//! Output types are structured to support a downstream classification layer
//! that needs kinematic signatures and per-touch evidence, and an offline
//! evaluation harness that replays recorded sessions.

use serde::{Deserialize, Serialize};

/// A single raw touch sample.
///
/// This is the minimal input contract from the touch-dispatch layer:
/// a 2D position in points, a monotonic absolute timestamp in seconds, and
/// optional pressure / contact-radius channels where the digitizer provides
/// them. Samples are never interpreted here, only preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    /// Position [x, y] in screen points.
    pub position: [f32; 2],

    /// Absolute timestamp in seconds. Must be monotonically increasing
    /// within one touch (see `Stroke::add_point` for the enforcement).
    pub timestamp: f64,

    /// Optional stylus/digitizer pressure, unitless.
    pub pressure: Option<f32>,

    /// Optional contact radius in points. Large radii suggest palms.
    pub radius: Option<f32>,
}

impl TouchSample {
    /// Creates a new sample with position and timestamp only.
    pub fn new(x: f32, y: f32, timestamp: f64) -> Self {
        Self {
            position: [x, y],
            timestamp,
            pressure: None,
            radius: None,
        }
    }

    /// Creates a new sample carrying a pressure reading.
    pub fn with_pressure(x: f32, y: f32, pressure: f32, timestamp: f64) -> Self {
        Self {
            position: [x, y],
            timestamp,
            pressure: Some(pressure),
            radius: None,
        }
    }
}

/// The classification assigned to one touch.
///
/// The decision logic that produces these labels lives above this crate;
/// here the enumeration is an opaque, orderable key used by strokes, pen
/// events, and the evaluation report. Integer codes match the recorded
/// session format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TouchType {
    /// Not yet classified.
    Unknown,
    /// Primary stylus tip.
    PenTip1,
    /// Secondary stylus tip (eraser end).
    PenTip2,
    /// Finger contact participating in a gesture.
    Finger,
    /// Palm or other resting-hand contact to be rejected.
    Palm,
    /// Touch cancelled by the system before classification settled.
    Cancelled,
    /// No stylus is paired; pen labels are unavailable.
    UnknownDisconnected,
    /// Touch left the classification window without a final label.
    RemovedFromClassification,
    /// Contact the tracker never followed (e.g. arrived mid-gesture).
    UntrackedTouch,
}

impl TouchType {
    /// Integer code used by the recorded-session report format.
    pub fn code(self) -> i32 {
        match self {
            TouchType::Unknown => 0,
            TouchType::PenTip1 => 1,
            TouchType::PenTip2 => 2,
            TouchType::Finger => 3,
            TouchType::Palm => 4,
            TouchType::Cancelled => 5,
            TouchType::UnknownDisconnected => 6,
            TouchType::RemovedFromClassification => 7,
            TouchType::UntrackedTouch => 8,
        }
    }

    /// Decode an integer class code. Codes outside the known range map to
    /// `Unknown` rather than failing; recorded logs occasionally carry
    /// classes from newer builds.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => TouchType::PenTip1,
            2 => TouchType::PenTip2,
            3 => TouchType::Finger,
            4 => TouchType::Palm,
            5 => TouchType::Cancelled,
            6 => TouchType::UnknownDisconnected,
            7 => TouchType::RemovedFromClassification,
            8 => TouchType::UntrackedTouch,
            _ => TouchType::Unknown,
        }
    }

    /// True for either stylus tip.
    pub fn is_pen(self) -> bool {
        matches!(self, TouchType::PenTip1 | TouchType::PenTip2)
    }
}

/// Kind of a stylus tip switch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenEventType {
    Tip1Down,
    Tip1Up,
    Tip2Down,
    Tip2Up,
    Unknown,
}

/// An asynchronous event from the paired stylus.
///
/// Consumed only as timing context by the classification layer; the
/// components in this crate never inspect pen events directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenEvent {
    pub event_type: PenEventType,
    /// Absolute timestamp in seconds, same clock as touch samples.
    pub timestamp: f64,
}

impl PenEvent {
    pub fn new(event_type: PenEventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
        }
    }

    /// True for tip-down events of either tip.
    pub fn is_tip_down(&self) -> bool {
        matches!(
            self.event_type,
            PenEventType::Tip1Down | PenEventType::Tip2Down
        )
    }
}

/// Identifies a stretch of `count` samples starting at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    pub index: usize,
    pub count: usize,
}

impl Interval {
    pub fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Index of the last sample covered, or `None` when empty.
    pub fn last_index(&self) -> Option<usize> {
        if self.count == 0 {
            None
        } else {
            Some(self.index + self.count - 1)
        }
    }

    /// The overlap of two intervals; empty when they are disjoint.
    pub fn intersection(&self, other: &Interval) -> Interval {
        let a = self.index.max(other.index);
        let b = match (self.last_index(), other.last_index()) {
            (Some(x), Some(y)) => x.min(y),
            _ => return Interval::zero(),
        };
        if b < a {
            Interval::zero()
        } else {
            Interval::new(a, b - a + 1)
        }
    }
}

/// The tunable-threshold surface consumed by the classification layer.
///
/// These are hand-tuned rule thresholds over the features this crate
/// computes. They are configuration data, not control flow: the decision
/// logic receives one immutable instance rather than reaching for scattered
/// constants. Values here are the shipping defaults for 60Hz capacitive
/// panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicParams {
    /// Shortest touch duration (seconds) that can still be a tap.
    pub min_tap_duration: f32,
    /// Longest touch duration (seconds) that can still be a tap.
    pub max_tap_duration: f32,
    /// A touch with no neighbor within this many seconds is isolated.
    pub isolation_seconds: f32,
    /// Two-touch fit score at or above which a pair is accepted as a pinch.
    pub pinch_score_threshold: f32,
    /// Two-touch fit score at or above which a pair is accepted as a pan.
    pub pan_score_threshold: f32,
    /// Minimum samples before a pair fit is attempted.
    pub pair_fit_min_points: usize,
    /// Samples beyond this are ignored by the pair fit.
    pub pair_fit_max_points: usize,
    /// Maximum travel (points) allowed when denoising a first sample.
    pub first_point_max_correction: f32,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            min_tap_duration: 0.03,
            max_tap_duration: 0.5,
            isolation_seconds: 0.5,
            pinch_score_threshold: 0.6,
            pan_score_threshold: 0.6,
            pair_fit_min_points: 3,
            pair_fit_max_points: 32,
            first_point_max_correction: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_type_code_round_trip() {
        let all = [
            TouchType::Unknown,
            TouchType::PenTip1,
            TouchType::PenTip2,
            TouchType::Finger,
            TouchType::Palm,
            TouchType::Cancelled,
            TouchType::UnknownDisconnected,
            TouchType::RemovedFromClassification,
            TouchType::UntrackedTouch,
        ];
        for t in all {
            assert_eq!(TouchType::from_code(t.code()), t);
        }
    }

    #[test]
    fn test_touch_type_unknown_code() {
        assert_eq!(TouchType::from_code(99), TouchType::Unknown);
        assert_eq!(TouchType::from_code(-1), TouchType::Unknown);
    }

    #[test]
    fn test_pen_predicate() {
        assert!(TouchType::PenTip1.is_pen());
        assert!(TouchType::PenTip2.is_pen());
        assert!(!TouchType::Palm.is_pen());
    }

    #[test]
    fn test_interval_intersection() {
        let a = Interval::new(0, 10);
        let b = Interval::new(5, 10);
        assert_eq!(a.intersection(&b), Interval::new(5, 5));
    }

    #[test]
    fn test_interval_disjoint() {
        let a = Interval::new(0, 3);
        let b = Interval::new(7, 2);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn test_interval_empty_operand() {
        let a = Interval::new(2, 4);
        assert!(a.intersection(&Interval::zero()).is_empty());
    }

    #[test]
    fn test_pen_event() {
        let e = PenEvent::new(PenEventType::Tip1Down, 1.5);
        assert!(e.is_tip_down());
        let e = PenEvent::new(PenEventType::Tip1Up, 1.6);
        assert!(!e.is_tip_down());
    }

    #[test]
    fn test_heuristic_params_serde() {
        let params = HeuristicParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: HeuristicParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
