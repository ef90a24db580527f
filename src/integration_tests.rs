//! End-to-end scenario tests for the stroke evidence pipeline.
//!
//! These exercise realistic touch profiles through multiple components at
//! once — stroke statistics feeding classification features, pair fits over
//! concurrent strokes, and the offline report closing the tuning loop —
//! to validate the behaviors the per-module suites cannot see in isolation.

use crate::performance::PerformanceReport;
use crate::screen::Screen;
use crate::stroke::Stroke;
use crate::two_touch_fit::TwoTouchFit;
use crate::types::{HeuristicParams, TouchType};

const DT: f64 = 1.0 / 60.0;

/// A fast, smooth, regularly-timed stroke: the signature of a pen.
fn pen_profile(n: usize) -> Stroke {
    let mut stroke = Stroke::new();
    for i in 0..n {
        stroke.add_point([100.0 + 9.0 * i as f32, 200.0 + 3.0 * i as f32], i as f64 * DT);
    }
    stroke
}

/// A slow, jittery, irregularly-timed stroke: the signature of a resting
/// palm. The wiggle is deterministic but aperiodic.
fn palm_profile(n: usize) -> Stroke {
    let mut stroke = Stroke::new();
    let mut t = 0.0f64;
    for i in 0..n {
        t += if i % 3 == 0 { 0.012 } else { 0.024 };
        let jitter_x = (i as f32 * 2.39).sin() * 2.5;
        let jitter_y = (i as f32 * 1.71).cos() * 2.5;
        stroke.add_point([400.0 + 0.5 * i as f32 + jitter_x, 500.0 + jitter_y], t);
    }
    stroke
}

/// A wide, slow arc: locally straight at sample scale, clearly curved
/// across the whole stroke.
fn wide_arc_profile(n: usize) -> Stroke {
    let mut stroke = Stroke::new();
    let radius = 200.0f32;
    for i in 0..n {
        let angle = 0.0175 * i as f32;
        stroke.add_point(
            [radius * angle.cos(), radius * angle.sin()],
            i as f64 * DT,
        );
    }
    stroke
}

#[test]
fn test_straight_line_evidence() {
    // The canonical sanity property: a constant-speed line accumulates no
    // curvature evidence and its arc length is the Euclidean length.
    let stroke = pen_profile(30);
    let stats = stroke.statistics().unwrap();

    let step = (9.0f32 * 9.0 + 3.0 * 3.0).sqrt();
    assert!((stroke.arc_length() - 29.0 * step).abs() < 1e-2);

    assert!(stats.total_absolute_d2_in_space < 1e-3);
    assert!(stats.tangential_d2 < 1e-3);
    assert!(stats.tangential_d3 < 1e-3);
    assert!(stats.tangential_d4 < 1e-3);
    assert!(stats.normal_d2 < 1e-3);
}

#[test]
fn test_palm_evidence_separates_from_pen() {
    let pen = pen_profile(40);
    let palm = palm_profile(40);

    let pen_stats = pen.statistics().unwrap();
    let palm_stats = palm.statistics().unwrap();

    // Curvature proxies: the palm's jitter survives shrinkage because its
    // second differences dwarf pixelation noise.
    assert!(
        palm_stats.total_absolute_d2_in_space > 10.0 * (pen_stats.total_absolute_d2_in_space + 1.0),
        "palm d2 {} vs pen d2 {}",
        palm_stats.total_absolute_d2_in_space,
        pen_stats.total_absolute_d2_in_space
    );

    // Timing: palms arrive irregularly.
    assert!(
        palm_stats.sample_timing_mean_squared_error
            > 100.0 * (pen_stats.sample_timing_mean_squared_error + 1e-10),
        "palm timing mse {} vs pen {}",
        palm_stats.sample_timing_mean_squared_error,
        pen_stats.sample_timing_mean_squared_error
    );

    // Travel: the pen goes somewhere, the palm mostly sits.
    assert!(palm_stats.max_travel < pen_stats.max_travel);
}

#[test]
fn test_multi_scale_curvature_sees_the_wide_arc() {
    let stroke = wide_arc_profile(60);
    let stats = stroke.statistics().unwrap();

    // At sample scale the arc is straight enough that shrinkage eats the
    // second difference entirely.
    assert!(
        stats.total_d2_at_scale[0] < 1e-3,
        "adjacent-scale d2 = {}",
        stats.total_d2_at_scale[0]
    );

    // Across twenty samples the curvature is unmistakable.
    assert!(
        stats.total_d2_at_scale[19] > 1.0,
        "scale-20 d2 = {}",
        stats.total_d2_at_scale[19]
    );
}

#[test]
fn test_early_statistics_survive_stroke_growth() {
    let mut stroke = Stroke::new();
    for i in 0..60 {
        let angle = 0.2 * i as f32;
        stroke.add_point([150.0 * angle.cos(), 150.0 * angle.sin()], i as f64 * DT);
    }

    let early = stroke.early_statistics().unwrap();
    let live = stroke.statistics().unwrap();

    // The snapshot froze at eleven samples; the live block kept growing.
    assert_eq!(early.arclength_parameter.len(), 11);
    assert!(live.arc_length > 2.0 * early.arc_length);
}

#[test]
fn test_pinch_discrimination_end_to_end() {
    let params = HeuristicParams::default();

    // Converging pair.
    let mut a = Stroke::new();
    let mut b = Stroke::new();
    // Co-moving pair.
    let mut c = Stroke::new();
    let mut d = Stroke::new();

    for i in 0..12 {
        let t = i as f64 * DT;
        a.add_point([300.0 - 6.0 * i as f32, 400.0], t);
        b.add_point([100.0 + 6.0 * i as f32, 400.0], t);
        c.add_point([300.0 + 6.0 * i as f32, 400.0], t);
        d.add_point([100.0 + 6.0 * i as f32, 420.0], t);
    }

    let mut fit = TwoTouchFit::new();

    let pinch = fit.fit_pinch(&a, &b, params.pair_fit_min_points, params.pair_fit_max_points);
    assert!(pinch >= params.pinch_score_threshold, "pinch = {}", pinch);

    let not_pinch = fit.fit_pinch(&c, &d, params.pair_fit_min_points, params.pair_fit_max_points);
    assert!(not_pinch < params.pinch_score_threshold, "not_pinch = {}", not_pinch);

    let pan = fit.fit_pan(&c, &d, params.pair_fit_min_points, params.pair_fit_max_points);
    assert!(pan >= params.pan_score_threshold, "pan = {}", pan);
}

#[test]
fn test_edge_heuristics_on_a_real_stroke() {
    let screen = Screen::new(768.0, 1024.0, 2.0);

    // A stroke that slides in from the left bezel.
    let mut stroke = Stroke::new();
    for i in 0..10 {
        stroke.add_point([-6.0 + 4.0 * i as f32, 500.0], i as f64 * DT);
    }

    let entry = screen.first_onscreen_point(&stroke);
    assert!(entry[0] >= 0.0);
    assert!(screen.is_edge_point(entry));
    assert!(screen.is_unreliable_point(entry));

    // By the end of the stroke the touch has cleared both tolerances.
    assert!(!screen.is_unreliable_point(stroke.last_point()));
}

#[test]
fn test_tuning_loop_round_trip() {
    // Classify strokes with a crude curvature threshold, log the outcome
    // the way the classifier does, and confirm the report reproduces the
    // accuracy we can count by hand.
    let strokes: Vec<(Stroke, TouchType)> = vec![
        (pen_profile(40), TouchType::PenTip1),
        (pen_profile(25), TouchType::PenTip1),
        (palm_profile(40), TouchType::Palm),
        (palm_profile(25), TouchType::Palm),
    ];

    let mut log = String::from("TOUCH_ID,INFERRED_CLASS,TRUE_CLASS\n");
    for (id, (stroke, true_class)) in strokes.iter().enumerate() {
        let stats = stroke.statistics().unwrap();
        let inferred = if stats.total_absolute_d2_in_space > 10.0 {
            TouchType::Palm
        } else {
            TouchType::PenTip1
        };
        log.push_str(&format!(
            "{},{},{}\n",
            id,
            inferred.code(),
            true_class.code()
        ));
    }

    let report = PerformanceReport::from_csv(&log).unwrap();
    assert_eq!(report.total_touch_count(), 4);
    assert!((report.score_for_type(TouchType::PenTip1) - 1.0).abs() < 1e-6);
    assert!((report.score_for_type(TouchType::Palm) - 1.0).abs() < 1e-6);
    assert!((report.overall_score() - 1.0).abs() < 1e-6);
}

#[test]
fn test_normalized_coordinates_preserve_statistics_free_length_ratio() {
    let screen = Screen::new(800.0, 800.0, 2.0);

    let mut stroke = Stroke::without_statistics();
    for i in 0..10 {
        stroke.add_point([80.0 * i as f32, 0.0], i as f64 * DT);
    }

    let screen_length = stroke.arc_length();
    stroke.to_normalized_coordinates(&screen);
    let normalized_length = stroke.arc_length();

    // A square screen scales lengths uniformly by 1/width.
    assert!((normalized_length - screen_length / 800.0).abs() < 1e-4);
}
