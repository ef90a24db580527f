//! Touch Contact Sensing Engine
//!
//! Demonstration binary: feeds a synthetic pinch through the stroke and
//! pair-fit pipeline and prints the derived evidence. For library use, see
//! lib.rs.

use touch_sensing::{PerformanceReport, Stroke, TouchType, TwoTouchFit};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("Touch Contact Sensing Engine v0.1.0");
    println!("Stroke statistics and classification-scoring kernel");

    // Two synthetic touches converging along the x axis at 60Hz.
    let mut left = Stroke::new();
    let mut right = Stroke::new();
    for i in 0..10 {
        let t = i as f64 / 60.0;
        left.add_point([-120.0 + 8.0 * i as f32, 384.0], t);
        right.add_point([120.0 - 8.0 * i as f32, 384.0], t);
    }

    let stats = left.statistics().expect("statistics-tracking stroke");
    println!(
        "left stroke: {} samples, arc length {:.1}pt, dt mean {:.4}s",
        left.len(),
        left.arc_length(),
        stats.dt_mean
    );

    let mut fit = TwoTouchFit::new();
    let pinch = fit.fit_pinch(&left, &right, 3, 32);
    let pan = fit.fit_pan(&left, &right, 3, 32);
    println!("pinch score {:.3}, pan score {:.3}", pinch, pan);

    // A small recorded-session report.
    let report = PerformanceReport::from_csv("INFERRED_CLASS,TRUE_CLASS\n1,1\n2,1\n1,2\n")
        .expect("well-formed report");
    println!(
        "report: {} touches, pen score {:.2}, overall {:.2}",
        report.total_touch_count(),
        report.score_for_type(TouchType::PenTip1),
        report.overall_score()
    );
}
