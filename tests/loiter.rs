extern crate shrike;
#[macro_use]
extern crate approx;

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use shrike::geometry::Point;
use shrike::loiter::{Loiter, LoiterKind};

#[test]
fn entry_and_exit_on_the_circle() {
    let loiter = Loiter::new(Point::new(100.0, 100.0), 50.0, LoiterKind::Standard, 0.0);

    let entry = loiter.entry_point();
    assert_abs_diff_eq!(entry.x, 150.0, epsilon = 1e-9);
    assert_abs_diff_eq!(entry.y, 100.0, epsilon = 1e-9);

    // A full revolution exits where it entered
    let exit = loiter.exit_point();
    assert_abs_diff_eq!(exit.x, entry.x, epsilon = 1e-6);
    assert_abs_diff_eq!(exit.y, entry.y, epsilon = 1e-6);
}

#[test]
fn half_revolution_exits_opposite() {
    let mut loiter = Loiter::new(Point::new(0.0, 0.0), 10.0, LoiterKind::Tight, 0.0);
    loiter.revolutions = 0.5;

    // Clockwise sweep: half a turn lands at angle -π
    let exit = loiter.exit_point();
    assert_abs_diff_eq!(exit.x, -10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(exit.y, 0.0, epsilon = 1e-6);

    loiter.clockwise = false;
    let exit_ccw = loiter.exit_point();
    assert_abs_diff_eq!(exit_ccw.x, -10.0, epsilon = 1e-9);
}

#[test]
fn exit_heading_is_the_sweep_tangent() {
    let loiter = Loiter::new(Point::new(0.0, 0.0), 10.0, LoiterKind::Standard, 0.0);
    // Clockwise through a full turn: tangent at angle 0 going clockwise
    // points south
    assert_abs_diff_eq!(loiter.exit_heading(), -FRAC_PI_2, epsilon = 1e-9);

    let mut ccw = loiter.clone();
    ccw.clockwise = false;
    assert_abs_diff_eq!(ccw.exit_heading(), FRAC_PI_2, epsilon = 1e-9);
    assert_abs_diff_eq!(ccw.entry_tangent(), FRAC_PI_2, epsilon = 1e-9);
}

#[test]
fn distances_and_energy_costs() {
    let standard = Loiter::new(Point::new(0.0, 0.0), 100.0, LoiterKind::Standard, 0.0);
    assert_abs_diff_eq!(standard.circumference(), TAU * 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(standard.total_distance(), TAU * 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(standard.energy_cost(), TAU * 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(standard.coverage_area(), PI * 100.0 * 100.0, epsilon = 1e-6);

    // Tight patterns pay a 1.3x penalty, wide ones get a 0.8x discount
    let tight = Loiter::new(Point::new(0.0, 0.0), 100.0, LoiterKind::Tight, 0.0);
    assert_abs_diff_eq!(tight.energy_cost(), TAU * 100.0 * 1.3, epsilon = 1e-9);
    let wide = Loiter::new(Point::new(0.0, 0.0), 100.0, LoiterKind::Wide, 0.0);
    assert_abs_diff_eq!(wide.energy_cost(), TAU * 100.0 * 0.8, epsilon = 1e-9);
}

#[test]
fn racetrack_geometry() {
    let track = Loiter::racetrack(Point::new(0.0, 0.0), 50.0, 0.0, 200.0, 0.0);

    assert_abs_diff_eq!(track.circumference(), TAU * 50.0 + 400.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        track.coverage_area(),
        200.0 * 100.0 + PI * 2500.0,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        track.energy_cost(),
        (TAU * 50.0 + 400.0) * 0.9,
        epsilon = 1e-9
    );

    // The straights stretch the containment test along the axis
    assert!(track.contains(&Point::new(120.0, 0.0)));
    assert!(!track.contains(&Point::new(160.0, 0.0)));

    let waypoints = track.waypoints(8);
    assert!(!waypoints.is_empty());
    // Racetrack waypoints stay within the stadium footprint
    for w in &waypoints {
        assert!(w.distance_to(&track.center) <= 100.0 * 1.5 + 1e-6);
    }
}

#[test]
fn circular_waypoints_lie_on_the_circle() {
    let loiter = Loiter::new(Point::new(30.0, -20.0), 75.0, LoiterKind::Standard, 1.2);
    let waypoints = loiter.waypoints(8);

    // One revolution at 8 points per rev, closing point included
    assert_eq!(waypoints.len(), 9);
    for w in &waypoints {
        assert_abs_diff_eq!(w.distance_to(&loiter.center), 75.0, epsilon = 1e-9);
    }
    // First waypoint sits at the entry
    let entry = loiter.entry_point();
    assert_abs_diff_eq!(waypoints[0].x, entry.x, epsilon = 1e-9);
    assert_abs_diff_eq!(waypoints[0].y, entry.y, epsilon = 1e-9);
}

#[test]
fn sized_for_uses_the_middle_of_the_band() {
    let loiter = Loiter::sized_for(Point::new(0.0, 0.0), LoiterKind::Wide, 0.0);
    assert_abs_diff_eq!(loiter.radius, 350.0, epsilon = 1e-9);

    let (lo, hi) = LoiterKind::Racetrack.radius_range();
    assert!(lo < hi);
}

#[test]
fn unconfigured_racetrack_degrades_to_circle() {
    let mut loiter = Loiter::new(Point::new(0.0, 0.0), 40.0, LoiterKind::Racetrack, 0.0);
    loiter.racetrack_length = None;

    for w in loiter.waypoints(8) {
        assert_abs_diff_eq!(w.distance_to(&loiter.center), 40.0, epsilon = 1e-9);
    }
}
