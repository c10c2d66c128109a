extern crate shrike;
#[macro_use]
extern crate approx;

use std::f64::consts::TAU;

use shrike::atmosphere::performance_at;
use shrike::geometry::Point;
use shrike::planners::descent::{compute_descent_plan, DescentPhase, APPROACH_ALTITUDE_M};

#[test]
fn every_descent_ends_in_a_touchdown() {
    for start_alt in [20.0, 30.0, 80.0, 150.0, 200.0] {
        let plan = compute_descent_plan(Point::new(500.0, 400.0), 60.0, start_alt, 0.0, 0.0, 24);

        let last = plan.waypoints.last().unwrap();
        assert_eq!(last.phase, DescentPhase::Touchdown, "from {start_alt} m");
        assert_abs_diff_eq!(last.altitude_m, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(last.speed_ms, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(last.bank_deg, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn high_altitude_spiral_from_150_meters() {
    // At 4000 m terrain the rate is 5 m per loop: the spiral sheds
    // 150 -> 20 m over 27 loops before the approach handover at 15 m
    let plan = compute_descent_plan(Point::new(0.0, 0.0), 80.0, 150.0, 4000.0, 0.0, 24);

    assert_eq!(plan.n_loops, 27);

    let spirals = plan
        .waypoints
        .iter()
        .filter(|w| w.phase == DescentPhase::Spiral)
        .count();
    assert_eq!(spirals, 27 * 24);
    assert_eq!(
        plan.waypoints
            .iter()
            .filter(|w| w.phase == DescentPhase::Approach)
            .count(),
        12
    );
    assert_eq!(
        plan.waypoints
            .iter()
            .filter(|w| w.phase == DescentPhase::Flare)
            .count(),
        6
    );

    // Energy is the reduced-throttle draw over the whole descent
    let perf = performance_at(4000.0);
    assert_abs_diff_eq!(
        plan.energy_wh,
        perf.power_draw_w * 0.6 * plan.total_duration.to_seconds() / 3600.0,
        epsilon = 1e-9
    );

    // Spiral distance dominates: 27 full circles
    assert!(plan.total_distance_m > TAU * 80.0 * 27.0);
}

#[test]
fn spiral_waypoints_stay_on_the_circle_and_descend() {
    let center = Point::new(100.0, 200.0);
    let plan = compute_descent_plan(center, 70.0, 100.0, 0.0, 0.0, 24);

    let mut previous_alt = f64::INFINITY;
    for w in plan
        .waypoints
        .iter()
        .filter(|w| w.phase == DescentPhase::Spiral)
    {
        let dist = Point::new(w.x, w.y).distance_to(&center);
        assert_abs_diff_eq!(dist, 70.0, epsilon = 1e-6);
        assert!(w.altitude_m >= APPROACH_ALTITUDE_M - 1e-9);
        assert!(w.altitude_m <= previous_alt + 1e-9 || w.loop_number == 1);
        previous_alt = w.altitude_m;
    }
}

#[test]
fn approach_and_flare_are_wings_level_and_slower() {
    let plan = compute_descent_plan(Point::new(0.0, 0.0), 60.0, 90.0, 0.0, 0.0, 24);
    let perf = performance_at(0.0);
    let approach_speed = perf.stall_speed_ms * 1.3;

    for w in &plan.waypoints {
        match w.phase {
            DescentPhase::Spiral => {
                assert_abs_diff_eq!(w.bank_deg, 35.0, epsilon = 1e-9);
                assert_abs_diff_eq!(w.speed_ms, approach_speed, epsilon = 1e-9);
            }
            DescentPhase::Approach => {
                assert_abs_diff_eq!(w.bank_deg, 0.0, epsilon = 1e-9);
                assert!(w.speed_ms <= approach_speed + 1e-9);
                assert!(w.speed_ms >= approach_speed * 0.85 - 1e-9);
                assert!(w.altitude_m <= APPROACH_ALTITUDE_M + 1e-9);
            }
            DescentPhase::Flare => {
                assert_abs_diff_eq!(w.speed_ms, approach_speed * 0.75, epsilon = 1e-9);
                assert!(w.altitude_m <= 3.0 + 1e-9);
            }
            DescentPhase::Touchdown => {}
        }
    }
}

#[test]
fn steep_terrain_shallows_the_spiral() {
    let flat = compute_descent_plan(Point::new(0.0, 0.0), 60.0, 30.0, 0.0, 0.0, 24);
    let sloped = compute_descent_plan(Point::new(0.0, 0.0), 60.0, 30.0, 0.0, 10.0, 24);

    assert!(
        sloped.n_loops > flat.n_loops,
        "a 10° slope must slow the descent: {} vs {} loops",
        sloped.n_loops,
        flat.n_loops
    );
}

#[test]
fn low_handover_skips_the_spiral_entirely() {
    let center = Point::new(50.0, 50.0);
    let plan = compute_descent_plan(center, 60.0, 10.0, 0.0, 0.0, 24);

    assert_eq!(plan.n_loops, 0);
    assert!(plan
        .waypoints
        .iter()
        .all(|w| w.phase != DescentPhase::Spiral));
    // Approach anchors on the circle center when there is no spiral
    assert_abs_diff_eq!(plan.waypoints[0].x, center.x, epsilon = 1e-9);
    assert_eq!(plan.waypoints.last().unwrap().phase, DescentPhase::Touchdown);
}

#[test]
fn runaway_start_altitude_is_capped() {
    // 200 m at 3 m per loop wants 62 loops; the cap holds it to 50 and the
    // plan still lands
    let plan = compute_descent_plan(Point::new(0.0, 0.0), 80.0, 200.0, 0.0, 0.0, 24);

    assert_eq!(plan.n_loops, 50);
    assert_eq!(plan.waypoints.last().unwrap().phase, DescentPhase::Touchdown);
}
