extern crate shrike;

use shrike::geometry::Point;
use shrike::io::{MapKind, MissionDocument};
use shrike::loiter::LoiterKind;
use shrike::planners::descent::DescentPhase;
use shrike::planners::mission::{MissionParams, MissionPlanner};
use shrike::sector::{Obstacle, SurveillanceMap};
use shrike::ShrikeError;

/// The reference scenario: 1000x700 m sector at 10 m resolution, four
/// obstacles, home on the western edge, sea level.
fn reference_sector() -> SurveillanceMap {
    let mut sector =
        SurveillanceMap::new(1000.0, 700.0, 10.0, Point::new(80.0, 350.0), 20.0, 30.0).unwrap();
    for (x, y, r, name) in [
        (350.0, 400.0, 60.0, "building_1"),
        (650.0, 550.0, 50.0, "tower_1"),
        (650.0, 200.0, 45.0, "building_2"),
        (900.0, 380.0, 40.0, "antenna_1"),
    ] {
        sector.add_obstacle(Obstacle::new(Point::new(x, y), r, false, name));
    }
    sector
}

fn reference_params() -> MissionParams {
    MissionParams {
        loiter_kind: LoiterKind::Standard,
        loiter_radius_m: 80.0,
        min_turn_radius_m: 40.0,
        overlap_factor: 0.3,
        coverage_threshold_pct: 98.0,
        max_loiters: 100,
        revolutions: 1.0,
        cruise_agl_m: 80.0,
        corridor_safety_cells: 5,
    }
}

#[test]
fn reference_mission_end_to_end() {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }

    let mut sector = reference_sector();
    let mission = {
        let mut planner = MissionPlanner::new(&mut sector, 0.0, reference_params()).unwrap();
        planner.plan().unwrap()
    };

    // Enough stations to blanket the sector, and most of it covered
    assert!(
        mission.path.loiters.len() >= 6,
        "only {} loiters planned",
        mission.path.loiters.len()
    );
    assert!(
        mission.coverage_pct >= 95.0,
        "achieved coverage {:.1}%",
        mission.coverage_pct
    );

    // Safety: every station clears every obstacle by radius + margin
    for loiter in &mission.path.loiters {
        for obstacle in sector.obstacles() {
            let clearance = loiter.center.distance_to(&obstacle.center);
            assert!(
                clearance >= obstacle.radius + loiter.radius + 20.0 - 1e-9,
                "loiter at {} too close to {}",
                loiter.center,
                obstacle.name
            );
        }
    }

    // One transition between each pair of stations
    assert_eq!(
        mission.path.transitions.len(),
        mission.path.loiters.len() - 1
    );

    // The whole program fits in 78% of the pack
    let total = mission.budget.total_energy_wh();
    assert!(
        total <= 289.0,
        "mission needs {total:.1} Wh, over the 289 Wh envelope"
    );
    assert!(mission.budget.is_within_budget());
    assert!(mission.status.within_budget);

    // The descent is anchored at the final loiter and lands
    let last_loiter = mission.path.loiters.last().unwrap();
    assert_eq!(mission.descent.center, last_loiter.center);
    let touchdown = mission.descent.waypoints.last().unwrap();
    assert_eq!(touchdown.phase, DescentPhase::Touchdown);
    assert_eq!(touchdown.altitude_m, 0.0);

    // Sea level figures flow through
    assert!((mission.performance.cruise_speed_ms - 19.0).abs() < 1e-6);
    assert!((mission.atmosphere.density_ratio - 1.0).abs() < 1e-6);
}

#[test]
fn border_sector_mission_lands_on_real_terrain() {
    let (mut sector, heightmap, _landmarks) = shrike::sector::lac::lac_sector(42).unwrap();

    // A patrol slice of the sector, not a full blanket: wide orbits, modest
    // coverage target
    let params = MissionParams {
        loiter_kind: LoiterKind::Wide,
        loiter_radius_m: 250.0,
        min_turn_radius_m: 60.0,
        overlap_factor: 0.25,
        coverage_threshold_pct: 15.0,
        max_loiters: 20,
        revolutions: 1.0,
        cruise_agl_m: 150.0,
        corridor_safety_cells: 6,
    };

    let mission = {
        let mut planner = MissionPlanner::new(&mut sector, 4000.0, params)
            .unwrap()
            .with_terrain(&heightmap);
        planner.plan().unwrap()
    };

    assert!(!mission.path.loiters.is_empty());
    assert!(mission.coverage_pct >= 15.0);

    // The landing circle reads its ground elevation from the heightmap
    let terrain = mission.descent.terrain_elevation_m;
    assert!(
        (3500.0..=5600.0).contains(&terrain),
        "terrain elevation {terrain} outside the sector band"
    );
    assert_eq!(
        terrain,
        heightmap.elevation_at(&mission.descent.center),
        "descent must anchor on the terrain under the final loiter"
    );

    // Thin air: the orbits fly faster than the sea-level baseline
    assert!(mission.performance.cruise_speed_ms > 19.0);
    assert_eq!(
        mission.descent.waypoints.last().unwrap().phase,
        DescentPhase::Touchdown
    );
}

#[test]
fn altitude_outside_the_troposphere_is_rejected() {
    let mut sector = reference_sector();
    match MissionPlanner::new(&mut sector, 20_000.0, reference_params()) {
        Err(ShrikeError::InvalidConfiguration(_)) => {}
        Err(other) => panic!("expected InvalidConfiguration, got {other}"),
        Ok(_) => panic!("a 20 km operating altitude must be rejected"),
    }
}

#[test]
fn high_altitude_planning_widens_the_orbits() {
    let mut sector = reference_sector();
    let mut params = reference_params();
    params.loiter_radius_m = 55.0;
    params.coverage_threshold_pct = 80.0;

    let mission = {
        let mut planner = MissionPlanner::new(&mut sector, 4000.0, params).unwrap();
        planner.plan().unwrap()
    };

    // 55 m is tighter than the thin-air minimum: the planner must have
    // raised the radius to the performance floor (~78.6 m)
    for loiter in &mission.path.loiters {
        assert!(
            loiter.radius >= mission.performance.loiter_radius_m - 1e-9,
            "loiter radius {} below the physical floor {}",
            loiter.radius,
            mission.performance.loiter_radius_m
        );
    }
}

#[test]
fn document_carries_every_normative_section() {
    let mut sector = reference_sector();
    let mission = {
        let mut planner = MissionPlanner::new(&mut sector, 0.0, reference_params()).unwrap();
        planner.plan().unwrap()
    };

    let document = MissionDocument::assemble(&sector, MapKind::Random, 0.0, &mission);
    let json = document.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    for section in [
        "map",
        "home",
        "altitude_m",
        "performance",
        "obstacles",
        "loiters",
        "waypoints",
        "energy",
        "descent",
        "stats",
    ] {
        assert!(value.get(section).is_some(), "missing section {section}");
    }

    assert_eq!(value["map"]["type"], "random");
    assert_eq!(value["map"]["width"], 1000.0);
    assert_eq!(value["home"]["x"], 80.0);
    assert_eq!(value["obstacles"].as_array().unwrap().len(), 4);
    assert_eq!(value["obstacles"][0]["is_no_fly"], false);

    // Loiters are 1-based and carry their pattern tag
    let loiters = value["loiters"].as_array().unwrap();
    assert_eq!(loiters[0]["index"], 1);
    assert_eq!(loiters[0]["type"], "STANDARD");

    // Waypoints bracket the tour with home and return
    let waypoints = value["waypoints"].as_array().unwrap();
    assert_eq!(waypoints[0]["type"], "home");
    assert_eq!(waypoints.last().unwrap()["type"], "return");
    assert_eq!(waypoints.len(), loiters.len() + 2);
    assert!(waypoints[1]["radius"].is_number());

    // Energy section: the five-way breakdown and the phase list
    let energy = &value["energy"];
    assert_eq!(energy["battery_capacity_wh"], 370.0);
    for kind in ["climb", "transit", "loiter", "descent", "rtb"] {
        assert!(
            energy["energy_by_type"].get(kind).is_some(),
            "missing energy class {kind}"
        );
    }
    let phases = energy["phases"].as_array().unwrap();
    assert!(!phases.is_empty());
    assert_eq!(phases[0]["type"], "climb");
    assert!(phases[0]["duration_s"].is_number());

    // Descent waypoints carry lowercase phase tags and loop indices
    let descent_wps = value["descent"]["waypoints"].as_array().unwrap();
    assert_eq!(descent_wps.last().unwrap()["phase"], "touchdown");
    assert!(descent_wps[0]["loop"].is_number());

    // Stats reconcile with the rest of the document
    assert_eq!(
        value["stats"]["total_loiters"].as_u64().unwrap() as usize,
        loiters.len()
    );
    assert_eq!(value["stats"]["num_obstacles"], 4);

    // And the document round-trips
    let parsed: MissionDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, document);
}

#[test]
fn replanning_requires_an_explicit_coverage_reset() {
    let mut sector = reference_sector();
    let params = reference_params();

    let first = {
        let mut planner = MissionPlanner::new(&mut sector, 0.0, params).unwrap();
        planner.plan().unwrap()
    };
    assert!(!first.path.loiters.is_empty());

    // Without a reset only the residual cells are left: at most a little
    // mop-up work remains
    let stale = {
        let mut planner = MissionPlanner::new(&mut sector, 0.0, params).unwrap();
        planner.plan().unwrap()
    };
    assert!(
        stale.path.loiters.len() < first.path.loiters.len(),
        "a covered sector must not replan the full mission"
    );

    // After a reset the identical plan comes back
    sector.reset_coverage();
    let fresh = {
        let mut planner = MissionPlanner::new(&mut sector, 0.0, params).unwrap();
        planner.plan().unwrap()
    };
    assert_eq!(fresh.path.loiters.len(), first.path.loiters.len());
    for (a, b) in fresh.path.loiters.iter().zip(&first.path.loiters) {
        assert_eq!(a.center, b.center);
    }
}
