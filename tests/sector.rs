extern crate shrike;

use shrike::geometry::Point;
use shrike::sector::random::{random_sector_with_seed, RandomSectorConfig};
use shrike::sector::{lac::lac_sector, CellKind, Obstacle, SurveillanceMap};
use shrike::ShrikeError;

fn empty_sector() -> SurveillanceMap {
    SurveillanceMap::new(200.0, 200.0, 10.0, Point::new(15.0, 15.0), 20.0, 30.0).unwrap()
}

#[test]
fn dimensions_must_be_positive() {
    for (w, h, r) in [(-1.0, 200.0, 10.0), (200.0, 0.0, 10.0), (200.0, 200.0, -5.0)] {
        match SurveillanceMap::new(w, h, r, Point::new(0.0, 0.0), 20.0, 30.0) {
            Err(ShrikeError::InvalidConfiguration(_)) => {}
            other => panic!("expected InvalidConfiguration for {w}x{h}@{r}, got {other:?}"),
        }
    }
}

#[test]
fn home_cell_is_start_and_safe() {
    let mut sector = empty_sector();
    assert_eq!(sector.kind_at(1, 1), CellKind::Start);

    // Even an obstacle dropped right on top of home cannot overwrite it
    sector.add_obstacle(Obstacle::new(Point::new(15.0, 15.0), 50.0, false, "over_home"));
    assert_eq!(sector.kind_at(1, 1), CellKind::Start);
    assert!(sector.is_point_safe(&Point::new(15.0, 15.0), true));
}

#[test]
fn rasterization_writes_hard_core_and_soft_annulus() {
    let mut sector = empty_sector();
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, false, "tower"));

    // Cell at the obstacle center
    assert_eq!(sector.kind_at(10, 10), CellKind::Obstacle);
    // Cell inside the margin annulus: center (145, 105) is 40 m out
    assert_eq!(sector.kind_at(14, 10), CellKind::SoftNoFly);
    // Cell beyond radius + margin stays free: (165, 105) is 60 m out
    assert_eq!(sector.kind_at(16, 10), CellKind::Free);
}

#[test]
fn rasterization_never_downgrades_a_cell() {
    // No-fly first, obstacle second: the core must stay NO_FLY
    let mut sector = empty_sector();
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, true, "zone"));
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, false, "tower"));
    assert_eq!(sector.kind_at(10, 10), CellKind::NoFly);

    // Obstacle first, no-fly second: the no-fly wins the overlap
    let mut sector = empty_sector();
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, false, "tower"));
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, true, "zone"));
    assert_eq!(sector.kind_at(10, 10), CellKind::NoFly);
}

#[test]
fn point_safety_queries() {
    let mut sector = empty_sector();
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, false, "tower"));

    assert!(!sector.is_point_safe(&Point::new(105.0, 105.0), false));
    // Soft band blocks only when soft cells are included
    assert!(sector.is_point_safe(&Point::new(145.0, 105.0), false));
    assert!(!sector.is_point_safe(&Point::new(145.0, 105.0), true));
    // Out of bounds is never safe
    assert!(!sector.is_point_safe(&Point::new(-5.0, 50.0), false));
    assert!(!sector.is_point_safe(&Point::new(50.0, 900.0), false));
}

#[test]
fn segment_safety_short_circuits_on_obstacles() {
    let mut sector = empty_sector();
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, false, "tower"));

    // Straight through the core
    assert!(!sector.is_segment_safe(
        &Point::new(15.0, 105.0),
        &Point::new(195.0, 105.0),
        false,
        None
    ));
    // Along the southern edge, clear of everything
    assert!(sector.is_segment_safe(
        &Point::new(15.0, 15.0),
        &Point::new(195.0, 15.0),
        false,
        None
    ));
    // Degenerate segment falls back to the point query
    assert!(!sector.is_segment_safe(
        &Point::new(105.0, 105.0),
        &Point::new(105.0, 105.0),
        false,
        None
    ));
}

#[test]
fn coverage_combines_by_max_and_counts_threshold_crossings() {
    let mut sector = empty_sector();

    let first = sector.mark_covered(&Point::new(100.0, 100.0), 30.0, 1.0);
    assert!(first > 0, "a fresh disk must cover cells");

    // Same disk again: nothing newly crosses the threshold
    let again = sector.mark_covered(&Point::new(100.0, 100.0), 30.0, 1.0);
    assert_eq!(again, 0);

    // A weaker pass cannot lower existing coverage
    sector.mark_covered(&Point::new(100.0, 100.0), 30.0, 0.2);
    let pct_before = sector.coverage_percentage();
    sector.mark_covered(&Point::new(100.0, 100.0), 30.0, 0.2);
    assert_eq!(sector.coverage_percentage(), pct_before);

    // Sub-threshold marks do not count as covered
    let low = sector.mark_covered(&Point::new(30.0, 170.0), 20.0, 0.4);
    assert_eq!(low, 0);
}

#[test]
fn coverage_percentage_over_free_cells_only() {
    let mut sector = empty_sector();
    assert_eq!(sector.coverage_percentage(), 0.0);

    let uncovered_before = sector.uncovered_cells().len();
    sector.mark_covered(&Point::new(100.0, 100.0), 500.0, 1.0);
    assert!(sector.coverage_percentage() > 99.9);
    assert!(sector.uncovered_cells().len() < uncovered_before);

    sector.reset_coverage();
    assert_eq!(sector.coverage_percentage(), 0.0);
    assert_eq!(sector.uncovered_cells().len(), uncovered_before);
}

#[test]
fn uncovered_cells_iterate_lexicographically() {
    let sector = empty_sector();
    let cells = sector.uncovered_cells();
    let mut sorted = cells.clone();
    sorted.sort();
    assert_eq!(cells, sorted, "iteration order must be reproducible");
}

#[test]
fn obstacle_lookup_and_distances() {
    let mut sector = empty_sector();
    sector.add_obstacle(Obstacle::new(Point::new(105.0, 105.0), 30.0, false, "tower"));
    sector.add_obstacle(Obstacle::new(Point::new(40.0, 160.0), 15.0, true, "zone"));

    assert_eq!(
        sector.obstacle_at(&Point::new(100.0, 100.0)).map(|o| o.name.as_str()),
        Some("tower")
    );
    assert!(sector.obstacle_at(&Point::new(190.0, 20.0)).is_none());

    let dist = sector.distance_to_nearest_obstacle(&Point::new(105.0, 145.0));
    assert!((dist - 10.0).abs() < 1e-9, "expected 10 m to the rim, got {dist}");

    assert!(sector.traversable_area() > 0.0);
}

#[test]
fn random_sector_is_reproducible_and_well_formed() {
    let cfg = RandomSectorConfig::default();
    let a = random_sector_with_seed(cfg, 42).unwrap();
    let b = random_sector_with_seed(cfg, 42).unwrap();

    assert_eq!(a.start_position, b.start_position);
    assert_eq!(a.obstacles().len(), b.obstacles().len());
    for (oa, ob) in a.obstacles().iter().zip(b.obstacles()) {
        assert_eq!(oa, ob);
    }

    assert!(!a.obstacles().is_empty());
    for obs in a.obstacles() {
        // Every obstacle keeps clear of home
        assert!(obs.center.distance_to(&a.start_position) >= obs.radius + 120.0);
        // And sits inside the sector
        assert!(obs.center.x > 0.0 && obs.center.x < a.width);
        assert!(obs.center.y > 0.0 && obs.center.y < a.height);
    }

    let c = random_sector_with_seed(cfg, 7).unwrap();
    assert_ne!(
        a.start_position, c.start_position,
        "different seeds should move the home position"
    );
}

#[test]
fn lac_sector_has_terrain_and_keep_outs() {
    let (sector, heightmap, landmarks) = lac_sector(42).unwrap();

    assert_eq!(sector.obstacles().len(), 11);
    assert_eq!(sector.obstacles().iter().filter(|o| o.is_no_fly).count(), 3);
    assert_eq!(landmarks.len(), 8);

    // The elevation band is Ladakh-plausible
    assert!(heightmap.min_elevation() >= 3500.0);
    assert!(heightmap.max_elevation() <= 5600.0);

    // Terrain under a named peak is raised well above the valley floor
    let peak = heightmap.elevation_at(&Point::new(1000.0, 500.0));
    assert!(peak > 4800.0, "peak terrain reads {peak} m");

    // Reproducible heightmap
    let (_, again, _) = lac_sector(42).unwrap();
    let probe = Point::new(2500.0, 1200.0);
    assert_eq!(heightmap.elevation_at(&probe), again.elevation_at(&probe));
}
