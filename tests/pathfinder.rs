extern crate shrike;

use shrike::geometry::Point;
use shrike::pathfinder::Pathfinder;
use shrike::sector::{Obstacle, SurveillanceMap};

fn sector_with_wall() -> SurveillanceMap {
    let mut sector =
        SurveillanceMap::new(500.0, 500.0, 10.0, Point::new(30.0, 250.0), 20.0, 30.0).unwrap();
    sector.add_obstacle(Obstacle::new(Point::new(250.0, 250.0), 60.0, false, "wall"));
    sector
}

#[test]
fn direct_route_when_nothing_blocks() {
    let sector =
        SurveillanceMap::new(500.0, 500.0, 10.0, Point::new(30.0, 250.0), 20.0, 30.0).unwrap();
    let pathfinder = Pathfinder::new(&sector, 3);

    let path = pathfinder.find_path(Point::new(50.0, 50.0), Point::new(450.0, 50.0));

    assert!(path.len() >= 2);
    assert_eq!(path[0], Point::new(50.0, 50.0));
    assert_eq!(*path.last().unwrap(), Point::new(450.0, 50.0));
    // An empty grid needs no intermediate corners beyond the cell snap
    assert!(path.len() <= 4, "unexpected detour: {path:?}");
}

#[test]
fn route_bends_around_the_inflated_obstacle() {
    let sector = sector_with_wall();
    let pathfinder = Pathfinder::new(&sector, 3);

    let start = Point::new(50.0, 250.0);
    let goal = Point::new(450.0, 250.0);
    let path = pathfinder.find_path(start, goal);

    assert!(path.len() > 2, "a straight hop would cross the wall");
    assert_eq!(path[0], start);
    assert_eq!(*path.last().unwrap(), goal);

    // Soundness: every retained segment sweeps clear cells on the inflated
    // grid
    for pair in path.windows(2) {
        assert!(
            pathfinder.is_corridor_clear(&pair[0], &pair[1]),
            "segment {} -> {} crosses the blocked mask",
            pair[0],
            pair[1]
        );
    }

    // And the corridor stays off the obstacle core on the sector itself
    for pair in path.windows(2) {
        assert!(
            sector.is_segment_safe(&pair[0], &pair[1], false, None),
            "segment {} -> {} is unsafe on the raw sector",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn blocked_endpoints_are_substituted() {
    let sector = sector_with_wall();
    let pathfinder = Pathfinder::new(&sector, 3);

    // Goal in the middle of the obstacle: the search lands on the nearest
    // unblocked cell instead, and the final point remains the request.
    let start = Point::new(50.0, 250.0);
    let goal = Point::new(250.0, 250.0);
    let path = pathfinder.find_path(start, goal);

    assert_eq!(path[0], start);
    assert_eq!(*path.last().unwrap(), goal);
    assert!(path.len() >= 3, "expected a corner at the substituted cell");

    // All interior corners are on unblocked cells
    for corner in &path[1..path.len() - 1] {
        assert!(
            pathfinder.is_corridor_clear(corner, corner),
            "corner {corner} sits on a blocked cell"
        );
    }
}

#[test]
fn tight_margins_admit_more_direct_routes() {
    let sector = sector_with_wall();

    let wide = Pathfinder::new(&sector, 6);
    let tight = Pathfinder::new(&sector, 1);

    let start = Point::new(50.0, 250.0);
    let goal = Point::new(450.0, 250.0);

    let length = |path: &[Point]| -> f64 {
        path.windows(2).map(|p| p[0].distance_to(&p[1])).sum()
    };

    let wide_path = wide.find_path(start, goal);
    let tight_path = tight.find_path(start, goal);

    // Allow a cell of slack for corner snapping
    assert!(
        length(&tight_path) <= length(&wide_path) + 10.0,
        "a tighter inflation should not lengthen the route: {:.1} vs {:.1}",
        length(&tight_path),
        length(&wide_path)
    );
}
