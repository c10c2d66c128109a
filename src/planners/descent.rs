/*
    Shrike, physics-constrained UAS mission planning
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

//! Loiter-to-land spiral descent: the aircraft lands inside its own
//! observation circle.
//!
//! The spiral sheds a fixed altitude per loop at 1.3x stall speed, hands
//! over to a straight approach at 15 m AGL, flares at 3 m, and cuts the
//! throttle for a belly-skid touchdown.

use std::fmt;

use hifitime::{Duration, Unit};
use serde::{Deserialize, Serialize};

use std::f64::consts::TAU;

use crate::atmosphere::performance_at;
use crate::geometry::Point;

/// Begin the flare at this AGL, m.
pub const FLARE_ALTITUDE_M: f64 = 3.0;
/// Switch from spiral to straight approach at this AGL, m.
pub const APPROACH_ALTITUDE_M: f64 = 15.0;
/// Airspeed margin over stall held through the descent.
pub const STALL_MARGIN: f64 = 1.3;
/// Constant bank angle during the spiral, degrees.
pub const BANK_ANGLE_DEG: f64 = 35.0;
/// Steepest terrain considered safe for a normal descent rate, degrees.
pub const MAX_TERRAIN_SLOPE_DEG: f64 = 8.0;
/// Hard cap on spiral loops.
const MAX_SPIRAL_LOOPS: usize = 50;

/// Descent state the waypoint belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescentPhase {
    Spiral,
    Approach,
    Flare,
    Touchdown,
}

impl fmt::Display for DescentPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Spiral => "spiral",
            Self::Approach => "approach",
            Self::Flare => "flare",
            Self::Touchdown => "touchdown",
        };
        write!(f, "{name}")
    }
}

/// A single point on the descent path.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DescentWaypoint {
    pub x: f64,
    pub y: f64,
    /// Meters AGL.
    pub altitude_m: f64,
    /// Target airspeed, m/s.
    pub speed_ms: f64,
    /// Bank angle, degrees.
    pub bank_deg: f64,
    pub phase: DescentPhase,
    pub loop_number: usize,
}

/// Complete loiter-to-land plan.
#[derive(Clone, Debug, PartialEq)]
pub struct DescentPlan {
    pub center: Point,
    pub radius_m: f64,
    pub start_altitude_m: f64,
    /// Ground elevation at the landing circle, m AMSL.
    pub terrain_elevation_m: f64,
    pub waypoints: Vec<DescentWaypoint>,
    pub n_loops: usize,
    pub total_distance_m: f64,
    pub total_duration: Duration,
    pub energy_wh: f64,
}

impl fmt::Display for DescentPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Descent from {:.0} m AGL at {}: {} loops, {:.0} m, {} for {:.1} Wh",
            self.start_altitude_m,
            self.center,
            self.n_loops,
            self.total_distance_m,
            self.total_duration,
            self.energy_wh
        )
    }
}

/// Compute a loiter-to-land spiral descent plan.
///
/// The aircraft stays on its loiter circle and sheds `descent_rate` meters
/// per loop until the approach altitude, then runs the straight approach,
/// flare and touchdown inside the circle. Performance is derived at the
/// terrain elevation (AMSL), not at the cruise altitude.
pub fn compute_descent_plan(
    center: Point,
    radius_m: f64,
    start_altitude_m: f64,
    terrain_altitude_m: f64,
    terrain_slope_deg: f64,
    waypoints_per_loop: usize,
) -> DescentPlan {
    let perf = performance_at(terrain_altitude_m);
    let approach_speed = perf.stall_speed_ms * STALL_MARGIN;

    let mut descent_rate = perf.descent_rate_m_per_loop;
    if terrain_slope_deg > MAX_TERRAIN_SLOPE_DEG {
        // Sloped landing zone: shallower spiral
        descent_rate *= 0.6;
    }

    let mut waypoints = Vec::new();
    let mut total_distance = 0.0;
    let mut total_seconds = 0.0;

    let mut current_alt = start_altitude_m;
    let mut loop_number = 0;

    while current_alt > APPROACH_ALTITUDE_M && loop_number < MAX_SPIRAL_LOOPS {
        loop_number += 1;
        for i in 0..waypoints_per_loop {
            let angle = TAU * i as f64 / waypoints_per_loop as f64;
            let frac = i as f64 / waypoints_per_loop as f64;
            waypoints.push(DescentWaypoint {
                x: center.x + radius_m * angle.cos(),
                y: center.y + radius_m * angle.sin(),
                altitude_m: (current_alt - descent_rate * frac).max(APPROACH_ALTITUDE_M),
                speed_ms: approach_speed,
                bank_deg: BANK_ANGLE_DEG,
                phase: DescentPhase::Spiral,
                loop_number,
            });
        }

        let loop_distance = TAU * radius_m;
        total_distance += loop_distance;
        total_seconds += loop_distance / approach_speed;
        current_alt -= descent_rate;
    }

    // The approach leg extends radially from the final spiral fix; terrain
    // slope orientation is not considered when picking its direction.
    let (anchor, approach_heading) = match waypoints.last() {
        Some(last) => (
            Point::new(last.x, last.y),
            (last.y - center.y).atan2(last.x - center.x),
        ),
        None => (center, 0.0),
    };

    let approach_distance = radius_m * 0.8;
    let approach_steps = 12;
    for i in 0..approach_steps {
        let frac = i as f64 / approach_steps as f64;
        let dist = approach_distance * frac;
        waypoints.push(DescentWaypoint {
            x: anchor.x + dist * approach_heading.cos(),
            y: anchor.y + dist * approach_heading.sin(),
            altitude_m: APPROACH_ALTITUDE_M - (APPROACH_ALTITUDE_M - FLARE_ALTITUDE_M) * frac,
            // Bleed speed gradually, wings level
            speed_ms: approach_speed * (1.0 - 0.15 * frac),
            bank_deg: 0.0,
            phase: DescentPhase::Approach,
            loop_number,
        });
    }
    total_distance += approach_distance;
    total_seconds += approach_distance / (approach_speed * 0.85);

    let flare_distance = radius_m * 0.3;
    let flare_steps = 6;
    let flare_anchor = waypoints
        .last()
        .map(|w| Point::new(w.x, w.y))
        .unwrap_or(center);
    for i in 0..flare_steps {
        let frac = i as f64 / flare_steps as f64;
        let dist = flare_distance * frac;
        waypoints.push(DescentWaypoint {
            x: flare_anchor.x + dist * approach_heading.cos(),
            y: flare_anchor.y + dist * approach_heading.sin(),
            altitude_m: (FLARE_ALTITUDE_M * (1.0 - frac)).max(0.0),
            speed_ms: approach_speed * 0.75,
            bank_deg: 0.0,
            phase: DescentPhase::Flare,
            loop_number,
        });
    }
    total_distance += flare_distance;
    total_seconds += flare_distance / (approach_speed * 0.6);

    let touchdown_anchor = waypoints
        .last()
        .map(|w| Point::new(w.x, w.y))
        .unwrap_or(center);
    waypoints.push(DescentWaypoint {
        x: touchdown_anchor.x,
        y: touchdown_anchor.y,
        altitude_m: 0.0,
        speed_ms: 0.0,
        bank_deg: 0.0,
        phase: DescentPhase::Touchdown,
        loop_number,
    });

    let plan = DescentPlan {
        center,
        radius_m,
        start_altitude_m,
        terrain_elevation_m: terrain_altitude_m,
        waypoints,
        n_loops: loop_number,
        total_distance_m: total_distance,
        total_duration: total_seconds * Unit::Second,
        // Reduced throttle all the way down
        energy_wh: perf.power_draw_w * 0.6 * total_seconds / 3600.0,
    };

    info!("{plan}");
    plan
}
