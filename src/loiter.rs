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

//! Loiter stations, the fundamental unit of surveillance: the aircraft flies
//! a closed circle or racetrack for observation instead of hovering.

use std::fmt;

use serde::{Deserialize, Serialize};

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::geometry::{normalize_angle, Point};

/// Loiter pattern families, each sized for a different observation need.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoiterKind {
    /// 50–100 m radius, target focus.
    Tight,
    /// 100–200 m radius, general area surveillance.
    Standard,
    /// 200–500 m radius, broad patrol.
    Wide,
    /// Semi-circles joined by straights, for linear features.
    Racetrack,
}

impl LoiterKind {
    /// Default radius band for this pattern, meters.
    pub fn radius_range(self) -> (f64, f64) {
        match self {
            Self::Tight => (50.0, 100.0),
            Self::Standard => (100.0, 200.0),
            Self::Wide => (200.0, 500.0),
            Self::Racetrack => (100.0, 300.0),
        }
    }

    /// Energy cost multiplier. Tighter turns cost more; wide orbits glide.
    pub fn energy_multiplier(self) -> f64 {
        match self {
            Self::Tight => 1.3,
            Self::Standard => 1.0,
            Self::Wide => 0.8,
            Self::Racetrack => 0.9,
        }
    }
}

impl fmt::Display for LoiterKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Tight => "TIGHT",
            Self::Standard => "STANDARD",
            Self::Wide => "WIDE",
            Self::Racetrack => "RACETRACK",
        };
        write!(f, "{name}")
    }
}

/// An immutable loiter station.
///
/// The entry point lies on the circle at the polar angle `entry_heading`;
/// the exit point at `entry_heading ± 2π·revolutions` (sign by rotation
/// sense). Waypoints are computed on demand from the parameters, never
/// cached in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loiter {
    pub center: Point,
    pub radius: f64,
    pub kind: LoiterKind,
    /// Polar angle of the entry point on the circle, radians.
    pub entry_heading: f64,
    pub revolutions: f64,
    pub clockwise: bool,
    /// Meters AGL.
    pub altitude_m: f64,
    /// Straight segment length for racetracks.
    pub racetrack_length: Option<f64>,
    /// Racetrack axis orientation, radians.
    pub racetrack_heading: Option<f64>,
}

impl Loiter {
    /// A circular loiter with one full revolution, clockwise, at 100 m AGL.
    pub fn new(center: Point, radius: f64, kind: LoiterKind, entry_heading: f64) -> Self {
        Self {
            center,
            radius,
            kind,
            entry_heading: normalize_angle(entry_heading),
            revolutions: 1.0,
            clockwise: true,
            altitude_m: 100.0,
            racetrack_length: None,
            racetrack_heading: None,
        }
    }

    /// A circular loiter sized to the middle of its kind's radius band.
    pub fn sized_for(center: Point, kind: LoiterKind, entry_heading: f64) -> Self {
        let (min_r, max_r) = kind.radius_range();
        Self::new(center, (min_r + max_r) / 2.0, kind, entry_heading)
    }

    /// A racetrack station: two semi-circles joined by straights of
    /// `length`, oriented along `heading`.
    pub fn racetrack(
        center: Point,
        radius: f64,
        entry_heading: f64,
        length: f64,
        heading: f64,
    ) -> Self {
        let mut loiter = Self::new(center, radius, LoiterKind::Racetrack, entry_heading);
        loiter.racetrack_length = Some(length);
        loiter.racetrack_heading = Some(heading);
        loiter
    }

    /// Angular sweep direction: negative for clockwise orbits.
    fn direction(&self) -> f64 {
        if self.clockwise {
            -1.0
        } else {
            1.0
        }
    }

    /// Path length of one revolution, meters.
    pub fn circumference(&self) -> f64 {
        match self.racetrack_length {
            Some(length) if self.kind == LoiterKind::Racetrack => TAU * self.radius + 2.0 * length,
            _ => TAU * self.radius,
        }
    }

    /// Path length over all revolutions, meters.
    pub fn total_distance(&self) -> f64 {
        self.circumference() * self.revolutions
    }

    /// Approximate sensor footprint, assuming the footprint matches the
    /// loiter radius.
    pub fn coverage_area(&self) -> f64 {
        match self.racetrack_length {
            Some(length) if self.kind == LoiterKind::Racetrack => {
                length * 2.0 * self.radius + PI * self.radius.powi(2)
            }
            _ => PI * self.radius.powi(2),
        }
    }

    /// Energy surrogate: flown distance weighted by the pattern multiplier.
    pub fn energy_cost(&self) -> f64 {
        self.total_distance() * self.kind.energy_multiplier()
    }

    fn exit_angle(&self) -> f64 {
        self.entry_heading + self.direction() * TAU * self.revolutions
    }

    pub fn entry_point(&self) -> Point {
        Point::new(
            self.center.x + self.radius * self.entry_heading.cos(),
            self.center.y + self.radius * self.entry_heading.sin(),
        )
    }

    pub fn exit_point(&self) -> Point {
        let angle = self.exit_angle();
        Point::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// Aircraft heading at the exit point: the tangent of the circle in the
    /// sweep direction.
    pub fn exit_heading(&self) -> f64 {
        normalize_angle(self.exit_angle() + self.direction() * FRAC_PI_2)
    }

    /// Aircraft heading at the entry point.
    pub fn entry_tangent(&self) -> f64 {
        normalize_angle(self.entry_heading + self.direction() * FRAC_PI_2)
    }

    /// Whether a point falls inside the station's coverage footprint.
    pub fn contains(&self, point: &Point) -> bool {
        match self.racetrack_length {
            Some(length) if self.kind == LoiterKind::Racetrack => {
                point.distance_to(&self.center) <= self.radius + length / 2.0
            }
            _ => point.distance_to(&self.center) <= self.radius,
        }
    }

    /// Waypoints describing the pattern, `points_per_rev` per revolution.
    pub fn waypoints(&self, points_per_rev: usize) -> Vec<Point> {
        match (self.kind, self.racetrack_length, self.racetrack_heading) {
            (LoiterKind::Racetrack, Some(length), Some(heading)) => {
                self.racetrack_waypoints(points_per_rev, length, heading)
            }
            // An unconfigured racetrack degrades to the circular pattern
            _ => self.circular_waypoints(points_per_rev),
        }
    }

    fn circular_waypoints(&self, points_per_rev: usize) -> Vec<Point> {
        let total_points = (points_per_rev as f64 * self.revolutions) as usize;
        let direction = self.direction();

        (0..=total_points)
            .map(|i| {
                let angle =
                    self.entry_heading + direction * TAU * i as f64 / points_per_rev as f64;
                Point::new(
                    self.center.x + self.radius * angle.cos(),
                    self.center.y + self.radius * angle.sin(),
                )
            })
            .collect()
    }

    fn racetrack_waypoints(&self, points_per_turn: usize, length: f64, heading: f64) -> Vec<Point> {
        let mut waypoints = Vec::new();
        let half_points = (points_per_turn / 2).max(1);

        let offset = Point::new(
            (length / 2.0) * heading.cos(),
            (length / 2.0) * heading.sin(),
        );
        let center1 = self.center - offset;
        let center2 = self.center + offset;

        for _rev in 0..(self.revolutions as usize).max(1) {
            for i in 0..=half_points {
                let angle = heading + FRAC_PI_2 + PI * i as f64 / half_points as f64;
                waypoints.push(Point::new(
                    center1.x + self.radius * angle.cos(),
                    center1.y + self.radius * angle.sin(),
                ));
            }
            for i in 0..=half_points {
                let angle = heading - FRAC_PI_2 + PI * i as f64 / half_points as f64;
                waypoints.push(Point::new(
                    center2.x + self.radius * angle.cos(),
                    center2.y + self.radius * angle.sin(),
                ));
            }
        }

        waypoints
    }
}

impl fmt::Display for Loiter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} loiter at {} r = {:.1} m, {:.1} rev {}",
            self.kind,
            self.center,
            self.radius,
            self.revolutions,
            if self.clockwise { "cw" } else { "ccw" }
        )
    }
}
