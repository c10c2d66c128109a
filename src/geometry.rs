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

//! Planar geometry primitives shared by every planner.
//!
//! Coordinates are in meters, origin at the south-west corner of the sector,
//! x east and y north. Headings are in radians, normalized to (−π, π].

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use std::f64::consts::{PI, TAU};

/// A 2D point in sector coordinates, in meters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Heading angle from this point toward another, in radians.
    pub fn heading_to(&self, other: &Self) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// A position with a heading, i.e. the configuration of a forward-only
/// vehicle in the plane.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub heading: f64,
}

impl Pose {
    pub fn new(position: Point, heading: f64) -> Self {
        Self {
            position,
            heading: normalize_angle(heading),
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} @ {:.3} rad", self.position, self.heading)
    }
}

/// Normalize an angle to (−π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut angle = angle;
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Whether `point` lies inside (or on) the circle at `center` of radius `radius`.
pub fn point_in_circle(point: &Point, center: &Point, radius: f64) -> bool {
    point.distance_to(center) <= radius
}

/// Intersection points of two circles.
///
/// Returns zero points for disjoint, contained or coincident circles, one
/// point for tangent circles and two otherwise.
pub fn circle_intersection(c1: &Point, r1: f64, c2: &Point, r2: f64) -> Vec<Point> {
    let d = c1.distance_to(c2);

    if d > r1 + r2 || d < (r1 - r2).abs() || d == 0.0 {
        return Vec::new();
    }

    let a = (r1.powi(2) - r2.powi(2) + d.powi(2)) / (2.0 * d);
    let h = (r1.powi(2) - a.powi(2)).max(0.0).sqrt();

    // Foot of the chord on the line between centers
    let px = c1.x + a * (c2.x - c1.x) / d;
    let py = c1.y + a * (c2.y - c1.y) / d;

    let p1 = Point::new(px + h * (c2.y - c1.y) / d, py - h * (c2.x - c1.x) / d);
    let p2 = Point::new(px - h * (c2.y - c1.y) / d, py + h * (c2.x - c1.x) / d);

    if h == 0.0 {
        vec![p1]
    } else {
        vec![p1, p2]
    }
}

/// Intersection points of the segment `[start, end]` with a circle.
pub fn line_circle_intersection(
    start: &Point,
    end: &Point,
    center: &Point,
    radius: f64,
) -> Vec<Point> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;

    let fx = start.x - center.x;
    let fy = start.y - center.y;

    let a = dx * dx + dy * dy;
    let b = 2.0 * (fx * dx + fy * dy);
    let c = fx * fx + fy * fy - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || a == 0.0 {
        return Vec::new();
    }

    let sqrt_disc = discriminant.sqrt();
    let mut intersections = Vec::new();
    for t in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
        if (0.0..=1.0).contains(&t) {
            intersections.push(Point::new(start.x + t * dx, start.y + t * dy));
        }
    }

    intersections
}

/// Rotate `point` about `center` by `angle` radians.
pub fn rotate_point(point: &Point, center: &Point, angle: f64) -> Point {
    let (sin_a, cos_a) = angle.sin_cos();

    let tx = point.x - center.x;
    let ty = point.y - center.y;

    Point::new(
        tx * cos_a - ty * sin_a + center.x,
        tx * sin_a + ty * cos_a + center.y,
    )
}

/// Sample `num_points` points along a circle perimeter, starting east.
pub fn circle_points(center: &Point, radius: f64, num_points: usize) -> Vec<Point> {
    (0..num_points)
        .map(|i| {
            let angle = TAU * i as f64 / num_points as f64;
            Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}
