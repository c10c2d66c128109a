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

//! Dubins paths: shortest paths between two oriented poses for a vehicle
//! that only moves forward under a minimum turn radius.
//!
//! All six canonical families are evaluated in the normalized frame (unit
//! turn radius) and the shortest feasible one wins. A family is disqualified
//! when a square root argument goes negative or an `acos` argument leaves
//! `[-1, 1]`; infeasible families are simply omitted, never carried as
//! sentinel values.

use std::fmt;

use serde::{Deserialize, Serialize};

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::geometry::{normalize_angle, Point, Pose};
use crate::ShrikeError;

/// The six Dubins families, as turn/straight letter patterns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DubinsKind {
    LSL,
    LSR,
    RSL,
    RSR,
    RLR,
    LRL,
}

impl DubinsKind {
    pub const ALL: [Self; 6] = [Self::LSL, Self::LSR, Self::RSL, Self::RSR, Self::RLR, Self::LRL];

    fn segments(self) -> [Segment; 3] {
        use Segment::{Left, Right, Straight};
        match self {
            Self::LSL => [Left, Straight, Left],
            Self::LSR => [Left, Straight, Right],
            Self::RSL => [Right, Straight, Left],
            Self::RSR => [Right, Straight, Right],
            Self::RLR => [Right, Left, Right],
            Self::LRL => [Left, Right, Left],
        }
    }
}

impl fmt::Display for DubinsKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Segment {
    Left,
    Straight,
    Right,
}

/// A Dubins path bound to its start pose, end pose and turn radius.
///
/// The three segment lengths are stored in meters; the path is sampled into
/// waypoints on demand by forward-simulating the segment pattern.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DubinsPath {
    pub start: Pose,
    pub end: Pose,
    pub turn_radius: f64,
    pub kind: DubinsKind,
    /// Segment lengths in meters.
    pub lengths: [f64; 3],
}

impl DubinsPath {
    /// Compute the shortest Dubins path between two poses.
    ///
    /// Candidates are compared with a strict `<` on total length, in family
    /// declaration order, so the result is deterministic.
    pub fn shortest(start: Pose, end: Pose, turn_radius: f64) -> Result<Self, ShrikeError> {
        if turn_radius <= 0.0 {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "turn radius must be positive, got {turn_radius}"
            )));
        }

        let mut best: Option<Self> = None;
        for kind in DubinsKind::ALL {
            if let Some(candidate) = Self::with_kind(start, end, turn_radius, kind) {
                match &best {
                    Some(path) if candidate.total_length() >= path.total_length() => {}
                    _ => best = Some(candidate),
                }
            }
        }

        best.ok_or(ShrikeError::UnreachableGeometry { from: start, to: end })
    }

    /// Compute one specific family for this pose pair, or `None` when that
    /// family is infeasible for the geometry.
    pub fn with_kind(start: Pose, end: Pose, turn_radius: f64, kind: DubinsKind) -> Option<Self> {
        if turn_radius <= 0.0 {
            return None;
        }

        let dx = end.position.x - start.position.x;
        let dy = end.position.y - start.position.y;
        let d = (dx * dx + dy * dy).sqrt() / turn_radius;

        let theta = dy.atan2(dx);
        let alpha = normalize_angle(start.heading - theta);
        let beta = normalize_angle(end.heading - theta);

        segment_lengths(d, alpha, beta, kind).map(|(t, p, q)| Self {
            start,
            end,
            turn_radius,
            kind,
            lengths: [t * turn_radius, p * turn_radius, q * turn_radius],
        })
    }

    /// Total path length, in meters.
    pub fn total_length(&self) -> f64 {
        self.lengths.iter().sum()
    }

    /// Sample waypoints along the path every `step_size` meters.
    ///
    /// Straight segments advance linearly; arc segments orbit the turn
    /// center at a perpendicular offset from the running pose. The exact end
    /// point is always appended last.
    pub fn sample(&self, step_size: f64) -> Vec<Point> {
        let mut waypoints = Vec::new();
        let mut position = self.start.position;
        let mut heading = self.start.heading;

        for (segment, length) in self.kind.segments().into_iter().zip(self.lengths) {
            if length <= 0.0 {
                continue;
            }
            match segment {
                Segment::Straight => {
                    let steps = ((length / step_size) as usize).max(1);
                    let (dy, dx) = heading.sin_cos();
                    for i in 0..steps {
                        let t = i as f64 / steps as f64;
                        waypoints.push(Point::new(
                            position.x + t * length * dx,
                            position.y + t * length * dy,
                        ));
                    }
                    position = Point::new(position.x + length * dx, position.y + length * dy);
                }
                Segment::Left | Segment::Right => {
                    let left = segment == Segment::Left;
                    let perpendicular = if left {
                        heading + FRAC_PI_2
                    } else {
                        heading - FRAC_PI_2
                    };
                    let center = Point::new(
                        position.x + self.turn_radius * perpendicular.cos(),
                        position.y + self.turn_radius * perpendicular.sin(),
                    );

                    let mut arc_angle = length / self.turn_radius;
                    if !left {
                        arc_angle = -arc_angle;
                    }

                    let steps = ((length / step_size) as usize).max(1);
                    let start_angle = (position.y - center.y).atan2(position.x - center.x);
                    for i in 0..steps {
                        let angle = start_angle + arc_angle * i as f64 / steps as f64;
                        waypoints.push(Point::new(
                            center.x + self.turn_radius * angle.cos(),
                            center.y + self.turn_radius * angle.sin(),
                        ));
                    }

                    let end_angle = start_angle + arc_angle;
                    position = Point::new(
                        center.x + self.turn_radius * end_angle.cos(),
                        center.y + self.turn_radius * end_angle.sin(),
                    );
                    heading = normalize_angle(heading + arc_angle);
                }
            }
        }

        waypoints.push(self.end.position);
        waypoints
    }
}

impl fmt::Display for DubinsPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} path of {:.1} m from {} to {} (r = {:.1} m)",
            self.kind,
            self.total_length(),
            self.start,
            self.end,
            self.turn_radius
        )
    }
}

/// Closed-form segment triple `(t, p, q)` for one family, in units of the
/// turn radius, or `None` when the family is infeasible for this geometry.
fn segment_lengths(d: f64, alpha: f64, beta: f64, kind: DubinsKind) -> Option<(f64, f64, f64)> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let cab = (alpha - beta).cos();

    let (t, p, q) = match kind {
        DubinsKind::LSL => {
            let tmp = 2.0 + d * d - 2.0 * cab + 2.0 * d * (sa - sb);
            if tmp < 0.0 {
                return None;
            }
            let p = tmp.sqrt();
            let theta = (cb - ca).atan2(d + sa - sb);
            (normalize_angle(-alpha + theta), p, normalize_angle(beta - theta))
        }
        DubinsKind::RSR => {
            let tmp = 2.0 + d * d - 2.0 * cab + 2.0 * d * (sb - sa);
            if tmp < 0.0 {
                return None;
            }
            let p = tmp.sqrt();
            let theta = (ca - cb).atan2(d - sa + sb);
            (normalize_angle(alpha - theta), p, normalize_angle(-beta + theta))
        }
        DubinsKind::LSR => {
            let tmp = -2.0 + d * d + 2.0 * cab + 2.0 * d * (sa + sb);
            if tmp < 0.0 {
                return None;
            }
            let p = tmp.sqrt();
            let theta = (-ca - cb).atan2(d + sa + sb) - (-2.0f64).atan2(p);
            (normalize_angle(-alpha + theta), p, normalize_angle(-beta + theta))
        }
        DubinsKind::RSL => {
            let tmp = -2.0 + d * d + 2.0 * cab - 2.0 * d * (sa + sb);
            if tmp < 0.0 {
                return None;
            }
            let p = tmp.sqrt();
            let theta = (ca + cb).atan2(d - sa - sb) - 2.0f64.atan2(p);
            (normalize_angle(alpha - theta), p, normalize_angle(beta - theta))
        }
        DubinsKind::RLR => {
            let tmp = (6.0 - d * d + 2.0 * cab + 2.0 * d * (sa - sb)) / 8.0;
            if tmp.abs() > 1.0 {
                return None;
            }
            let p = TAU - tmp.acos();
            let theta = (ca - cb).atan2(d - sa + sb);
            let t = normalize_angle(alpha - theta + p / 2.0);
            (t, p, normalize_angle(alpha - beta - t + p))
        }
        DubinsKind::LRL => {
            let tmp = (6.0 - d * d + 2.0 * cab + 2.0 * d * (sb - sa)) / 8.0;
            if tmp.abs() > 1.0 {
                return None;
            }
            let p = TAU - tmp.acos();
            let theta = (ca - cb).atan2(d + sa - sb);
            let t = normalize_angle(-alpha + theta + p / 2.0);
            (t, p, normalize_angle(beta - alpha - t + p))
        }
    };

    // Turn lengths are swept forward, so fold negatives into [0, 2π)
    let t = if t < 0.0 { t + TAU } else { t };
    let q = if q < 0.0 { q + TAU } else { q };

    Some((t, p, q))
}
