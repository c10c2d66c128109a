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

//! Reactive edge-following avoidance for en-route surprises.
//!
//! A fan of rays is cast ahead of the aircraft against the sector grid.
//! When one hits, the controller follows the obstacle's edge, keeping it on
//! a fixed side, and resumes the direct heading once the path to the target
//! clears.

use crate::geometry::{normalize_angle, Point};
use crate::sector::SurveillanceMap;

/// Raycasting obstacle detector over the sector grid.
pub struct ObstacleDetector<'a> {
    map: &'a SurveillanceMap,
    /// How far ahead to look, m.
    pub detection_range: f64,
    /// Detection fan width, degrees.
    pub detection_angle_deg: f64,
    /// Rays spread across the fan.
    pub num_rays: usize,
    /// Minimum standoff to keep, m.
    pub safety_margin: f64,
}

/// What a detection sweep saw ahead.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f64,
    pub point: Point,
}

impl<'a> ObstacleDetector<'a> {
    pub fn new(map: &'a SurveillanceMap) -> Self {
        Self {
            map,
            detection_range: 80.0,
            detection_angle_deg: 60.0,
            num_rays: 7,
            safety_margin: 30.0,
        }
    }

    /// Cast the ray fan ahead and report the closest hit within range.
    pub fn detect_ahead(&self, position: &Point, heading: f64) -> Option<RayHit> {
        let half_angle = (self.detection_angle_deg / 2.0).to_radians();

        let mut closest: Option<RayHit> = None;
        for i in 0..self.num_rays {
            let ray_angle = heading - half_angle
                + 2.0 * half_angle * i as f64 / (self.num_rays - 1) as f64;

            if let Some(hit) = self.cast_ray(position, ray_angle) {
                if closest.map_or(true, |c| hit.distance < c.distance) {
                    closest = Some(hit);
                }
            }
        }

        closest.filter(|hit| hit.distance < self.detection_range)
    }

    /// March a single ray one cell at a time until it leaves safe airspace.
    fn cast_ray(&self, origin: &Point, angle: f64) -> Option<RayHit> {
        let step_size = self.map.resolution;
        let max_steps = (self.detection_range / step_size) as usize;
        let (dy, dx) = angle.sin_cos();

        for step in 1..=max_steps {
            let distance = step as f64 * step_size;
            let probe = Point::new(origin.x + distance * dx, origin.y + distance * dy);
            if !self.map.is_point_safe(&probe, false) {
                return Some(RayHit {
                    distance,
                    point: probe,
                });
            }
        }

        None
    }

    /// Scan alternating sides for the nearest heading with a clear ray.
    pub fn clear_direction(
        &self,
        position: &Point,
        current_heading: f64,
        prefer_right: bool,
    ) -> Option<f64> {
        for delta_deg in (10..180).step_by(10) {
            let delta = (delta_deg as f64).to_radians();
            let candidates = if prefer_right {
                [current_heading - delta, current_heading + delta]
            } else {
                [current_heading + delta, current_heading - delta]
            };

            for angle in candidates {
                let clear = match self.cast_ray(position, angle) {
                    None => true,
                    Some(hit) => hit.distance > self.detection_range * 0.8,
                };
                if clear {
                    return Some(normalize_angle(angle));
                }
            }
        }

        None
    }

    /// Heading that runs parallel to the obstacle edge, keeping the
    /// obstacle on the chosen side.
    pub fn edge_following_direction(
        &self,
        position: &Point,
        obstacle_point: &Point,
        follow_right: bool,
    ) -> f64 {
        let to_obstacle = (obstacle_point.y - position.y).atan2(obstacle_point.x - position.x);
        let edge_heading = if follow_right {
            to_obstacle + std::f64::consts::FRAC_PI_2
        } else {
            to_obstacle - std::f64::consts::FRAC_PI_2
        };
        normalize_angle(edge_heading)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AvoidanceState {
    /// Flying direct to the target.
    Normal,
    /// Following an obstacle edge.
    Avoiding,
}

/// Bug-style reactive avoidance: head for the goal, follow edges around
/// whatever gets in the way, and rejoin the direct path once clear.
pub struct ReactiveAvoidance<'a> {
    detector: ObstacleDetector<'a>,
    state: AvoidanceState,
    follow_right: bool,
    avoidance_start: Option<Point>,
    /// Distance to put behind us before probing for a clear resume, m.
    pub min_avoidance_distance: f64,
}

impl<'a> ReactiveAvoidance<'a> {
    pub fn new(detector: ObstacleDetector<'a>) -> Self {
        Self {
            detector,
            state: AvoidanceState::Normal,
            follow_right: true,
            avoidance_start: None,
            min_avoidance_distance: 50.0,
        }
    }

    /// Heading adjusted for obstacle avoidance, and whether the controller
    /// is currently deviating from the direct path.
    pub fn adjusted_heading(
        &mut self,
        position: &Point,
        current_heading: f64,
        target: &Point,
    ) -> (f64, bool) {
        let target_heading = position.heading_to(target);
        let ahead = self.detector.detect_ahead(position, current_heading);

        match self.state {
            AvoidanceState::Normal => match ahead {
                Some(hit) if hit.distance < self.detector.safety_margin * 2.0 => {
                    self.state = AvoidanceState::Avoiding;
                    self.avoidance_start = Some(*position);
                    // Round the obstacle on the side closer to the target
                    self.follow_right = normalize_angle(target_heading - current_heading) < 0.0;

                    debug!(
                        "obstacle {:.0} m ahead at {}, following edge to the {}",
                        hit.distance,
                        hit.point,
                        if self.follow_right { "right" } else { "left" }
                    );

                    (
                        self.detector
                            .edge_following_direction(position, &hit.point, self.follow_right),
                        true,
                    )
                }
                _ => (target_heading, false),
            },
            AvoidanceState::Avoiding => {
                let dist_from_start = self
                    .avoidance_start
                    .map_or(0.0, |start| position.distance_to(&start));

                if dist_from_start > self.min_avoidance_distance {
                    let toward_target = self.detector.detect_ahead(position, target_heading);
                    let resume = match toward_target {
                        None => true,
                        Some(hit) => hit.distance > self.detector.detection_range * 0.9,
                    };
                    if resume {
                        self.reset();
                        return (target_heading, false);
                    }
                }

                let heading = match ahead {
                    Some(hit) => self.detector.edge_following_direction(
                        position,
                        &hit.point,
                        self.follow_right,
                    ),
                    // Lost the edge: curve back toward the target side
                    None => {
                        let curve = 30.0f64.to_radians();
                        if self.follow_right {
                            normalize_angle(current_heading + curve)
                        } else {
                            normalize_angle(current_heading - curve)
                        }
                    }
                };
                (heading, true)
            }
        }
    }

    /// Forget any avoidance in progress.
    pub fn reset(&mut self) {
        self.state = AvoidanceState::Normal;
        self.avoidance_start = None;
    }
}
