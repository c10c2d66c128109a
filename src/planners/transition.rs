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

//! Smooth transitions between loiters and the tour over them.
//!
//! Every pair of consecutive loiters is connected exit pose → entry pose by
//! the shortest Dubins path that samples clear of obstacles; failing that,
//! the entry heading is swept over four offsets, and as a last resort the
//! grid pathfinder supplies a safe poly-line corridor.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::dubins::DubinsPath;
use crate::geometry::{normalize_angle, Point, Pose};
use crate::loiter::Loiter;
use crate::pathfinder::Pathfinder;
use crate::planners::coverage::{MissionPath, Transition};
use crate::sector::SurveillanceMap;
use crate::ShrikeError;

/// Entry heading offsets tried when the direct Dubins connection is unsafe.
const ENTRY_SWEEP: [f64; 4] = [FRAC_PI_4, -FRAC_PI_4, FRAC_PI_2, -FRAC_PI_2];

/// Sampling step for validating Dubins waypoints against the sector, m.
const VALIDATION_STEP: f64 = 5.0;

pub struct TransitionPlanner<'a> {
    map: &'a SurveillanceMap,
    turn_radius: f64,
    /// Inflation radius handed to the fallback pathfinder, in cells.
    safety_cells: usize,
}

impl<'a> TransitionPlanner<'a> {
    pub fn new(
        map: &'a SurveillanceMap,
        turn_radius: f64,
        safety_cells: usize,
    ) -> Result<Self, ShrikeError> {
        if turn_radius <= 0.0 {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "turn radius must be positive, got {turn_radius}"
            )));
        }
        Ok(Self {
            map,
            turn_radius,
            safety_cells,
        })
    }

    /// Plan the transition from one loiter's exit to the next one's entry.
    pub fn plan_transition(&self, from: &Loiter, to: &Loiter) -> Transition {
        let exit_pose = Pose::new(from.exit_point(), from.exit_heading());

        // Direct connection, then the entry heading sweep
        let entry_pose = Pose::new(to.entry_point(), to.entry_tangent());
        if let Some(path) = self.safe_dubins(exit_pose, entry_pose) {
            return Transition::Dubins(path);
        }

        for offset in ENTRY_SWEEP {
            let entry_angle = normalize_angle(to.entry_heading + offset);
            let entry_point = Point::new(
                to.center.x + to.radius * entry_angle.cos(),
                to.center.y + to.radius * entry_angle.sin(),
            );
            let mut adjusted = to.clone();
            adjusted.entry_heading = entry_angle;
            let entry_pose = Pose::new(entry_point, adjusted.entry_tangent());

            if let Some(path) = self.safe_dubins(exit_pose, entry_pose) {
                return Transition::Dubins(path);
            }
        }

        debug!(
            "no safe Dubins connection from {} to {}, falling back to grid corridor",
            from, to
        );

        let pathfinder = Pathfinder::new(self.map, self.safety_cells);
        Transition::Corridor(pathfinder.find_path(from.exit_point(), to.entry_point()))
    }

    /// Plan the return leg from the final loiter back to base.
    pub fn plan_return_to_base(
        &self,
        final_loiter: &Loiter,
        base_position: Point,
        base_heading: f64,
    ) -> Transition {
        let exit_pose = Pose::new(final_loiter.exit_point(), final_loiter.exit_heading());
        let base_pose = Pose::new(base_position, base_heading);

        if let Some(path) = self.safe_dubins(exit_pose, base_pose) {
            return Transition::Dubins(path);
        }

        let pathfinder = Pathfinder::new(self.map, self.safety_cells);
        Transition::Corridor(pathfinder.find_path(final_loiter.exit_point(), base_position))
    }

    /// Nearest-neighbor tour over the loiters, first loiter fixed.
    ///
    /// Returns the reordered sequence and the sum of straight-line exit →
    /// center surrogates. The heuristic is knowingly suboptimal; it only has
    /// to give the Dubins and energy passes a reasonable order. Distance
    /// ties keep the earlier input.
    pub fn sequence(&self, loiters: &[Loiter]) -> (Vec<Loiter>, f64) {
        if loiters.len() <= 2 {
            let total = self.straight_line_total(loiters);
            return (loiters.to_vec(), total);
        }

        let mut ordered: Vec<Loiter> = vec![loiters[0].clone()];
        let mut remaining: Vec<Loiter> = loiters[1..].to_vec();

        while !remaining.is_empty() {
            let exit_point = ordered[ordered.len() - 1].exit_point();

            let mut best_idx = 0;
            let mut best_dist = f64::INFINITY;
            for (i, loiter) in remaining.iter().enumerate() {
                let dist = exit_point.distance_to(&loiter.center);
                if dist < best_dist {
                    best_dist = dist;
                    best_idx = i;
                }
            }

            ordered.push(remaining.remove(best_idx));
        }

        let total = self.straight_line_total(&ordered);
        info!(
            "tour fixed over {} loiters, {:.0} m straight-line transit",
            ordered.len(),
            total
        );

        (ordered, total)
    }

    /// Sequence the loiters and plan one validated transition per
    /// consecutive pair.
    pub fn link(&self, loiters: Vec<Loiter>) -> MissionPath {
        let (ordered, _) = self.sequence(&loiters);

        let transitions = ordered
            .windows(2)
            .map(|pair| self.plan_transition(&pair[0], &pair[1]))
            .collect();

        MissionPath {
            loiters: ordered,
            transitions,
        }
    }

    /// Shortest Dubins connection whose sampled waypoints are all safe, if
    /// one exists.
    fn safe_dubins(&self, from: Pose, to: Pose) -> Option<DubinsPath> {
        let path = DubinsPath::shortest(from, to, self.turn_radius).ok()?;
        if self.validate(&path) {
            Some(path)
        } else {
            None
        }
    }

    fn validate(&self, path: &DubinsPath) -> bool {
        path.sample(VALIDATION_STEP)
            .iter()
            .all(|waypoint| self.map.is_point_safe(waypoint, false))
    }

    fn straight_line_total(&self, loiters: &[Loiter]) -> f64 {
        loiters
            .windows(2)
            .map(|pair| pair[0].exit_point().distance_to(&pair[1].entry_point()))
            .sum()
    }
}
