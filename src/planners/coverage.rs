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

//! Loiter-first coverage planning: greedy weighted set cover.
//!
//! Instead of a lawnmower sweep, the planner places loiter circles that
//! maximize newly covered free cells per unit energy. The transit term in
//! the score is a straight-line surrogate on purpose: the Dubins family
//! flown for a transition is unknown until the tour is fixed, so the score
//! must not depend on it.

use std::collections::BTreeSet;
use std::fmt;

use crate::dubins::DubinsPath;
use crate::geometry::Point;
use crate::loiter::{Loiter, LoiterKind};
use crate::sector::SurveillanceMap;
use crate::ShrikeError;

/// A transition between consecutive loiters: a Dubins path when one
/// validates against the sector, otherwise a safe poly-line corridor.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    Dubins(DubinsPath),
    Corridor(Vec<Point>),
}

impl Transition {
    /// Transition length in meters. Corridors accumulate their segment
    /// lengths.
    pub fn length(&self) -> f64 {
        match self {
            Self::Dubins(path) => path.total_length(),
            Self::Corridor(points) => points
                .windows(2)
                .map(|pair| pair[0].distance_to(&pair[1]))
                .sum(),
        }
    }

    /// Waypoints along the transition, sampling Dubins paths every `step`
    /// meters.
    pub fn waypoints(&self, step: f64) -> Vec<Point> {
        match self {
            Self::Dubins(path) => path.sample(step),
            Self::Corridor(points) => points.clone(),
        }
    }
}

/// An ordered sequence of loiters with one transition between each pair.
#[derive(Clone, Debug, Default)]
pub struct MissionPath {
    pub loiters: Vec<Loiter>,
    pub transitions: Vec<Transition>,
}

impl MissionPath {
    /// Distance flown inside loiter patterns, meters.
    pub fn total_loiter_distance(&self) -> f64 {
        self.loiters.iter().map(Loiter::total_distance).sum()
    }

    /// Distance flown between loiters, meters.
    pub fn total_transition_distance(&self) -> f64 {
        self.transitions.iter().map(Transition::length).sum()
    }

    pub fn total_distance(&self) -> f64 {
        self.total_loiter_distance() + self.total_transition_distance()
    }

    /// Energy surrogate: loiter costs plus transitions at a 0.9 weight
    /// (transits are flown cleaner than banked orbits).
    pub fn total_energy(&self) -> f64 {
        let loiter_energy: f64 = self.loiters.iter().map(Loiter::energy_cost).sum();
        loiter_energy + self.total_transition_distance() * 0.9
    }

    /// Footprint area over all loiters, m².
    pub fn coverage_area(&self) -> f64 {
        self.loiters.iter().map(Loiter::coverage_area).sum()
    }

    /// Every waypoint of the mission in flight order.
    pub fn all_waypoints(&self, points_per_rev: usize, transition_step: f64) -> Vec<Point> {
        let mut waypoints = Vec::new();
        for (i, loiter) in self.loiters.iter().enumerate() {
            if i > 0 {
                if let Some(transition) = self.transitions.get(i - 1) {
                    waypoints.extend(transition.waypoints(transition_step));
                }
            }
            waypoints.extend(loiter.waypoints(points_per_rev));
        }
        waypoints
    }
}

impl fmt::Display for MissionPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Mission of {} loiters, {:.0} m total ({:.0} m loiter / {:.0} m transit)",
            self.loiters.len(),
            self.total_distance(),
            self.total_loiter_distance(),
            self.total_transition_distance()
        )
    }
}

/// Parameters of the greedy coverage planner.
#[derive(Copy, Clone, Debug)]
pub struct CoverageConfig {
    pub loiter_kind: LoiterKind,
    /// Loiter radius, m.
    pub loiter_radius: f64,
    /// Revolutions flown per station.
    pub revolutions: f64,
    /// Fraction of overlap between adjacent loiters, in `[0, 1)`.
    pub overlap_factor: f64,
    /// Target coverage percentage, in `[0, 100]`.
    pub coverage_threshold: f64,
    pub max_loiters: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            loiter_kind: LoiterKind::Standard,
            loiter_radius: 150.0,
            revolutions: 1.0,
            overlap_factor: 0.3,
            coverage_threshold: 95.0,
            max_loiters: 100,
        }
    }
}

impl CoverageConfig {
    pub fn validate(&self) -> Result<(), ShrikeError> {
        if self.loiter_radius <= 0.0 {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "loiter radius must be positive, got {}",
                self.loiter_radius
            )));
        }
        if !(0.0..1.0).contains(&self.overlap_factor) {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "overlap factor must be in [0, 1), got {}",
                self.overlap_factor
            )));
        }
        if !(0.0..=100.0).contains(&self.coverage_threshold) {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "coverage threshold must be in [0, 100], got {}",
                self.coverage_threshold
            )));
        }
        if self.max_loiters == 0 {
            return Err(ShrikeError::InvalidConfiguration(
                "max loiter count must be at least 1".to_string(),
            ));
        }
        if self.revolutions <= 0.0 {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "revolutions must be positive, got {}",
                self.revolutions
            )));
        }
        Ok(())
    }
}

/// Result of a coverage planning run. A shortfall against the threshold is
/// not an error; the achieved percentage is always attached.
#[derive(Clone, Debug)]
pub struct CoverageOutcome {
    pub loiters: Vec<Loiter>,
    pub coverage_pct: f64,
    pub covered_cells: usize,
    pub total_free_cells: usize,
}

/// Greedy set-cover planner over a sector's free cells.
///
/// The planner owns the sector's coverage grid for the duration of a run;
/// replanning over the same sector requires an explicit
/// [`SurveillanceMap::reset_coverage`].
pub struct CoveragePlanner<'a> {
    map: &'a mut SurveillanceMap,
    config: CoverageConfig,
}

impl<'a> CoveragePlanner<'a> {
    pub fn new(map: &'a mut SurveillanceMap, config: CoverageConfig) -> Result<Self, ShrikeError> {
        config.validate()?;
        Ok(Self { map, config })
    }

    /// Run the greedy selection from `start_position` (the sector home when
    /// `None`).
    ///
    /// Each iteration scores every valid candidate center by newly covered
    /// cells per unit cost and keeps the best; the loop ends at the coverage
    /// threshold, the loiter cap, or when no candidate still covers anything.
    pub fn plan(&mut self, start_position: Option<Point>) -> CoverageOutcome {
        let start = start_position.unwrap_or(self.map.start_position);

        let mut uncovered: BTreeSet<(usize, usize)> =
            self.map.uncovered_cells().into_iter().collect();
        let total_free_cells = uncovered.len();

        let mut outcome = CoverageOutcome {
            loiters: Vec::new(),
            coverage_pct: 100.0,
            covered_cells: 0,
            total_free_cells,
        };
        if total_free_cells == 0 {
            return outcome;
        }
        outcome.coverage_pct = 0.0;

        let mut current_pos = start;

        while outcome.loiters.len() < self.config.max_loiters {
            let best = self.find_best_loiter(&current_pos, &uncovered);

            let Some(loiter) = best else {
                break;
            };

            let newly_covered = self.mark_loiter_coverage(&loiter, &mut uncovered);
            outcome.covered_cells += newly_covered;
            outcome.coverage_pct = 100.0 * outcome.covered_cells as f64 / total_free_cells as f64;

            current_pos = loiter.exit_point();

            debug!(
                "loiter {} selected: {} (+{} cells, {:.1}% covered)",
                outcome.loiters.len() + 1,
                loiter,
                newly_covered,
                outcome.coverage_pct
            );

            outcome.loiters.push(loiter);

            if outcome.coverage_pct >= self.config.coverage_threshold {
                break;
            }
        }

        if outcome.coverage_pct < self.config.coverage_threshold {
            warn!(
                "coverage target missed: {:.1}% of {:.1}% with {} loiters",
                outcome.coverage_pct,
                self.config.coverage_threshold,
                outcome.loiters.len()
            );
        } else {
            info!(
                "coverage target reached: {:.1}% with {} loiters",
                outcome.coverage_pct,
                outcome.loiters.len()
            );
        }

        outcome
    }

    /// Best candidate by score = newly covered cells / (straight-line
    /// transit + loiter energy). Ties break on lower cost, then on the
    /// lexicographically smaller center, so runs are reproducible.
    fn find_best_loiter(
        &self,
        current_pos: &Point,
        uncovered: &BTreeSet<(usize, usize)>,
    ) -> Option<Loiter> {
        let mut best: Option<(Loiter, f64, f64)> = None;

        for center in self.generate_candidates(uncovered) {
            if !self.is_valid_position(&center) {
                continue;
            }

            let covered = self.estimate_coverage(&center, uncovered);
            if covered == 0 {
                continue;
            }

            let mut loiter = Loiter::new(
                center,
                self.config.loiter_radius,
                self.config.loiter_kind,
                current_pos.heading_to(&center),
            );
            loiter.revolutions = self.config.revolutions;

            let transition_cost = current_pos.distance_to(&center);
            let total_cost = transition_cost + loiter.energy_cost();
            let score = covered as f64 / total_cost;

            let replace = match &best {
                None => true,
                Some((best_loiter, best_score, best_cost)) => {
                    score > *best_score
                        || (score == *best_score
                            && (total_cost < *best_cost
                                || (total_cost == *best_cost
                                    && (center.x, center.y)
                                        < (best_loiter.center.x, best_loiter.center.y))))
                }
            };
            if replace {
                best = Some((loiter, score, total_cost));
            }
        }

        best.map(|(loiter, _, _)| loiter)
    }

    /// Candidate centers: a regular grid over the uncovered bounding box,
    /// plus up to 50 cell centers stride-sampled from the uncovered set once
    /// it is small enough to chase isolated pockets.
    fn generate_candidates(&self, uncovered: &BTreeSet<(usize, usize)>) -> Vec<Point> {
        let mut candidates = Vec::new();
        if uncovered.is_empty() {
            return candidates;
        }

        let spacing = self.config.loiter_radius * (2.0 - self.config.overlap_factor);
        let resolution = self.map.resolution;

        let min_x = uncovered.iter().map(|c| c.0).min().unwrap_or(0) as f64 * resolution;
        let max_x = uncovered.iter().map(|c| c.0).max().unwrap_or(0) as f64 * resolution;
        let min_y = uncovered.iter().map(|c| c.1).min().unwrap_or(0) as f64 * resolution;
        let max_y = uncovered.iter().map(|c| c.1).max().unwrap_or(0) as f64 * resolution;

        // Start half a radius inside the box so the edge cells stay reachable
        let mut x = min_x + self.config.loiter_radius / 2.0;
        while x < max_x {
            let mut y = min_y + self.config.loiter_radius / 2.0;
            while y < max_y {
                candidates.push(Point::new(x, y));
                y += spacing;
            }
            x += spacing;
        }

        if uncovered.len() < 1000 {
            let stride = (uncovered.len() / 50).max(1);
            for cell in uncovered.iter().step_by(stride).take(50) {
                candidates.push(self.map.cell_center(cell.0, cell.1));
            }
        }

        candidates
    }

    /// A loiter may sit here only in-bounds and with its full radius plus
    /// the applicable margin clear of every obstacle.
    fn is_valid_position(&self, center: &Point) -> bool {
        if center.x < 0.0 || center.x > self.map.width || center.y < 0.0 || center.y > self.map.height
        {
            return false;
        }

        for obstacle in self.map.obstacles() {
            let margin = if obstacle.is_no_fly {
                self.map.no_fly_margin
            } else {
                self.map.obstacle_margin
            };
            let min_distance = obstacle.radius + self.config.loiter_radius + margin;
            if center.distance_to(&obstacle.center) < min_distance {
                return false;
            }
        }

        true
    }

    /// Number of still-uncovered cells whose center lies within the loiter
    /// radius of `center`.
    fn estimate_coverage(&self, center: &Point, uncovered: &BTreeSet<(usize, usize)>) -> usize {
        let radius = self.config.loiter_radius;
        let resolution = self.map.resolution;

        let min_ix = ((center.x - radius) / resolution).floor().max(0.0) as usize;
        let min_iy = ((center.y - radius) / resolution).floor().max(0.0) as usize;
        let max_ix = ((((center.x + radius) / resolution) as usize) + 1).min(self.map.grid_width());
        let max_iy = ((((center.y + radius) / resolution) as usize) + 1).min(self.map.grid_height());

        let mut count = 0;
        for ix in min_ix..max_ix {
            for iy in min_iy..max_iy {
                if uncovered.contains(&(ix, iy))
                    && self.map.cell_center(ix, iy).distance_to(center) <= radius
                {
                    count += 1;
                }
            }
        }
        count
    }

    /// Remove the loiter's cells from the uncovered set and stamp the
    /// sector's coverage grid. Returns the count of newly covered cells.
    fn mark_loiter_coverage(
        &mut self,
        loiter: &Loiter,
        uncovered: &mut BTreeSet<(usize, usize)>,
    ) -> usize {
        let radius = loiter.radius;
        let resolution = self.map.resolution;

        let min_ix = ((loiter.center.x - radius) / resolution).floor().max(0.0) as usize;
        let min_iy = ((loiter.center.y - radius) / resolution).floor().max(0.0) as usize;
        let max_ix =
            ((((loiter.center.x + radius) / resolution) as usize) + 1).min(self.map.grid_width());
        let max_iy =
            ((((loiter.center.y + radius) / resolution) as usize) + 1).min(self.map.grid_height());

        let mut newly_covered = 0;
        for ix in min_ix..max_ix {
            for iy in min_iy..max_iy {
                if uncovered.contains(&(ix, iy))
                    && self.map.cell_center(ix, iy).distance_to(&loiter.center) <= radius
                {
                    uncovered.remove(&(ix, iy));
                    newly_covered += 1;
                }
            }
        }

        self.map.mark_covered(&loiter.center, radius, 1.0);
        newly_covered
    }
}
