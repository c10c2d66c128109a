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

//! Grid-based sector representation: obstacles, no-fly zones and coverage
//! tracking.
//!
//! The sector is an axis-aligned rectangle `[0,W] × [0,H]` discretized into
//! square cells. Two parallel grids of identical shape are kept: the cell
//! kind and a `[0,1]` coverage value. Row 0 is `y = 0` (south).

pub mod lac;
pub mod random;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::ShrikeError;

/// Kind of a sector cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Safe to fly and survey.
    Free,
    /// Physical obstacle (building, peak, tower).
    Obstacle,
    /// Restricted airspace, hard keep-out.
    NoFly,
    /// Discouraged band around obstacles and no-fly zones.
    SoftNoFly,
    /// Already surveyed.
    Covered,
    /// Home cell. Never overwritten by rasterization.
    Start,
}

impl CellKind {
    /// Rasterization precedence: NO_FLY > OBSTACLE > SOFT_NO_FLY > FREE.
    /// A cell kind never downgrades when a second obstacle lands on it.
    fn severity(self) -> u8 {
        match self {
            Self::Free | Self::Covered => 0,
            Self::SoftNoFly => 1,
            Self::Obstacle => 2,
            Self::NoFly => 3,
            Self::Start => u8::MAX,
        }
    }
}

/// A circular obstacle or no-fly zone. Immutable once inserted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Point,
    pub radius: f64,
    /// True for restricted airspace, false for a physical obstacle.
    pub is_no_fly: bool,
    /// Soft no-fly zones are discouraged but not forbidden.
    pub is_soft: bool,
    pub name: String,
}

impl Obstacle {
    pub fn new(center: Point, radius: f64, is_no_fly: bool, name: &str) -> Self {
        Self {
            center,
            radius,
            is_no_fly,
            is_soft: false,
            name: name.to_string(),
        }
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.distance_to(&self.center) <= self.radius
    }

    fn cell_kind(&self) -> CellKind {
        if self.is_no_fly {
            if self.is_soft {
                CellKind::SoftNoFly
            } else {
                CellKind::NoFly
            }
        } else {
            CellKind::Obstacle
        }
    }
}

/// Grid-based surveillance sector.
#[derive(Clone, Debug)]
pub struct SurveillanceMap {
    /// Sector width, m.
    pub width: f64,
    /// Sector height, m.
    pub height: f64,
    /// Cell side, m.
    pub resolution: f64,
    /// Safety band around physical obstacles, m.
    pub obstacle_margin: f64,
    /// Safety band around no-fly zones, m.
    pub no_fly_margin: f64,
    pub start_position: Point,
    grid_width: usize,
    grid_height: usize,
    kind: Vec<CellKind>,
    coverage: Vec<f32>,
    obstacles: Vec<Obstacle>,
}

impl SurveillanceMap {
    /// Build an empty sector. The home cell is marked START.
    pub fn new(
        width: f64,
        height: f64,
        resolution: f64,
        start_position: Point,
        obstacle_margin: f64,
        no_fly_margin: f64,
    ) -> Result<Self, ShrikeError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "sector dimensions must be positive, got {width} x {height}"
            )));
        }
        if resolution <= 0.0 {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "resolution must be positive, got {resolution}"
            )));
        }
        if obstacle_margin < 0.0 || no_fly_margin < 0.0 {
            return Err(ShrikeError::InvalidConfiguration(
                "safety margins may not be negative".to_string(),
            ));
        }

        let grid_width = (width / resolution).ceil() as usize;
        let grid_height = (height / resolution).ceil() as usize;

        let mut me = Self {
            width,
            height,
            resolution,
            obstacle_margin,
            no_fly_margin,
            start_position,
            grid_width,
            grid_height,
            kind: vec![CellKind::Free; grid_width * grid_height],
            coverage: vec![0.0; grid_width * grid_height],
            obstacles: Vec::new(),
        };

        if let Some((ix, iy)) = me.point_to_cell(&start_position) {
            me.kind[iy * grid_width + ix] = CellKind::Start;
        }

        Ok(me)
    }

    pub fn grid_width(&self) -> usize {
        self.grid_width
    }

    pub fn grid_height(&self) -> usize {
        self.grid_height
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Grid cell containing `point`, or `None` when out of bounds.
    pub fn point_to_cell(&self, point: &Point) -> Option<(usize, usize)> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let ix = (point.x / self.resolution).floor() as usize;
        let iy = (point.y / self.resolution).floor() as usize;
        if ix < self.grid_width && iy < self.grid_height {
            Some((ix, iy))
        } else {
            None
        }
    }

    /// World coordinates of a cell's center.
    pub fn cell_center(&self, ix: usize, iy: usize) -> Point {
        Point::new(
            (ix as f64 + 0.5) * self.resolution,
            (iy as f64 + 0.5) * self.resolution,
        )
    }

    pub fn kind_at(&self, ix: usize, iy: usize) -> CellKind {
        self.kind[iy * self.grid_width + ix]
    }

    pub fn coverage_at(&self, ix: usize, iy: usize) -> f32 {
        self.coverage[iy * self.grid_width + ix]
    }

    /// Insert an obstacle and rasterize it onto the kind grid.
    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.rasterize(&obstacle);
        self.obstacles.push(obstacle);
    }

    /// Cells strictly inside the obstacle radius take its hard kind; the
    /// annulus `[r, r + margin]` becomes SOFT_NO_FLY over free cells.
    fn rasterize(&mut self, obstacle: &Obstacle) {
        let margin = if obstacle.is_no_fly {
            self.no_fly_margin
        } else {
            self.obstacle_margin
        };
        let hard_kind = obstacle.cell_kind();
        let total_radius = obstacle.radius + margin;

        let min_ix = (((obstacle.center.x - total_radius) / self.resolution).floor()).max(0.0) as usize;
        let min_iy = (((obstacle.center.y - total_radius) / self.resolution).floor()).max(0.0) as usize;
        let max_ix = ((((obstacle.center.x + total_radius) / self.resolution) as usize) + 1)
            .min(self.grid_width);
        let max_iy = ((((obstacle.center.y + total_radius) / self.resolution) as usize) + 1)
            .min(self.grid_height);

        for iy in min_iy..max_iy {
            for ix in min_ix..max_ix {
                let dist = self.cell_center(ix, iy).distance_to(&obstacle.center);
                let cell = &mut self.kind[iy * self.grid_width + ix];

                if dist <= obstacle.radius {
                    if hard_kind.severity() > cell.severity() {
                        *cell = hard_kind;
                    }
                } else if dist <= total_radius && *cell == CellKind::Free {
                    *cell = CellKind::SoftNoFly;
                }
            }
        }
    }

    /// Whether a point is safe to fly through. Out-of-bounds points are not.
    pub fn is_point_safe(&self, point: &Point, include_soft: bool) -> bool {
        match self.point_to_cell(point) {
            None => false,
            Some((ix, iy)) => match self.kind_at(ix, iy) {
                CellKind::Obstacle | CellKind::NoFly => false,
                CellKind::SoftNoFly => !include_soft,
                _ => true,
            },
        }
    }

    /// Whether the straight segment `[start, end]` is safe, sampled every
    /// `step` meters (half a cell by default). Short-circuits on the first
    /// unsafe sample.
    pub fn is_segment_safe(
        &self,
        start: &Point,
        end: &Point,
        include_soft: bool,
        step: Option<f64>,
    ) -> bool {
        let step = step.unwrap_or(self.resolution / 2.0);
        let dist = start.distance_to(end);
        if dist == 0.0 {
            return self.is_point_safe(start, include_soft);
        }

        let steps = (dist / step).ceil() as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let sample = Point::new(
                start.x + t * (end.x - start.x),
                start.y + t * (end.y - start.y),
            );
            if !self.is_point_safe(&sample, include_soft) {
                return false;
            }
        }
        true
    }

    /// Mark a disk as surveyed. Coverage combines by `max`, never additively.
    ///
    /// Returns the number of free cells whose coverage crossed the 0.5
    /// threshold on this call.
    pub fn mark_covered(&mut self, center: &Point, radius: f64, coverage_value: f32) -> usize {
        let mut newly_covered = 0;

        let min_ix = (((center.x - radius) / self.resolution).floor()).max(0.0) as usize;
        let min_iy = (((center.y - radius) / self.resolution).floor()).max(0.0) as usize;
        let max_ix = ((((center.x + radius) / self.resolution) as usize) + 1).min(self.grid_width);
        let max_iy = ((((center.y + radius) / self.resolution) as usize) + 1).min(self.grid_height);

        for iy in min_iy..max_iy {
            for ix in min_ix..max_ix {
                if self.cell_center(ix, iy).distance_to(center) <= radius
                    && self.kind_at(ix, iy) == CellKind::Free
                {
                    let cell = &mut self.coverage[iy * self.grid_width + ix];
                    let old = *cell;
                    *cell = old.max(coverage_value);
                    if old < 0.5 && *cell >= 0.5 {
                        newly_covered += 1;
                    }
                }
            }
        }

        newly_covered
    }

    /// Percentage of free cells with coverage ≥ 0.5. A sector with no free
    /// cells is fully covered.
    pub fn coverage_percentage(&self) -> f64 {
        let mut free = 0usize;
        let mut covered = 0usize;
        for (kind, coverage) in self.kind.iter().zip(&self.coverage) {
            if *kind == CellKind::Free {
                free += 1;
                if *coverage >= 0.5 {
                    covered += 1;
                }
            }
        }
        if free == 0 {
            100.0
        } else {
            100.0 * covered as f64 / free as f64
        }
    }

    /// Free cells with coverage below 0.5, in lexicographic (ix, iy) order.
    pub fn uncovered_cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for ix in 0..self.grid_width {
            for iy in 0..self.grid_height {
                if self.kind_at(ix, iy) == CellKind::Free && self.coverage_at(ix, iy) < 0.5 {
                    cells.push((ix, iy));
                }
            }
        }
        cells
    }

    /// Clear the coverage grid for a replan. The kind grid is untouched.
    pub fn reset_coverage(&mut self) {
        self.coverage.fill(0.0);
    }

    /// The first inserted obstacle containing `point`, if any.
    pub fn obstacle_at(&self, point: &Point) -> Option<&Obstacle> {
        self.obstacles.iter().find(|obs| obs.contains(point))
    }

    /// Distance from `point` to the rim of the nearest obstacle.
    pub fn distance_to_nearest_obstacle(&self, point: &Point) -> f64 {
        self.obstacles
            .iter()
            .map(|obs| point.distance_to(&obs.center) - obs.radius)
            .fold(f64::INFINITY, f64::min)
    }

    /// Total free area, m².
    pub fn traversable_area(&self) -> f64 {
        let free = self
            .kind
            .iter()
            .filter(|kind| **kind == CellKind::Free)
            .count();
        free as f64 * self.resolution * self.resolution
    }
}

impl fmt::Display for SurveillanceMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Sector {:.0}x{:.0} m @ {:.0} m/cell with {} obstacles, home {}, coverage {:.1}%",
            self.width,
            self.height,
            self.resolution,
            self.obstacles.len(),
            self.start_position,
            self.coverage_percentage()
        )
    }
}
