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

//! 8-connected A* over an inflated obstacle mask, used when a straight or
//! Dubins transition would cut through a keep-out region.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use crate::geometry::Point;
use crate::sector::{CellKind, SurveillanceMap};

const MAX_ITERATIONS: usize = 50_000;
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Heap entry ordered by ascending f-cost. Total order over the float bits
/// keeps the heap deterministic.
#[derive(Copy, Clone, Debug)]
struct Candidate {
    f_cost: f64,
    cell: (usize, usize),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost.to_bits() == other.f_cost.to_bits() && self.cell == other.cell
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that the max-heap pops the lowest f-cost first
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

/// Grid pathfinder over a blocked mask built by inflating every hard and
/// soft cell by `safety_cells` (Chebyshev dilation).
///
/// The safety margin is a per-construction parameter: callers route close to
/// terrain with a tight margin and keep transit corridors wider.
pub struct Pathfinder<'a> {
    map: &'a SurveillanceMap,
    blocked: Vec<bool>,
}

impl<'a> Pathfinder<'a> {
    pub fn new(map: &'a SurveillanceMap, safety_cells: usize) -> Self {
        let (gw, gh) = (map.grid_width(), map.grid_height());
        let mut blocked = vec![false; gw * gh];

        for iy in 0..gh {
            for ix in 0..gw {
                if matches!(
                    map.kind_at(ix, iy),
                    CellKind::Obstacle | CellKind::NoFly | CellKind::SoftNoFly
                ) {
                    let s = safety_cells as isize;
                    for dy in -s..=s {
                        for dx in -s..=s {
                            let nx = ix as isize + dx;
                            let ny = iy as isize + dy;
                            if nx >= 0 && ny >= 0 && (nx as usize) < gw && (ny as usize) < gh {
                                blocked[ny as usize * gw + nx as usize] = true;
                            }
                        }
                    }
                }
            }
        }

        Self { map, blocked }
    }

    fn is_blocked(&self, cell: (usize, usize)) -> bool {
        self.blocked[cell.1 * self.map.grid_width() + cell.0]
    }

    /// Cell containing `point`, clamped into the grid.
    fn clamped_cell(&self, point: &Point) -> (usize, usize) {
        let ix = (point.x / self.map.resolution).floor().max(0.0) as usize;
        let iy = (point.y / self.map.resolution).floor().max(0.0) as usize;
        (
            ix.min(self.map.grid_width() - 1),
            iy.min(self.map.grid_height() - 1),
        )
    }

    /// Find a safe poly-line from `start` to `goal`.
    ///
    /// Blocked endpoints are substituted with their nearest unblocked cell.
    /// On search exhaustion the degraded straight pair `[start, goal]` is
    /// returned so the caller always has a corridor to validate.
    pub fn find_path(&self, start: Point, goal: Point) -> Vec<Point> {
        let start_cell = self.clamped_cell(&start);
        let goal_cell = self.clamped_cell(&goal);

        let start_cell = if self.is_blocked(start_cell) {
            self.nearest_unblocked(start_cell)
        } else {
            Some(start_cell)
        };
        let goal_cell = if self.is_blocked(goal_cell) {
            self.nearest_unblocked(goal_cell)
        } else {
            Some(goal_cell)
        };

        let (start_cell, goal_cell) = match (start_cell, goal_cell) {
            (Some(s), Some(g)) => (s, g),
            _ => {
                warn!("pathfinder: no unblocked cell near endpoints, degrading to straight pair");
                return vec![start, goal];
            }
        };

        let cells = self.astar(start_cell, goal_cell);
        if cells.is_empty() {
            return vec![start, goal];
        }

        let corners = self.shortcut(&cells);

        let mut path = Vec::with_capacity(corners.len() + 2);
        path.push(start);
        for cell in corners {
            path.push(self.map.cell_center(cell.0, cell.1));
        }
        path.push(goal);
        path
    }

    /// Breadth-first sweep to the nearest unblocked cell, bounded to the grid.
    fn nearest_unblocked(&self, from: (usize, usize)) -> Option<(usize, usize)> {
        let (gw, gh) = (self.map.grid_width(), self.map.grid_height());
        let mut visited = vec![false; gw * gh];
        let mut queue = VecDeque::from([from]);
        visited[from.1 * gw + from.0] = true;

        while let Some((cx, cy)) = queue.pop_front() {
            if !self.is_blocked((cx, cy)) {
                return Some((cx, cy));
            }
            for (dx, dy) in [(0i64, 1i64), (1, 0), (0, -1), (-1, 0)] {
                let nx = cx as i64 + dx;
                let ny = cy as i64 + dy;
                if nx >= 0 && ny >= 0 && (nx as usize) < gw && (ny as usize) < gh {
                    let idx = ny as usize * gw + nx as usize;
                    if !visited[idx] {
                        visited[idx] = true;
                        queue.push_back((nx as usize, ny as usize));
                    }
                }
            }
        }

        None
    }

    fn astar(&self, start: (usize, usize), goal: (usize, usize)) -> Vec<(usize, usize)> {
        let (gw, gh) = (self.map.grid_width(), self.map.grid_height());

        let heuristic = |cell: (usize, usize)| -> f64 {
            let dx = cell.0 as f64 - goal.0 as f64;
            let dy = cell.1 as f64 - goal.1 as f64;
            (dx * dx + dy * dy).sqrt()
        };

        let mut open = BinaryHeap::new();
        let mut g_scores: HashMap<(usize, usize), f64> = HashMap::new();
        let mut parents: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        let mut closed = vec![false; gw * gh];

        g_scores.insert(start, 0.0);
        open.push(Candidate {
            f_cost: heuristic(start),
            cell: start,
        });

        let directions: [(i64, i64); 8] = [
            (0, 1),
            (1, 0),
            (0, -1),
            (-1, 0),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];

        let mut iterations = 0;
        while let Some(Candidate { cell, .. }) = open.pop() {
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                warn!("pathfinder: iteration cap hit after {MAX_ITERATIONS} expansions");
                break;
            }

            if cell == goal {
                let mut path = vec![cell];
                let mut node = cell;
                while let Some(parent) = parents.get(&node) {
                    node = *parent;
                    path.push(node);
                }
                path.reverse();
                return path;
            }

            let closed_idx = cell.1 * gw + cell.0;
            if closed[closed_idx] {
                continue;
            }
            closed[closed_idx] = true;

            let current_g = g_scores[&cell];
            for (dx, dy) in directions {
                let nx = cell.0 as i64 + dx;
                let ny = cell.1 as i64 + dy;
                if nx < 0 || ny < 0 || nx as usize >= gw || ny as usize >= gh {
                    continue;
                }
                let neighbor = (nx as usize, ny as usize);
                if self.is_blocked(neighbor) || closed[neighbor.1 * gw + neighbor.0] {
                    continue;
                }

                let move_cost = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
                let tentative_g = current_g + move_cost;

                if g_scores
                    .get(&neighbor)
                    .map_or(true, |&g| tentative_g < g)
                {
                    g_scores.insert(neighbor, tentative_g);
                    parents.insert(neighbor, cell);
                    open.push(Candidate {
                        f_cost: tentative_g + heuristic(neighbor),
                        cell: neighbor,
                    });
                }
            }
        }

        Vec::new()
    }

    /// Shortcut pass: repeatedly jump to the farthest cell still visible in
    /// a straight line, keeping only the corner cells.
    fn shortcut(&self, path: &[(usize, usize)]) -> Vec<(usize, usize)> {
        if path.len() <= 2 {
            return path.to_vec();
        }

        let mut simplified = vec![path[0]];
        let mut i = 0;
        while i < path.len() - 1 {
            let mut advanced = false;
            for j in ((i + 1)..path.len()).rev() {
                if self.cell_sweep_clear(path[i], path[j]) {
                    simplified.push(path[j]);
                    i = j;
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                i += 1;
                simplified.push(path[i]);
            }
        }

        simplified
    }

    /// Whether the straight cell sweep between two cells stays unblocked.
    fn cell_sweep_clear(&self, from: (usize, usize), to: (usize, usize)) -> bool {
        let dx = to.0 as f64 - from.0 as f64;
        let dy = to.1 as f64 - from.1 as f64;
        let steps = dx.abs().max(dy.abs()).max(1.0) as usize;

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = (from.0 as f64 + t * dx) as usize;
            let y = (from.1 as f64 + t * dy) as usize;
            if x < self.map.grid_width()
                && y < self.map.grid_height()
                && self.is_blocked((x, y))
            {
                return false;
            }
        }
        true
    }

    /// Whether the straight segment between two world points stays clear of
    /// the inflated mask. Exposed so corridor consumers can audit segments.
    pub fn is_corridor_clear(&self, from: &Point, to: &Point) -> bool {
        self.cell_sweep_clear(self.clamped_cell(from), self.clamped_cell(to))
    }
}
