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

//! High-altitude border sector fixture: a 5000×3500 m patrol area with named
//! peaks as obstacles, posts as no-fly zones, a forward operating base as
//! home, and a procedural heightmap in the 3500–5500 m band.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::geometry::Point;
use crate::sector::{Obstacle, SurveillanceMap};
use crate::ShrikeError;

const SECTOR_WIDTH: f64 = 5000.0;
const SECTOR_HEIGHT: f64 = 3500.0;
const SECTOR_RESOLUTION: f64 = 20.0;
const HOME: Point = Point::new(300.0, 1700.0);

/// name, x, y, radius, summit elevation (m AMSL)
const PEAKS: [(&str, f64, f64, f64, f64); 8] = [
    ("Peak 5490", 1000.0, 500.0, 120.0, 5490.0),
    ("Saser Kangri", 500.0, 1800.0, 150.0, 5600.0),
    ("Ridge Alpha", 2200.0, 700.0, 100.0, 5200.0),
    ("Peak 5180", 3000.0, 1400.0, 110.0, 5180.0),
    ("Karakoram Spur", 1500.0, 2800.0, 130.0, 5350.0),
    ("Glacier Point", 3600.0, 600.0, 90.0, 5100.0),
    ("Ridge Bravo", 4300.0, 2200.0, 100.0, 5250.0),
    ("Peak 4980", 2800.0, 2600.0, 85.0, 4980.0),
];

/// name, x, y, radius
const NO_FLY_POSTS: [(&str, f64, f64, f64); 3] = [
    ("Post Alpha", 3500.0, 1000.0, 80.0),
    ("Post Bravo", 4500.0, 2800.0, 90.0),
    ("Radar Site", 1800.0, 1500.0, 70.0),
];

/// name, x, y, kind
const LANDMARK_TABLE: [(&str, f64, f64, &str); 8] = [
    ("Galwan Valley", 1200.0, 800.0, "valley"),
    ("Pangong Tso", 3800.0, 2800.0, "lake"),
    ("Hot Springs", 2500.0, 1200.0, "region"),
    ("Depsang Plains", 800.0, 2600.0, "plains"),
    ("Gogra Heights", 2000.0, 2200.0, "ridge"),
    ("Finger 4 Ridge", 3200.0, 2400.0, "ridge"),
    ("Chang Chenmo", 4200.0, 1500.0, "river"),
    ("Karakoram Pass", 600.0, 3000.0, "pass"),
];

/// A named terrain feature, exported for downstream consumers.
#[derive(Clone, Debug, PartialEq)]
pub struct Landmark {
    pub name: &'static str,
    pub position: Point,
    pub kind: &'static str,
}

/// Terrain elevation grid generated alongside the border sector.
#[derive(Clone, Debug)]
pub struct Heightmap {
    rows: usize,
    cols: usize,
    resolution: f64,
    data: Vec<f32>,
}

impl Heightmap {
    /// Terrain elevation (m AMSL) at a sector point, clamped to the grid.
    pub fn elevation_at(&self, point: &Point) -> f64 {
        let ix = ((point.x / self.resolution) as usize).min(self.cols - 1);
        let iy = ((point.y / self.resolution) as usize).min(self.rows - 1);
        self.data[iy * self.cols + ix] as f64
    }

    pub fn min_elevation(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, |a, b| a.min(b as f64))
    }

    pub fn max_elevation(&self) -> f64 {
        self.data
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, |a, b| a.max(b as f64))
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: usize, x: f64, y: f64) -> f64 {
    const VECTORS: [(f64, f64); 8] = [
        (1.0, 1.0),
        (-1.0, 1.0),
        (1.0, -1.0),
        (-1.0, -1.0),
        (1.0, 0.0),
        (-1.0, 0.0),
        (0.0, 1.0),
        (0.0, -1.0),
    ];
    let g = VECTORS[hash % 8];
    g.0 * x + g.1 * y
}

/// Single octave of 2D gradient noise over a shuffled permutation table.
fn gradient_noise(nx: f64, ny: f64, perm: &[usize]) -> f64 {
    let x0 = nx.floor() as i64;
    let y0 = ny.floor() as i64;
    let (x1, y1) = (x0 + 1, y0 + 1);
    let sx = fade(nx - x0 as f64);
    let sy = fade(ny - y0 as f64);

    let idx = |x: i64, y: i64| perm[(perm[(x.rem_euclid(256)) as usize] + y.rem_euclid(256) as usize) % 256];

    let n00 = grad(idx(x0, y0), nx - x0 as f64, ny - y0 as f64);
    let n10 = grad(idx(x1, y0), nx - x1 as f64, ny - y0 as f64);
    let n01 = grad(idx(x0, y1), nx - x0 as f64, ny - y1 as f64);
    let n11 = grad(idx(x1, y1), nx - x1 as f64, ny - y1 as f64);

    let ix0 = lerp(n00, n10, sx);
    let ix1 = lerp(n01, n11, sx);
    lerp(ix0, ix1, sy)
}

/// Generate the terrain heightmap: four octaves of gradient noise mapped to
/// the 3500–5500 m elevation band, with the ground raised under each peak.
fn generate_heightmap(seed: u64) -> Heightmap {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut perm: Vec<usize> = (0..256).collect();
    perm.shuffle(&mut rng);

    let cols = (SECTOR_WIDTH / SECTOR_RESOLUTION) as usize;
    let rows = (SECTOR_HEIGHT / SECTOR_RESOLUTION) as usize;
    let mut data = vec![0.0f32; rows * cols];

    for r in 0..rows {
        for c in 0..cols {
            let x = c as f64 / cols as f64;
            let y = r as f64 / rows as f64;

            let mut e = gradient_noise(x * 4.0, y * 4.0, &perm);
            e += gradient_noise(x * 8.0, y * 8.0, &perm) * 0.5;
            e += gradient_noise(x * 16.0, y * 16.0, &perm) * 0.25;
            e += gradient_noise(x * 32.0, y * 32.0, &perm) * 0.12;

            let e = ((e + 1.2) / 2.4).clamp(0.0, 1.0);
            data[r * cols + c] = (3500.0 + e * 2000.0) as f32;
        }
    }

    let mut heightmap = Heightmap {
        rows,
        cols,
        resolution: SECTOR_RESOLUTION,
        data,
    };

    for (_, px, py, radius, elevation) in PEAKS {
        let cx = (px / SECTOR_RESOLUTION) as i64;
        let cy = (py / SECTOR_RESOLUTION) as i64;
        let reach = radius + 100.0;
        let r_cells = (reach / SECTOR_RESOLUTION) as i64;
        for dy in -r_cells..=r_cells {
            for dx in -r_cells..=r_cells {
                let (nx, ny) = (cx + dx, cy + dy);
                if nx < 0 || ny < 0 || nx >= cols as i64 || ny >= rows as i64 {
                    continue;
                }
                let dist = ((dx * dx + dy * dy) as f64).sqrt() * SECTOR_RESOLUTION;
                if dist < reach {
                    let t = 1.0 - dist / reach;
                    let boost = t * t * (elevation - 4000.0);
                    let cell = &mut heightmap.data[(ny as usize) * cols + nx as usize];
                    *cell = (*cell).max((4000.0 + boost) as f32);
                }
            }
        }
    }

    heightmap
}

/// Generate the border patrol sector: peaks, posts, home base, heightmap
/// and landmarks.
pub fn lac_sector(seed: u64) -> Result<(SurveillanceMap, Heightmap, Vec<Landmark>), ShrikeError> {
    let mut sector = SurveillanceMap::new(
        SECTOR_WIDTH,
        SECTOR_HEIGHT,
        SECTOR_RESOLUTION,
        HOME,
        30.0,
        60.0,
    )?;

    for (name, x, y, radius, _) in PEAKS {
        sector.add_obstacle(Obstacle::new(Point::new(x, y), radius, false, name));
    }
    for (name, x, y, radius) in NO_FLY_POSTS {
        sector.add_obstacle(Obstacle::new(Point::new(x, y), radius, true, name));
    }

    let heightmap = generate_heightmap(seed);

    let landmarks = LANDMARK_TABLE
        .into_iter()
        .map(|(name, x, y, kind)| Landmark {
            name,
            position: Point::new(x, y),
            kind,
        })
        .collect();

    info!("{sector}");

    Ok((sector, heightmap, landmarks))
}
