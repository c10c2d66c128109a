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

//! Randomized sector fixtures: rejection-sampled obstacle fields with a home
//! position clear of the action.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::Point;
use crate::sector::{Obstacle, SurveillanceMap};
use crate::ShrikeError;

const OBSTACLE_NAMES: [&str; 8] = [
    "building",
    "tower",
    "hill",
    "structure",
    "antenna",
    "tree_cluster",
    "hangar",
    "water_tower",
];

/// Parameters of the random sector generator.
#[derive(Copy, Clone, Debug)]
pub struct RandomSectorConfig {
    pub width: f64,
    pub height: f64,
    pub resolution: f64,
    /// Zero draws a count in 3..=8.
    pub num_obstacles: usize,
    /// Zero draws a count in 0..=2.
    pub num_no_fly: usize,
}

impl Default for RandomSectorConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
            resolution: 10.0,
            num_obstacles: 0,
            num_no_fly: 0,
        }
    }
}

/// Generate a random sector with the provided RNG, which ensures
/// repeatability across runs.
pub fn random_sector_with_rng(
    cfg: RandomSectorConfig,
    rng: &mut StdRng,
) -> Result<SurveillanceMap, ShrikeError> {
    let num_obstacles = if cfg.num_obstacles == 0 {
        rng.gen_range(3..=8)
    } else {
        cfg.num_obstacles
    };
    let num_no_fly = if cfg.num_no_fly == 0 {
        rng.gen_range(0..=2)
    } else {
        cfg.num_no_fly
    };

    // Home always sits in the western band, clear of the sector center.
    let home = Point::new(
        rng.gen_range(60.0..cfg.width * 0.15),
        rng.gen_range(cfg.height * 0.3..cfg.height * 0.7),
    );

    let mut obstacles: Vec<Obstacle> = Vec::new();

    for i in 0..num_obstacles {
        for _attempt in 0..50 {
            let radius = rng.gen_range(25.0..70.0);
            let center = Point::new(
                rng.gen_range(radius + 50.0..cfg.width - radius - 50.0),
                rng.gen_range(radius + 50.0..cfg.height - radius - 50.0),
            );

            if center.distance_to(&home) < radius + 120.0 {
                continue;
            }
            if obstacles
                .iter()
                .any(|obs| center.distance_to(&obs.center) < radius + obs.radius + 60.0)
            {
                continue;
            }

            let name = OBSTACLE_NAMES[rng.gen_range(0..OBSTACLE_NAMES.len())];
            obstacles.push(Obstacle::new(
                center,
                radius,
                false,
                &format!("{}_{}", name, i + 1),
            ));
            break;
        }
    }

    for i in 0..num_no_fly {
        for _attempt in 0..50 {
            let radius = rng.gen_range(40.0..90.0);
            let center = Point::new(
                rng.gen_range(radius + 80.0..cfg.width - radius - 80.0),
                rng.gen_range(radius + 80.0..cfg.height - radius - 80.0),
            );

            if center.distance_to(&home) < radius + 150.0 {
                continue;
            }
            if obstacles
                .iter()
                .any(|obs| center.distance_to(&obs.center) < radius + obs.radius + 40.0)
            {
                continue;
            }

            obstacles.push(Obstacle::new(
                center,
                radius,
                true,
                &format!("no_fly_zone_{}", i + 1),
            ));
            break;
        }
    }

    let mut sector = SurveillanceMap::new(cfg.width, cfg.height, cfg.resolution, home, 20.0, 30.0)?;
    for obstacle in obstacles {
        sector.add_obstacle(obstacle);
    }

    info!("{sector}");

    Ok(sector)
}

/// Generate a random sector from a seed.
pub fn random_sector_with_seed(
    cfg: RandomSectorConfig,
    seed: u64,
) -> Result<SurveillanceMap, ShrikeError> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_sector_with_rng(cfg, &mut rng)
}

/// Generate a random sector from entropy.
pub fn random_sector(cfg: RandomSectorConfig) -> Result<SurveillanceMap, ShrikeError> {
    let mut rng = StdRng::from_entropy();
    random_sector_with_rng(cfg, &mut rng)
}
