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

//! End-to-end mission pipeline: performance derivation, coverage selection,
//! tour sequencing, energy accounting and the landing spiral, in one call.

use crate::atmosphere::{isa_at_altitude, performance_at, AtmosphereState, FlightPerformance,
                        BATTERY_CAPACITY_WH};
use crate::loiter::LoiterKind;
use crate::planners::coverage::{CoverageConfig, CoveragePlanner, MissionPath};
use crate::planners::descent::{compute_descent_plan, DescentPlan};
use crate::planners::energy::{EnergyBudget, EnergyManager};
use crate::planners::transition::TransitionPlanner;
use crate::sector::lac::Heightmap;
use crate::sector::SurveillanceMap;
use crate::ShrikeError;

/// Caller-facing planner parameters.
#[derive(Copy, Clone, Debug)]
pub struct MissionParams {
    pub loiter_kind: LoiterKind,
    /// Nominal loiter radius, m. Raised to the performance minimum when the
    /// air is too thin for it.
    pub loiter_radius_m: f64,
    /// Minimum turn radius override for transitions, m.
    pub min_turn_radius_m: f64,
    /// Overlap between adjacent loiters, `[0, 1)`.
    pub overlap_factor: f64,
    /// Coverage target, `[0, 100]`.
    pub coverage_threshold_pct: f64,
    pub max_loiters: usize,
    /// Revolutions per station.
    pub revolutions: f64,
    /// Operating height above ground, m AGL.
    pub cruise_agl_m: f64,
    /// Obstacle inflation for fallback corridors, cells.
    pub corridor_safety_cells: usize,
}

impl Default for MissionParams {
    fn default() -> Self {
        Self {
            loiter_kind: LoiterKind::Standard,
            loiter_radius_m: 70.0,
            min_turn_radius_m: 40.0,
            overlap_factor: 0.25,
            coverage_threshold_pct: 95.0,
            max_loiters: 50,
            revolutions: 1.0,
            cruise_agl_m: 80.0,
            corridor_safety_cells: 5,
        }
    }
}

/// Non-fatal conditions of a finished plan. The caller decides whether to
/// shorten the mission or accept the shortfall.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MissionStatus {
    /// The achieved coverage reached the threshold.
    pub coverage_met: bool,
    /// The budget closed above the battery reserve.
    pub within_budget: bool,
}

/// The complete output of a planning run.
#[derive(Clone, Debug)]
pub struct PlannedMission {
    pub path: MissionPath,
    pub budget: EnergyBudget,
    pub descent: DescentPlan,
    pub coverage_pct: f64,
    pub atmosphere: AtmosphereState,
    pub performance: FlightPerformance,
    pub status: MissionStatus,
}

/// One-shot pipeline over a sector.
///
/// The planner owns the sector mutably for the duration of the run (its
/// coverage grid is the only thing written); replanning needs a fresh
/// sector or an explicit coverage reset.
pub struct MissionPlanner<'a> {
    map: &'a mut SurveillanceMap,
    altitude_amsl_m: f64,
    params: MissionParams,
    terrain: Option<&'a Heightmap>,
}

impl<'a> MissionPlanner<'a> {
    pub fn new(
        map: &'a mut SurveillanceMap,
        altitude_amsl_m: f64,
        params: MissionParams,
    ) -> Result<Self, ShrikeError> {
        if !(0.0..=11_000.0).contains(&altitude_amsl_m) {
            return Err(ShrikeError::InvalidConfiguration(format!(
                "operating altitude must be within the troposphere [0, 11000] m, got {altitude_amsl_m}"
            )));
        }
        Ok(Self {
            map,
            altitude_amsl_m,
            params,
            terrain: None,
        })
    }

    /// Attach a terrain model; the descent planner then reads the ground
    /// elevation under the landing circle instead of assuming the operating
    /// AMSL altitude.
    pub fn with_terrain(mut self, terrain: &'a Heightmap) -> Self {
        self.terrain = Some(terrain);
        self
    }

    /// Run the full pipeline.
    pub fn plan(&mut self) -> Result<PlannedMission, ShrikeError> {
        let atmosphere = isa_at_altitude(self.altitude_amsl_m);
        let performance = performance_at(self.altitude_amsl_m);

        info!(
            "planning at {:.0} m AMSL: sigma = {:.3}, cruise {:.1} m/s, power {:.1} W",
            self.altitude_amsl_m,
            atmosphere.density_ratio,
            performance.cruise_speed_ms,
            performance.power_draw_w
        );

        // Thin air raises both the loiter radius and the turn radius floor
        let loiter_radius = self.params.loiter_radius_m.max(performance.loiter_radius_m);
        let turn_radius = self.params.min_turn_radius_m.max(performance.loiter_radius_m);

        let coverage_config = CoverageConfig {
            loiter_kind: self.params.loiter_kind,
            loiter_radius,
            revolutions: self.params.revolutions,
            overlap_factor: self.params.overlap_factor,
            coverage_threshold: self.params.coverage_threshold_pct,
            max_loiters: self.params.max_loiters,
        };

        let outcome = {
            let mut planner = CoveragePlanner::new(self.map, coverage_config)?;
            planner.plan(None)
        };

        let sequencer = TransitionPlanner::new(
            self.map,
            turn_radius,
            self.params.corridor_safety_cells,
        )?;
        let path = sequencer.link(outcome.loiters);

        // Energy: climb out, then per-station transit + orbit, then home.
        // The transit surrogate is the straight center-to-center distance.
        let home = self.map.start_position;
        let mut energy = EnergyManager::new(self.altitude_amsl_m, BATTERY_CAPACITY_WH);
        energy.add_climb(self.params.cruise_agl_m);

        let mut afford_breached = false;
        let mut prev = home;
        for (i, loiter) in path.loiters.iter().enumerate() {
            if !afford_breached && !energy.can_afford_loiter(loiter.radius, loiter.revolutions) {
                warn!(
                    "loiter {} of {} would breach the reserve",
                    i + 1,
                    path.loiters.len()
                );
                afford_breached = true;
            }
            energy.add_transit(&prev, &loiter.center, Some(i));
            energy.add_loiter(loiter.radius, loiter.revolutions, i);
            prev = loiter.center;
        }
        energy.add_rtb(&prev, &home);

        // Land inside the final observation circle
        let (descent_center, descent_radius) = match path.loiters.last() {
            Some(last) => (last.center, last.radius),
            None => (home, loiter_radius),
        };
        let terrain_elevation = match self.terrain {
            Some(heightmap) => heightmap.elevation_at(&descent_center),
            None => self.altitude_amsl_m,
        };
        let descent = compute_descent_plan(
            descent_center,
            descent_radius,
            self.params.cruise_agl_m,
            terrain_elevation,
            0.0,
            24,
        );
        energy.add_descent(self.params.cruise_agl_m, descent_radius);

        let budget = energy.into_budget();

        for value in [
            budget.total_energy_wh(),
            path.total_distance(),
            descent.total_distance_m,
        ] {
            if !value.is_finite() {
                return Err(ShrikeError::MathDomain("mission totals".to_string()));
            }
        }

        let status = MissionStatus {
            coverage_met: outcome.coverage_pct >= self.params.coverage_threshold_pct,
            within_budget: budget.is_within_budget() && !afford_breached,
        };

        info!("{path}");
        info!("{budget}");

        Ok(PlannedMission {
            path,
            budget,
            descent,
            coverage_pct: outcome.coverage_pct,
            atmosphere,
            performance,
            status,
        })
    }
}
