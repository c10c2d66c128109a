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

//! The serialized mission document.
//!
//! This is the contract consumed by dashboards, geographic packagers and
//! report generators; its section and field names are normative. Values are
//! rounded here, at the boundary, never inside the planners.

use serde::{Deserialize, Serialize};

use crate::loiter::LoiterKind;
use crate::planners::descent::DescentPhase;
use crate::planners::energy::PhaseKind;
use crate::planners::mission::PlannedMission;
use crate::sector::SurveillanceMap;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// How the sector was produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    Random,
    Lac,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSection {
    pub width: f64,
    pub height: f64,
    pub resolution: f64,
    #[serde(rename = "type")]
    pub kind: MapKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct XySection {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSection {
    pub cruise_speed_ms: f64,
    pub power_draw_w: f64,
    pub loiter_radius_m: f64,
    pub stall_speed_ms: f64,
    pub air_density: f64,
    pub density_ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleEntry {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub name: String,
    pub is_no_fly: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoiterEntry {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    #[serde(rename = "type")]
    pub kind: LoiterKind,
    /// 1-based station number in tour order.
    pub index: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointKind {
    Home,
    Loiter,
    Return,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaypointEntry {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: WaypointKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PhaseKind,
    pub distance_m: f64,
    pub duration_s: f64,
    pub energy_wh: f64,
}

/// Wh consumed per phase class. Absent classes read zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyByType {
    pub climb: f64,
    pub transit: f64,
    pub loiter: f64,
    pub descent: f64,
    pub rtb: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergySection {
    pub battery_capacity_wh: f64,
    pub reserve_wh: f64,
    pub usable_wh: f64,
    pub total_energy_wh: f64,
    pub remaining_wh: f64,
    pub remaining_pct: f64,
    pub total_distance_m: f64,
    pub total_duration_min: f64,
    pub energy_by_type: EnergyByType,
    pub phases: Vec<PhaseEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DescentWaypointEntry {
    pub x: f64,
    pub y: f64,
    pub alt: f64,
    pub speed: f64,
    pub bank: f64,
    pub phase: DescentPhase,
    #[serde(rename = "loop")]
    pub loop_number: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DescentSection {
    pub center: XySection,
    pub radius_m: f64,
    pub start_altitude_m: f64,
    pub terrain_elevation_m: f64,
    pub n_loops: usize,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub energy_wh: f64,
    pub waypoints: Vec<DescentWaypointEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsSection {
    pub total_loiters: usize,
    pub total_distance: f64,
    pub total_energy_wh: f64,
    pub duration_min: f64,
    pub num_obstacles: usize,
    pub coverage_pct: f64,
}

/// The full mission document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissionDocument {
    pub map: MapSection,
    pub home: XySection,
    pub altitude_m: f64,
    pub performance: PerformanceSection,
    pub obstacles: Vec<ObstacleEntry>,
    pub loiters: Vec<LoiterEntry>,
    pub waypoints: Vec<WaypointEntry>,
    pub energy: EnergySection,
    pub descent: DescentSection,
    pub stats: StatsSection,
}

impl MissionDocument {
    /// Assemble the document from a finished planning run.
    pub fn assemble(
        sector: &SurveillanceMap,
        map_kind: MapKind,
        altitude_m: f64,
        mission: &PlannedMission,
    ) -> Self {
        let home = XySection {
            x: sector.start_position.x,
            y: sector.start_position.y,
        };

        let loiters: Vec<LoiterEntry> = mission
            .path
            .loiters
            .iter()
            .enumerate()
            .map(|(i, loiter)| LoiterEntry {
                x: loiter.center.x,
                y: loiter.center.y,
                radius: loiter.radius,
                kind: loiter.kind,
                index: i + 1,
            })
            .collect();

        let mut waypoints = Vec::with_capacity(loiters.len() + 2);
        waypoints.push(WaypointEntry {
            x: home.x,
            y: home.y,
            kind: WaypointKind::Home,
            radius: None,
            index: None,
        });
        for entry in &loiters {
            waypoints.push(WaypointEntry {
                x: entry.x,
                y: entry.y,
                kind: WaypointKind::Loiter,
                radius: Some(entry.radius),
                index: Some(entry.index),
            });
        }
        waypoints.push(WaypointEntry {
            x: home.x,
            y: home.y,
            kind: WaypointKind::Return,
            radius: None,
            index: None,
        });

        let budget = &mission.budget;
        let by_kind = budget.energy_by_kind();
        let energy = EnergySection {
            battery_capacity_wh: budget.battery_capacity_wh,
            reserve_wh: round1(budget.reserve_wh),
            usable_wh: round1(budget.usable_wh),
            total_energy_wh: round1(budget.total_energy_wh()),
            remaining_wh: round1(budget.remaining_wh()),
            remaining_pct: round1(budget.remaining_pct()),
            total_distance_m: budget.total_distance_m().round(),
            total_duration_min: round1(budget.total_duration().to_seconds() / 60.0),
            energy_by_type: EnergyByType {
                climb: round1(by_kind.get(&PhaseKind::Climb).copied().unwrap_or(0.0)),
                transit: round1(by_kind.get(&PhaseKind::Transit).copied().unwrap_or(0.0)),
                loiter: round1(by_kind.get(&PhaseKind::Loiter).copied().unwrap_or(0.0)),
                descent: round1(by_kind.get(&PhaseKind::Descent).copied().unwrap_or(0.0)),
                rtb: round1(by_kind.get(&PhaseKind::Rtb).copied().unwrap_or(0.0)),
            },
            phases: budget
                .phases
                .iter()
                .map(|phase| PhaseEntry {
                    name: phase.label.clone(),
                    kind: phase.kind,
                    distance_m: round1(phase.distance_m),
                    duration_s: round1(phase.duration.to_seconds()),
                    energy_wh: round1(phase.energy_wh),
                })
                .collect(),
        };

        let descent = DescentSection {
            center: XySection {
                x: round1(mission.descent.center.x),
                y: round1(mission.descent.center.y),
            },
            radius_m: round1(mission.descent.radius_m),
            start_altitude_m: round1(mission.descent.start_altitude_m),
            terrain_elevation_m: round1(mission.descent.terrain_elevation_m),
            n_loops: mission.descent.n_loops,
            total_distance_m: round1(mission.descent.total_distance_m),
            total_duration_s: round1(mission.descent.total_duration.to_seconds()),
            energy_wh: round1(mission.descent.energy_wh),
            waypoints: mission
                .descent
                .waypoints
                .iter()
                .map(|w| DescentWaypointEntry {
                    x: round1(w.x),
                    y: round1(w.y),
                    alt: round1(w.altitude_m),
                    speed: round1(w.speed_ms),
                    bank: round1(w.bank_deg),
                    phase: w.phase,
                    loop_number: w.loop_number,
                })
                .collect(),
        };

        let stats = StatsSection {
            total_loiters: mission.path.loiters.len(),
            total_distance: mission.path.total_distance(),
            total_energy_wh: energy.total_energy_wh,
            duration_min: energy.total_duration_min,
            num_obstacles: sector.obstacles().len(),
            coverage_pct: round1(mission.coverage_pct),
        };

        Self {
            map: MapSection {
                width: sector.width,
                height: sector.height,
                resolution: sector.resolution,
                kind: map_kind,
            },
            home,
            altitude_m,
            performance: PerformanceSection {
                cruise_speed_ms: round1(mission.performance.cruise_speed_ms),
                power_draw_w: round1(mission.performance.power_draw_w),
                loiter_radius_m: round1(mission.performance.loiter_radius_m),
                stall_speed_ms: round1(mission.performance.stall_speed_ms),
                air_density: round3(mission.atmosphere.density),
                density_ratio: round3(mission.atmosphere.density_ratio),
            },
            obstacles: sector
                .obstacles()
                .iter()
                .map(|obs| ObstacleEntry {
                    x: obs.center.x,
                    y: obs.center.y,
                    radius: obs.radius,
                    name: obs.name.clone(),
                    is_no_fly: obs.is_no_fly,
                })
                .collect(),
            loiters,
            waypoints,
            energy,
            descent,
            stats,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
