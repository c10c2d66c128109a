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

//! Phase-by-phase energy accounting with a hard reserve invariant.
//!
//! Every mission phase (climb, transit, loiter, descent, return-to-base) is
//! costed with the ISA-corrected performance at the operating altitude. The
//! battery level only ever decreases; the mission is within budget while the
//! remainder stays above the 22% reserve.

use std::collections::BTreeMap;
use std::fmt;

use hifitime::{Duration, Unit};
use serde::{Deserialize, Serialize};

use std::f64::consts::TAU;

use crate::atmosphere::{performance_at, FlightPerformance, BATTERY_CAPACITY_WH};
use crate::geometry::Point;

/// Battery fraction held back for emergencies and the return leg.
pub const RESERVE_FRACTION: f64 = 0.22;
/// Climb power relative to cruise power.
pub const CLIMB_POWER_FACTOR: f64 = 1.8;
/// Vertical climb rate, m/s.
pub const CLIMB_RATE_MS: f64 = 3.0;

/// Mission phase classes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Climb,
    Transit,
    Loiter,
    Descent,
    Rtb,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Climb => "climb",
            Self::Transit => "transit",
            Self::Loiter => "loiter",
            Self::Descent => "descent",
            Self::Rtb => "rtb",
        };
        write!(f, "{name}")
    }
}

/// Energy consumed during a single mission phase.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseEnergy {
    pub label: String,
    pub kind: PhaseKind,
    pub distance_m: f64,
    pub duration: Duration,
    pub energy_wh: f64,
    /// Battery level entering the phase, Wh.
    pub start_wh: f64,
    /// Battery level leaving the phase, Wh.
    pub end_wh: f64,
    /// Which loiter station this phase serves, when any.
    pub loiter_index: Option<usize>,
}

impl fmt::Display for PhaseEnergy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {:.0} m in {} for {:.1} Wh ({:.1} -> {:.1} Wh)",
            self.label, self.distance_m, self.duration, self.energy_wh, self.start_wh, self.end_wh
        )
    }
}

/// Complete mission energy breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyBudget {
    pub battery_capacity_wh: f64,
    pub reserve_wh: f64,
    pub usable_wh: f64,
    pub phases: Vec<PhaseEnergy>,
}

impl EnergyBudget {
    pub fn new(battery_capacity_wh: f64) -> Self {
        let reserve_wh = battery_capacity_wh * RESERVE_FRACTION;
        Self {
            battery_capacity_wh,
            reserve_wh,
            usable_wh: battery_capacity_wh - reserve_wh,
            phases: Vec::new(),
        }
    }

    pub fn total_energy_wh(&self) -> f64 {
        self.phases.iter().map(|p| p.energy_wh).sum()
    }

    pub fn remaining_wh(&self) -> f64 {
        self.battery_capacity_wh - self.total_energy_wh()
    }

    pub fn remaining_pct(&self) -> f64 {
        self.remaining_wh() / self.battery_capacity_wh * 100.0
    }

    pub fn total_distance_m(&self) -> f64 {
        self.phases.iter().map(|p| p.distance_m).sum()
    }

    pub fn total_duration(&self) -> Duration {
        self.phases
            .iter()
            .fold(Duration::ZERO, |acc, p| acc + p.duration)
    }

    /// Wh consumed per phase kind.
    pub fn energy_by_kind(&self) -> BTreeMap<PhaseKind, f64> {
        let mut breakdown = BTreeMap::new();
        for phase in &self.phases {
            *breakdown.entry(phase.kind).or_insert(0.0) += phase.energy_wh;
        }
        breakdown
    }

    /// The budget holds while the remainder covers the reserve.
    pub fn is_within_budget(&self) -> bool {
        self.remaining_wh() >= self.reserve_wh
    }
}

impl fmt::Display for EnergyBudget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Budget: {:.1} / {:.1} Wh over {} phases, {:.1}% remaining ({} reserve)",
            self.total_energy_wh(),
            self.battery_capacity_wh,
            self.phases.len(),
            self.remaining_pct(),
            if self.is_within_budget() { "above" } else { "BELOW" }
        )
    }
}

/// Running energy manager for a mission at a fixed operating altitude.
///
/// Performance is derived once from the altitude; appending phases draws
/// down the running battery level monotonically.
pub struct EnergyManager {
    pub perf: FlightPerformance,
    budget: EnergyBudget,
    current_wh: f64,
}

impl EnergyManager {
    pub fn new(altitude_m: f64, battery_wh: f64) -> Self {
        Self {
            perf: performance_at(altitude_m),
            budget: EnergyBudget::new(battery_wh),
            current_wh: battery_wh,
        }
    }

    /// Manager over the standard battery pack.
    pub fn at_altitude(altitude_m: f64) -> Self {
        Self::new(altitude_m, BATTERY_CAPACITY_WH)
    }

    fn consume(&mut self, mut phase: PhaseEnergy) {
        phase.start_wh = self.current_wh;
        self.current_wh -= phase.energy_wh;
        phase.end_wh = self.current_wh;

        debug!("{phase}");
        if self.current_wh < self.budget.reserve_wh {
            warn!(
                "reserve breached after {}: {:.1} Wh left of {:.1} Wh reserve",
                phase.label, self.current_wh, self.budget.reserve_wh
            );
        }

        self.budget.phases.push(phase);
    }

    /// Climb from ground to the operating altitude at 1.8x cruise power.
    pub fn add_climb(&mut self, target_altitude_m: f64) {
        let climb_height = target_altitude_m.max(0.0);
        let seconds = climb_height / CLIMB_RATE_MS;
        let power = self.perf.power_draw_w * CLIMB_POWER_FACTOR;

        self.consume(PhaseEnergy {
            label: "Climb to altitude".to_string(),
            kind: PhaseKind::Climb,
            // The aircraft keeps moving forward at cruise while climbing
            distance_m: self.perf.cruise_speed_ms * seconds,
            duration: seconds * Unit::Second,
            energy_wh: power * seconds / 3600.0,
            start_wh: 0.0,
            end_wh: 0.0,
            loiter_index: None,
        });
    }

    /// Straight transit between two points at cruise.
    pub fn add_transit(&mut self, from: &Point, to: &Point, loiter_index: Option<usize>) {
        let distance = from.distance_to(to);
        let seconds = distance / self.perf.cruise_speed_ms;

        self.consume(PhaseEnergy {
            label: match loiter_index {
                Some(i) => format!("Transit to loiter {}", i + 1),
                None => "Transit".to_string(),
            },
            kind: PhaseKind::Transit,
            distance_m: distance,
            duration: seconds * Unit::Second,
            energy_wh: self.perf.power_draw_w * seconds / 3600.0,
            start_wh: 0.0,
            end_wh: 0.0,
            loiter_index,
        });
    }

    /// One loiter observation pattern. A steady bank draws slightly less
    /// than cruise.
    pub fn add_loiter(&mut self, radius: f64, revolutions: f64, loiter_index: usize) {
        let distance = TAU * radius * revolutions;
        let seconds = distance / self.perf.cruise_speed_ms;
        let power = self.perf.power_draw_w * 0.92;

        self.consume(PhaseEnergy {
            label: format!("Loiter {}", loiter_index + 1),
            kind: PhaseKind::Loiter,
            distance_m: distance,
            duration: seconds * Unit::Second,
            energy_wh: power * seconds / 3600.0,
            start_wh: 0.0,
            end_wh: 0.0,
            loiter_index: Some(loiter_index),
        });
    }

    /// Loiter-to-land spiral descent: reduced throttle at 85% cruise speed.
    pub fn add_descent(&mut self, from_altitude_m: f64, loiter_radius: f64) {
        let loops = (from_altitude_m / self.perf.descent_rate_m_per_loop).ceil() as usize;
        let distance = TAU * loiter_radius * loops as f64;
        let seconds = distance / (self.perf.cruise_speed_ms * 0.85);
        let power = self.perf.power_draw_w * 0.6;

        self.consume(PhaseEnergy {
            label: format!("Loiter-to-land ({loops} loops)"),
            kind: PhaseKind::Descent,
            distance_m: distance,
            duration: seconds * Unit::Second,
            energy_wh: power * seconds / 3600.0,
            start_wh: 0.0,
            end_wh: 0.0,
            loiter_index: None,
        });
    }

    /// Return-to-base transit at cruise.
    pub fn add_rtb(&mut self, from: &Point, home: &Point) {
        let distance = from.distance_to(home);
        let seconds = distance / self.perf.cruise_speed_ms;

        self.consume(PhaseEnergy {
            label: "Return to base".to_string(),
            kind: PhaseKind::Rtb,
            distance_m: distance,
            duration: seconds * Unit::Second,
            energy_wh: self.perf.power_draw_w * seconds / 3600.0,
            start_wh: 0.0,
            end_wh: 0.0,
            loiter_index: None,
        });
    }

    /// Forward check: would one more loiter still leave the reserve intact?
    pub fn can_afford_loiter(&self, radius: f64, revolutions: f64) -> bool {
        let distance = TAU * radius * revolutions;
        let seconds = distance / self.perf.cruise_speed_ms;
        let energy = self.perf.power_draw_w * 0.92 * seconds / 3600.0;
        self.current_wh - energy >= self.budget.reserve_wh
    }

    pub fn remaining_wh(&self) -> f64 {
        self.current_wh
    }

    pub fn budget(&self) -> &EnergyBudget {
        &self.budget
    }

    /// Hand the finished budget to the caller.
    pub fn into_budget(self) -> EnergyBudget {
        self.budget
    }
}
