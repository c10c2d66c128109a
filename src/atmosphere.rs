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

//! International Standard Atmosphere model and the derived performance
//! envelope of the airframe.
//!
//! At 4,000 m AMSL the air density drops to ~0.819 kg/m³ against 1.225 at
//! sea level, which drives cruise speed, power draw, minimum loiter radius
//! and descent rates. Everything in this module is a pure function of
//! altitude.

use serde::{Deserialize, Serialize};

/// Sea level air density, kg/m³.
pub const SEA_LEVEL_DENSITY: f64 = 1.225;
/// Sea level temperature, K.
pub const SEA_LEVEL_TEMP: f64 = 288.15;
/// Sea level pressure, Pa.
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0;
/// Tropospheric temperature lapse rate, K/m.
pub const TEMP_LAPSE_RATE: f64 = 0.0065;
/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.80665;
/// Specific gas constant of dry air, J/(kg·K).
pub const GAS_CONSTANT: f64 = 287.058;

/// Airframe baseline cruise speed at sea level, m/s.
pub const BASELINE_CRUISE_SPEED_MS: f64 = 19.0;
/// Airframe baseline cruise power draw at sea level, W.
pub const BASELINE_POWER_DRAW_W: f64 = 133.0;
/// Airframe baseline minimum loiter radius at sea level, m.
pub const BASELINE_LOITER_RADIUS_M: f64 = 55.0;
/// Airframe baseline stall speed at sea level, m/s.
pub const BASELINE_STALL_SPEED_MS: f64 = 12.0;
/// Bank angle held in steady turns, degrees.
pub const BASELINE_BANK_ANGLE_DEG: f64 = 35.0;
/// Battery capacity (6S4P Li-Ion pack), Wh.
pub const BATTERY_CAPACITY_WH: f64 = 370.0;

/// Atmospheric conditions at a given altitude.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereState {
    /// Meters AMSL, clamped to the troposphere.
    pub altitude_m: f64,
    /// kg/m³
    pub density: f64,
    /// K
    pub temperature: f64,
    /// Pa
    pub pressure: f64,
    /// σ = ρ/ρ₀
    pub density_ratio: f64,
}

impl AtmosphereState {
    pub fn temperature_celsius(&self) -> f64 {
        self.temperature - 273.15
    }
}

/// Compute ISA atmospheric properties at a given altitude.
///
/// Uses the barometric formula for the troposphere (valid to ~11,000 m):
///
/// ```text
/// T = T₀ − L·h
/// P = P₀ · (T/T₀)^(g/(L·R))
/// ρ = P / (R·T)
/// ```
///
/// The altitude is clamped to `[0, 11000]` m.
pub fn isa_at_altitude(altitude_m: f64) -> AtmosphereState {
    let altitude_m = altitude_m.clamp(0.0, 11_000.0);

    let temperature = SEA_LEVEL_TEMP - TEMP_LAPSE_RATE * altitude_m;
    let exponent = GRAVITY / (TEMP_LAPSE_RATE * GAS_CONSTANT);
    let pressure = SEA_LEVEL_PRESSURE * (temperature / SEA_LEVEL_TEMP).powf(exponent);
    let density = pressure / (GAS_CONSTANT * temperature);

    AtmosphereState {
        altitude_m,
        density,
        temperature,
        pressure,
        density_ratio: density / SEA_LEVEL_DENSITY,
    }
}

/// Altitude-adjusted flight performance.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightPerformance {
    pub altitude_m: f64,
    /// m/s, scales as 1/√σ.
    pub cruise_speed_ms: f64,
    /// W, scales as 1/√σ.
    pub power_draw_w: f64,
    /// Minimum safe loiter radius, m.
    pub loiter_radius_m: f64,
    /// m/s, scales as 1/√σ.
    pub stall_speed_ms: f64,
    /// Altitude lost per loiter-to-land loop, m.
    pub descent_rate_m_per_loop: f64,
}

/// Compute the altitude-adjusted performance envelope.
///
/// Key relationships:
/// - cruise and stall speed scale as 1/√σ (more true airspeed in thin air);
/// - power follows `P ∝ ρV³`, whose ratio collapses to σ^(−1/2);
/// - minimum loiter radius is `V² / (g·tan(bank))`.
pub fn performance_at(altitude_m: f64) -> FlightPerformance {
    let atm = isa_at_altitude(altitude_m);
    let sqrt_sigma = atm.density_ratio.sqrt();

    let cruise_speed_ms = BASELINE_CRUISE_SPEED_MS / sqrt_sigma;
    let stall_speed_ms = BASELINE_STALL_SPEED_MS / sqrt_sigma;
    let power_draw_w = BASELINE_POWER_DRAW_W / sqrt_sigma;

    let bank_rad = BASELINE_BANK_ANGLE_DEG.to_radians();
    let loiter_radius_m = cruise_speed_ms.powi(2) / (GRAVITY * bank_rad.tan());

    FlightPerformance {
        altitude_m: atm.altitude_m,
        cruise_speed_ms,
        power_draw_w,
        loiter_radius_m,
        stall_speed_ms,
        descent_rate_m_per_loop: 3.0 + altitude_m.clamp(0.0, 11_000.0) / 2000.0,
    }
}

/// Mission endurance estimate at a given altitude.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Endurance {
    pub altitude_m: f64,
    pub endurance_hours: f64,
    pub power_draw_w: f64,
    pub cruise_speed_ms: f64,
    pub loiter_radius_m: f64,
    pub coverage_per_loiter_m2: f64,
    pub estimated_loiters: usize,
    pub total_coverage_km2: f64,
    pub battery_capacity_wh: f64,
    pub solar_boost_w: f64,
}

/// Estimate endurance from the battery capacity and the net power draw,
/// assuming 60% of the airborne time is spent in loiter.
pub fn endurance_at(altitude_m: f64, solar_boost_w: f64) -> Endurance {
    let perf = performance_at(altitude_m);
    let net_power = perf.power_draw_w - solar_boost_w;

    let endurance_hours = BATTERY_CAPACITY_WH / net_power;
    let endurance_minutes = endurance_hours * 60.0;

    let coverage_per_loiter_m2 = std::f64::consts::PI * perf.loiter_radius_m.powi(2);
    let loiter_time_fraction = 0.6;
    let minutes_per_loiter =
        (std::f64::consts::TAU * perf.loiter_radius_m) / perf.cruise_speed_ms / 60.0;
    let estimated_loiters = (endurance_minutes * loiter_time_fraction / minutes_per_loiter) as usize;

    Endurance {
        altitude_m,
        endurance_hours,
        power_draw_w: perf.power_draw_w,
        cruise_speed_ms: perf.cruise_speed_ms,
        loiter_radius_m: perf.loiter_radius_m,
        coverage_per_loiter_m2,
        estimated_loiters,
        total_coverage_km2: estimated_loiters as f64 * coverage_per_loiter_m2 / 1e6,
        battery_capacity_wh: BATTERY_CAPACITY_WH,
        solar_boost_w,
    }
}
