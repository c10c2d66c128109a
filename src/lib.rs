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

//! # Shrike
//!
//! Shrike is an offline mission planner for fixed-wing surveillance UAS.
//! Given a rectangular sector with circular obstacles and no-fly zones, it
//! produces a complete flight program: loiter observation stations covering
//! the free area (greedy weighted set cover), flyable Dubins transitions
//! between them, a nearest-neighbor tour, a spiral loiter-to-land descent,
//! and a phase-by-phase energy budget checked against battery capacity.
//! The whole pipeline is parameterized by an ISA atmosphere model so that
//! cruise speed, power draw and minimum turn radius change with altitude.
//!
//! The planner is a pure batch function of its inputs: the only mutable
//! entity during a run is the sector's coverage grid.

#[macro_use]
extern crate log;

use std::error::Error;
use std::fmt;

pub mod atmosphere;
pub mod dubins;
pub mod geometry;
pub mod io;
pub mod loiter;
pub mod pathfinder;
pub mod planners;
pub mod sector;

use crate::geometry::Pose;

/// Errors raised by the planning pipeline.
///
/// Coverage shortfalls and budget breaches are deliberately *not* errors:
/// they are non-fatal statuses carried on the planned mission, and the
/// caller decides whether to shorten or refly.
#[derive(Clone, Debug, PartialEq)]
pub enum ShrikeError {
    /// A caller-supplied parameter is outside its valid domain.
    InvalidConfiguration(String),
    /// All six Dubins families were rejected for this pose pair.
    UnreachableGeometry { from: Pose, to: Pose },
    /// A NaN or infinity reached a result value. This is a logic bug.
    MathDomain(String),
}

impl fmt::Display for ShrikeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidConfiguration(reason) => {
                write!(f, "Invalid configuration: {reason}")
            }
            Self::UnreachableGeometry { from, to } => {
                write!(f, "No Dubins path from {from} to {to}")
            }
            Self::MathDomain(what) => {
                write!(f, "Probable bug: non-finite value in {what}")
            }
        }
    }
}

impl Error for ShrikeError {}

pub mod prelude {
    pub use crate::atmosphere::{isa_at_altitude, performance_at, FlightPerformance};
    pub use crate::dubins::{DubinsKind, DubinsPath};
    pub use crate::geometry::{normalize_angle, Point, Pose};
    pub use crate::io::MissionDocument;
    pub use crate::loiter::{Loiter, LoiterKind};
    pub use crate::pathfinder::Pathfinder;
    pub use crate::planners::coverage::{CoverageConfig, CoveragePlanner, MissionPath, Transition};
    pub use crate::planners::descent::{compute_descent_plan, DescentPlan};
    pub use crate::planners::energy::{EnergyBudget, EnergyManager, PhaseKind};
    pub use crate::planners::mission::{MissionParams, MissionPlanner, PlannedMission};
    pub use crate::planners::transition::TransitionPlanner;
    pub use crate::sector::{CellKind, Obstacle, SurveillanceMap};
    pub use crate::ShrikeError;
}
