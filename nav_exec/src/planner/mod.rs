//! # Planner module
//!
//! Manages the route of waypoints and converts the latest GPS fixes into
//! steering and throttle demands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use crate::geodesy::GeodesyError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Relative difference between the two distance estimators above which a
/// warning is raised.
pub const DISTANCE_CROSS_CHECK_TOLERANCE: f64 = 0.01;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during Planner operation.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Cannot load the planner parameters: {0}")]
    ParamLoad(util::params::LoadError),

    #[error("The route contains no waypoints")]
    NoWaypoints,

    #[error("Waypoint {index} is invalid: {source}")]
    InvalidWaypoint {
        index: usize,
        source: GeodesyError
    },

    #[error("Invalid planner parameter: {0}")]
    InvalidParams(String),

    #[error("Geodesy error: {0}")]
    Geodesy(GeodesyError),
}
