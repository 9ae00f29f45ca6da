//! Parameters structure for the Planner

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::geodesy::{DistanceMethod, GeodesyParams};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the Planner.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Params {

    // ---- ROUTE ----

    /// The waypoints to visit in order, as `[latitude, longitude]`.
    ///
    /// Units: degrees
    pub waypoints_deg: Vec<[f64; 2]>,

    /// A waypoint is reached once the vehicle is closer than this to it.
    ///
    /// Units: meters
    pub arrival_radius_m: f64,

    /// Estimator used for the distance to the goal.
    pub distance_method: DistanceMethod,

    // ---- CONTROL ----

    /// Proportional gain from heading error to steering demand.
    ///
    /// Units: 1/radians
    pub steer_gain: f64,

    /// Proportional gain on the normalised distance to the goal for the
    /// throttle demand.
    pub throttle_gain: f64,

    /// Distance at which the throttle demand starts to fall off as the
    /// vehicle approaches the goal.
    ///
    /// Units: meters
    pub slow_down_radius_m: f64,

    /// Maximum throttle demand, between 0 and 1.
    pub max_throttle: f64,

    // ---- GEODESY ----

    #[serde(default)]
    pub geodesy: GeodesyParams,
}
