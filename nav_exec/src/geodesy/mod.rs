//! # Geodesy module
//!
//! Converts GPS fixes into the quantities the planner needs to close the
//! navigation loop: distance to the goal and heading error towards it.
//!
//! All functions are pure. Angles are in radians, distances in meters, and
//! every heading or bearing returned is in the range (-pi, pi], measured
//! clockwise from north.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub use params::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

// Internal
use util::maths::{ang_diff, clamp, wrap_pi};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A position on the Earth's surface.
///
/// Latitude is in [-pi/2, pi/2] and longitude in (-pi, pi]. Points can only
/// be built through the validating constructors, so a value given in degrees
/// cannot silently reach the trigonometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lat_rad: f64,
    lon_rad: f64,
}

/// Two consecutive fixes, defining the vehicle's direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixPair {
    pub previous: GeoPoint,
    pub current: GeoPoint,
}

/// Distance between two points as given by both estimators.
///
/// The estimates are kept separate so callers can cross-check them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DistanceEstimate {
    /// Great circle distance.
    ///
    /// Units: meters
    pub haversine_m: f64,

    /// Local equirectangular distance.
    ///
    /// Units: meters
    pub planar_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Which distance estimator to use when a single distance is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum DistanceMethod {
    Haversine,
    Planar,
}

/// Errors raised by the geodesy functions.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeodesyError {
    #[error("Coordinate is not finite (lat: {0}, lon: {1})")]
    NonFinite(f64, f64),

    #[error("Latitude {0} rad is outside [-pi/2, pi/2], was it given in degrees?")]
    InvalidLatitude(f64),

    #[error("Longitude {0} rad is outside [-pi, pi], was it given in degrees?")]
    InvalidLongitude(f64),

    #[error(
        "Heading is indeterminate: displacement of {displacement_m:.3} m is below the \
         {threshold_m:.3} m threshold"
    )]
    HeadingIndeterminate {
        displacement_m: f64,
        threshold_m: f64
    },

    #[error("Current position is {distance_m:.3} m from the goal, no bearing to it exists")]
    GoalCoincident {
        distance_m: f64
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl GeoPoint {

    /// Create a point from a latitude and longitude in radians.
    ///
    /// A longitude of exactly -pi is stored as +pi.
    pub fn from_radians(lat_rad: f64, lon_rad: f64) -> Result<Self, GeodesyError> {
        if !lat_rad.is_finite() || !lon_rad.is_finite() {
            return Err(GeodesyError::NonFinite(lat_rad, lon_rad))
        }
        if lat_rad.abs() > FRAC_PI_2 {
            return Err(GeodesyError::InvalidLatitude(lat_rad))
        }
        if lon_rad.abs() > PI {
            return Err(GeodesyError::InvalidLongitude(lon_rad))
        }

        Ok(Self {
            lat_rad,
            lon_rad: wrap_pi(lon_rad)
        })
    }

    /// Create a point from a latitude and longitude in degrees, as delivered
    /// by the GPS receiver.
    pub fn from_degrees(lat_deg: f64, lon_deg: f64) -> Result<Self, GeodesyError> {
        if !lat_deg.is_finite() || !lon_deg.is_finite() {
            return Err(GeodesyError::NonFinite(lat_deg, lon_deg))
        }
        if lat_deg.abs() > 90.0 {
            return Err(GeodesyError::InvalidLatitude(lat_deg.to_radians()))
        }
        if lon_deg.abs() > 180.0 {
            return Err(GeodesyError::InvalidLongitude(lon_deg.to_radians()))
        }

        // Clamp to absorb rounding in the conversion at the range limits
        Self::from_radians(
            clamp(lat_deg.to_radians(), -FRAC_PI_2, FRAC_PI_2),
            clamp(lon_deg.to_radians(), -PI, PI)
        )
    }

    /// Latitude in radians.
    pub fn lat_rad(&self) -> f64 {
        self.lat_rad
    }

    /// Longitude in radians.
    pub fn lon_rad(&self) -> f64 {
        self.lon_rad
    }

    /// Latitude in degrees.
    pub fn lat_deg(&self) -> f64 {
        self.lat_rad.to_degrees()
    }

    /// Longitude in degrees.
    pub fn lon_deg(&self) -> f64 {
        self.lon_rad.to_degrees()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat_deg(), self.lon_deg())
    }
}

impl Default for DistanceMethod {
    fn default() -> Self {
        DistanceMethod::Planar
    }
}

impl DistanceEstimate {
    /// Get the estimate produced by the given method.
    pub fn get(&self, method: DistanceMethod) -> f64 {
        match method {
            DistanceMethod::Haversine => self.haversine_m,
            DistanceMethod::Planar => self.planar_m,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Great circle distance between two points using the haversine formula.
///
/// The `atan2` form stays well conditioned for both near-identical and near
/// antipodal points.
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint, params: &GeodesyParams) -> f64 {
    let d_lat = p2.lat_rad - p1.lat_rad;
    let d_lon = p2.lon_rad - p1.lon_rad;

    let a = (d_lat / 2.0).sin().powi(2)
        + p1.lat_rad.cos() * p2.lat_rad.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push a fractionally outside [0, 1] near antipodes
    let a = clamp(a, 0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    params.earth_radius_m * c
}

/// Straight line distance between two points in a local equirectangular
/// projection.
///
/// Only valid for small separations, such as a waypoint leg. The longitude
/// difference is wrapped so that legs crossing the antimeridian stay short.
pub fn planar_approx_distance(p1: &GeoPoint, p2: &GeoPoint, params: &GeodesyParams) -> f64 {
    local_en_m(p1, p2, params).norm()
}

/// Both distance estimates between two points.
pub fn estimate_distance(p1: &GeoPoint, p2: &GeoPoint, params: &GeodesyParams) -> DistanceEstimate {
    DistanceEstimate {
        haversine_m: haversine_distance(p1, p2, params),
        planar_m: planar_approx_distance(p1, p2, params),
    }
}

/// Initial bearing of the great circle path from `from` to `to`.
///
/// Measured clockwise from north in (-pi, pi]. Coincident points give 0.
pub fn initial_bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let d_lon = to.lon_rad - from.lon_rad;

    let y = d_lon.sin() * to.lat_rad.cos();
    let x = from.lat_rad.cos() * to.lat_rad.sin()
        - from.lat_rad.sin() * to.lat_rad.cos() * d_lon.cos();

    wrap_pi(y.atan2(x))
}

/// Compute the heading error from the vehicle's direction of travel to the
/// goal.
///
/// The travel bearing is inferred from the `previous -> current`
/// displacement, since there is no compass. The result is the signed
/// difference `desired - travel` in (-pi, pi], positive when the goal lies
/// clockwise (to the right) of the direction of travel.
///
/// # Errors
/// - `HeadingIndeterminate` if the displacement between `previous` and
///   `current` is below `params.min_heading_displacement_m`.
/// - `GoalCoincident` if `current` is closer to `goal` than the same
///   threshold.
pub fn compute_heading(
    previous: &GeoPoint,
    current: &GeoPoint,
    goal: &GeoPoint,
    params: &GeodesyParams
) -> Result<f64, GeodesyError> {

    let displacement_m = planar_approx_distance(previous, current, params);
    if displacement_m < params.min_heading_displacement_m {
        return Err(GeodesyError::HeadingIndeterminate {
            displacement_m,
            threshold_m: params.min_heading_displacement_m
        })
    }

    let goal_dist_m = planar_approx_distance(current, goal, params);
    if goal_dist_m < params.min_heading_displacement_m {
        return Err(GeodesyError::GoalCoincident {
            distance_m: goal_dist_m
        })
    }

    let travel_rad = initial_bearing(previous, current);
    let desired_rad = initial_bearing(current, goal);

    Ok(ang_diff(travel_rad, desired_rad))
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// East/north offset of `p2` from `p1` in the local equirectangular
/// projection.
fn local_en_m(p1: &GeoPoint, p2: &GeoPoint, params: &GeodesyParams) -> Vector2<f64> {
    let d_lat = p2.lat_rad - p1.lat_rad;
    let d_lon = ang_diff(p1.lon_rad, p2.lon_rad);
    let mean_lat = 0.5 * (p1.lat_rad + p2.lat_rad);

    Vector2::new(
        params.earth_radius_m * d_lon * mean_lat.cos(),
        params.earth_radius_m * d_lat
    )
}
