//! Parameters structure for Geodesy

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Mean radius of the Earth.
///
/// The Earth is modelled as a sphere of this radius. The real Earth is an
/// oblate spheroid so distances carry up to ~0.3% error.
///
/// Units: meters
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_000.0;

/// Default displacement between two fixes below which the direction of travel
/// is considered unknown.
///
/// Units: meters
pub const DEFAULT_MIN_HEADING_DISPLACEMENT_M: f64 = 0.5;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the geodesy functions.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeodesyParams {
    /// Radius of the spherical Earth model.
    ///
    /// Units: meters
    pub earth_radius_m: f64,

    /// If the previous and current fixes are closer than this the travel
    /// bearing cannot be determined and heading calculation fails.
    ///
    /// Units: meters
    pub min_heading_displacement_m: f64,
}

impl Default for GeodesyParams {
    fn default() -> Self {
        Self {
            earth_radius_m: EARTH_MEAN_RADIUS_M,
            min_heading_displacement_m: DEFAULT_MIN_HEADING_DISPLACEMENT_M,
        }
    }
}
