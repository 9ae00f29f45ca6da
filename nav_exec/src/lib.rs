//! # Navigation library.
//!
//! This library allows the navigation executable, benchmarks and tests to
//! access the GPS waypoint navigation modules.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuators - converts steering and throttle demands into PWM pulses
pub mod actuator;

/// Geodesy - distances and headings between GPS positions
pub mod geodesy;

/// GPS - decodes receiver sentences and tracks the latest fixes
pub mod gps;

/// Executable parameters
pub mod params;

/// Planner - follows the waypoint route, producing steering and throttle demands
pub mod planner;
