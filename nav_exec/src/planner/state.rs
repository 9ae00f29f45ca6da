//! Implementations for the Planner state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::{Params, PlannerError, DISTANCE_CROSS_CHECK_TOLERANCE};
use crate::geodesy::{
    compute_heading, estimate_distance,
    DistanceEstimate, FixPair, GeoPoint, GeodesyError};
use util::{
    maths::clamp,
    module::State,
    params};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Planner module state
#[derive(Default)]
pub struct Planner {
    params: Params,

    /// The route, converted from the parameter waypoints.
    waypoints: Vec<GeoPoint>,

    /// Index of the current goal in `waypoints`. Equal to the number of
    /// waypoints once the route is complete.
    waypoint_index: usize,
}

/// Input data to the Planner.
#[derive(Default)]
pub struct InputData {
    /// The latest two GPS fixes, or `None` until two fixes are available.
    pub fixes: Option<FixPair>
}

/// Demands for the actuators.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct OutputData {
    /// Steering demand, -1 is full left and +1 full right.
    pub steer_cmd: f64,

    /// Throttle demand, between 0 and the maximum throttle.
    pub throttle_cmd: f64,
}

/// Status report for Planner processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Index of the goal waypoint at the end of this cycle.
    pub waypoint_index: usize,

    /// The goal being steered towards, if any.
    pub goal: Option<GeoPoint>,

    /// Distance from the current fix to the goal.
    pub distance_to_goal: DistanceEstimate,

    /// Heading error to the goal, if it could be determined.
    ///
    /// Units: radians, in (-pi, pi]
    pub heading_err_rad: Option<f64>,

    /// No fix pair was available this cycle.
    pub awaiting_fix: bool,

    /// The vehicle has not moved far enough to infer its direction of travel
    /// so it is being driven straight.
    pub heading_indeterminate: bool,

    /// The two distance estimators disagree by more than the cross check
    /// tolerance.
    pub distance_mismatch: bool,

    /// At least one waypoint was reached this cycle.
    pub waypoint_reached: bool,

    /// Every waypoint has been reached.
    pub route_complete: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Planner {

    /// Create a planner directly from a set of parameters.
    pub fn from_params(params: Params) -> Result<Self, PlannerError> {
        validate_params(&params)?;

        let waypoints = params.waypoints_deg
            .iter()
            .enumerate()
            .map(|(index, wp)| GeoPoint::from_degrees(wp[0], wp[1])
                .map_err(|source| PlannerError::InvalidWaypoint { index, source }))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Planner route loaded with {} waypoints", waypoints.len());
        for (i, wp) in waypoints.iter().enumerate() {
            debug!("    {}: {}", i, wp);
        }

        Ok(Self {
            params,
            waypoints,
            waypoint_index: 0
        })
    }

    /// The current goal, or `None` once the route is complete.
    pub fn current_goal(&self) -> Option<GeoPoint> {
        self.waypoints.get(self.waypoint_index).copied()
    }

    pub fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    pub fn num_waypoints(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_route_complete(&self) -> bool {
        self.waypoint_index >= self.waypoints.len()
    }

    /// Distance from `current` to the goal, advancing past every waypoint
    /// that is already within the arrival radius.
    fn advance_waypoints(
        &mut self,
        current: &GeoPoint,
        report: &mut StatusReport
    ) -> Option<(GeoPoint, DistanceEstimate)> {
        while let Some(goal) = self.current_goal() {
            let distance = estimate_distance(current, &goal, &self.params.geodesy);

            if distance.get(self.params.distance_method) >= self.params.arrival_radius_m {
                return Some((goal, distance))
            }

            info!(
                "Waypoint {} reached ({:.2} m away)",
                self.waypoint_index,
                distance.get(self.params.distance_method)
            );
            report.waypoint_reached = true;
            self.waypoint_index += 1;
        }

        info!("Route complete");
        None
    }
}

impl State for Planner {
    const NAME: &'static str = "Planner";

    type InitData = &'static str;
    type InitError = PlannerError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = PlannerError;

    /// Initialise the Planner module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)
            .map_err(PlannerError::ParamLoad)?;

        *self = Self::from_params(params)?;

        Ok(())
    }

    /// Perform cyclic processing of the Planner.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let mut report = StatusReport::default();

        if self.is_route_complete() {
            report.waypoint_index = self.waypoint_index;
            report.route_complete = true;
            return Ok((OutputData::default(), report))
        }

        let fixes = match input_data.fixes {
            Some(f) => f,
            None => {
                report.waypoint_index = self.waypoint_index;
                report.awaiting_fix = true;
                return Ok((OutputData::default(), report))
            }
        };

        let (goal, distance) = match self.advance_waypoints(&fixes.current, &mut report) {
            Some(g) => g,
            None => {
                report.waypoint_index = self.waypoint_index;
                report.route_complete = true;
                return Ok((OutputData::default(), report))
            }
        };

        report.waypoint_index = self.waypoint_index;
        report.goal = Some(goal);
        report.distance_to_goal = distance;

        // Cross check the estimators
        let mismatch = (distance.haversine_m - distance.planar_m).abs()
            / distance.haversine_m;
        if mismatch > DISTANCE_CROSS_CHECK_TOLERANCE {
            warn!(
                "Distance estimators disagree by {:.2}% (haversine {:.1} m, planar {:.1} m)",
                mismatch * 100.0, distance.haversine_m, distance.planar_m
            );
            report.distance_mismatch = true;
        }

        let distance_m = distance.get(self.params.distance_method);

        // Throttle falls off linearly inside the slow down radius
        let throttle_cmd = clamp(
            self.params.throttle_gain * distance_m / self.params.slow_down_radius_m,
            0.0,
            self.params.max_throttle
        );

        let steer_cmd = match compute_heading(
            &fixes.previous, &fixes.current, &goal, &self.params.geodesy
        ) {
            Ok(heading_err_rad) => {
                report.heading_err_rad = Some(heading_err_rad);
                clamp(self.params.steer_gain * heading_err_rad, -1.0, 1.0)
            },
            // Keep driving straight so the next fix gives a direction of
            // travel
            Err(e @ GeodesyError::HeadingIndeterminate { .. })
            | Err(e @ GeodesyError::GoalCoincident { .. }) => {
                debug!("{}, holding steering straight", e);
                report.heading_indeterminate = true;
                0.0
            },
            Err(e) => return Err(PlannerError::Geodesy(e))
        };

        debug!(
            "Goal {} at {:.2} m, heading error {:?} rad -> steer {:.3}, throttle {:.3}",
            self.waypoint_index, distance_m, report.heading_err_rad, steer_cmd, throttle_cmd
        );

        Ok((OutputData { steer_cmd, throttle_cmd }, report))
    }

    fn is_finished(&self) -> bool {
        self.is_route_complete()
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn validate_params(params: &Params) -> Result<(), PlannerError> {
    let invalid = |msg: &str| Err(PlannerError::InvalidParams(msg.to_string()));

    if params.waypoints_deg.is_empty() {
        return Err(PlannerError::NoWaypoints)
    }
    if !(params.arrival_radius_m > 0.0) {
        return invalid("arrival_radius_m must be positive")
    }
    if params.arrival_radius_m < params.geodesy.min_heading_displacement_m {
        return invalid("arrival_radius_m must not be less than min_heading_displacement_m")
    }
    if !(params.slow_down_radius_m > 0.0) {
        return invalid("slow_down_radius_m must be positive")
    }
    if !(params.max_throttle > 0.0 && params.max_throttle <= 1.0) {
        return invalid("max_throttle must be in (0, 1]")
    }
    if !params.steer_gain.is_finite() || !params.throttle_gain.is_finite() {
        return invalid("gains must be finite")
    }
    if !(params.geodesy.earth_radius_m > 0.0) {
        return invalid("earth_radius_m must be positive")
    }
    if !(params.geodesy.min_heading_displacement_m >= 0.0) {
        return invalid("min_heading_displacement_m must not be negative")
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geodesy::{DistanceMethod, GeodesyParams};
    use std::f64::consts::FRAC_PI_2;

    fn deg(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::from_degrees(lat, lon).unwrap()
    }

    fn params(waypoints_deg: Vec<[f64; 2]>) -> Params {
        Params {
            waypoints_deg,
            arrival_radius_m: 2.0,
            distance_method: DistanceMethod::Planar,
            steer_gain: 0.5,
            throttle_gain: 1.0,
            slow_down_radius_m: 10.0,
            max_throttle: 0.3,
            geodesy: GeodesyParams::default(),
        }
    }

    fn input(previous: GeoPoint, current: GeoPoint) -> InputData {
        InputData {
            fixes: Some(FixPair { previous, current })
        }
    }

    #[test]
    fn test_no_fix_stops() {
        let mut planner = Planner::from_params(params(vec![[32.881, -117.23]])).unwrap();

        let (out, report) = planner.proc(&InputData::default()).unwrap();
        assert_eq!(out, OutputData::default());
        assert!(report.awaiting_fix);
        assert!(!report.route_complete);
    }

    #[test]
    fn test_steers_towards_goal() {
        // Goal ~93 m east of the vehicle, which is travelling north
        let mut planner = Planner::from_params(params(vec![[32.8801, -117.229]])).unwrap();

        let (out, report) = planner.proc(
            &input(deg(32.8800, -117.2300), deg(32.8801, -117.2300))
        ).unwrap();

        assert!((report.heading_err_rad.unwrap() - FRAC_PI_2).abs() < 1e-3);
        assert!((out.steer_cmd - 0.5 * FRAC_PI_2).abs() < 1e-3);
        assert_eq!(out.throttle_cmd, 0.3);
        assert!((report.distance_to_goal.planar_m - 93.4).abs() < 1.0);
        assert!(!report.distance_mismatch);
        assert!(!report.heading_indeterminate);
    }

    #[test]
    fn test_steering_saturates() {
        // Goal directly behind
        let mut planner = Planner::from_params(params(vec![[32.8700, -117.2300]])).unwrap();

        let (out, _) = planner.proc(
            &input(deg(32.8800, -117.2300), deg(32.8801, -117.2300))
        ).unwrap();

        assert_eq!(out.steer_cmd.abs(), 1.0);
    }

    #[test]
    fn test_stationary_drives_straight() {
        let mut planner = Planner::from_params(params(vec![[32.8801, -117.229]])).unwrap();
        let here = deg(32.8801, -117.2300);

        let (out, report) = planner.proc(&input(here, here)).unwrap();

        assert!(report.heading_indeterminate);
        assert_eq!(report.heading_err_rad, None);
        assert_eq!(out.steer_cmd, 0.0);
        assert_eq!(out.throttle_cmd, 0.3);
    }

    #[test]
    fn test_slows_near_goal() {
        let mut p = params(vec![[32.88015, -117.2300]]);
        p.max_throttle = 1.0;
        let mut planner = Planner::from_params(p).unwrap();

        // ~5.6 m short of the goal, heading straight at it
        let (out, report) = planner.proc(
            &input(deg(32.8800, -117.2300), deg(32.8801, -117.2300))
        ).unwrap();

        let expected = report.distance_to_goal.planar_m / 10.0;
        assert!((out.throttle_cmd - expected).abs() < 1e-9);
        assert!(out.throttle_cmd > 0.4 && out.throttle_cmd < 0.7);
        assert!(out.steer_cmd.abs() < 1e-6);
    }

    #[test]
    fn test_waypoint_advance_and_completion() {
        let mut planner = Planner::from_params(params(vec![
            [32.8801, -117.2300],
            [32.8801, -117.2290],
        ])).unwrap();
        assert_eq!(planner.num_waypoints(), 2);

        // Arrive at the first waypoint, travelling north
        let (out, report) = planner.proc(
            &input(deg(32.8800, -117.2300), deg(32.88009, -117.2300))
        ).unwrap();

        assert!(report.waypoint_reached);
        assert_eq!(planner.waypoint_index(), 1);
        assert_eq!(report.goal, Some(deg(32.8801, -117.2290)));
        assert!(out.steer_cmd > 0.7);

        // Arrive at the last waypoint
        let (out, report) = planner.proc(
            &input(deg(32.8801, -117.2291), deg(32.8801, -117.22901))
        ).unwrap();

        assert!(report.waypoint_reached);
        assert!(report.route_complete);
        assert!(planner.is_route_complete());
        assert_eq!(planner.current_goal(), None);
        assert_eq!(out, OutputData::default());

        // Stays complete
        let (out, report) = planner.proc(
            &input(deg(32.8700, -117.2300), deg(32.8701, -117.2300))
        ).unwrap();
        assert!(report.route_complete);
        assert!(!report.waypoint_reached);
        assert_eq!(out, OutputData::default());
    }

    #[test]
    fn test_skips_waypoints_inside_arrival_radius() {
        let mut planner = Planner::from_params(params(vec![
            [32.8801, -117.2300],
            [32.880101, -117.2300],
            [32.8810, -117.2300],
        ])).unwrap();

        let (_, report) = planner.proc(
            &input(deg(32.8800, -117.2300), deg(32.8801, -117.2300))
        ).unwrap();

        assert!(report.waypoint_reached);
        assert_eq!(report.waypoint_index, 2);
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            Planner::from_params(params(vec![])),
            Err(PlannerError::NoWaypoints)
        ));
        assert!(matches!(
            Planner::from_params(params(vec![[32.88, -117.23], [95.0, 0.0]])),
            Err(PlannerError::InvalidWaypoint { index: 1, .. })
        ));

        let mut p = params(vec![[32.88, -117.23]]);
        p.arrival_radius_m = 0.1;
        assert!(matches!(
            Planner::from_params(p),
            Err(PlannerError::InvalidParams(_))
        ));

        let mut p = params(vec![[32.88, -117.23]]);
        p.max_throttle = 1.5;
        assert!(matches!(
            Planner::from_params(p),
            Err(PlannerError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_params_from_toml() {
        let p: Params = util::params::from_toml_str(r#"
            waypoints_deg = [[32.8801, -117.2300], [32.8810, -117.2290]]
            arrival_radius_m = 2.0
            distance_method = "Haversine"
            steer_gain = 0.5
            throttle_gain = 1.0
            slow_down_radius_m = 10.0
            max_throttle = 0.3
        "#).unwrap();

        assert_eq!(p.distance_method, DistanceMethod::Haversine);
        assert_eq!(p.geodesy, GeodesyParams::default());

        let planner = Planner::from_params(p).unwrap();
        assert_eq!(planner.current_goal(), Some(deg(32.8801, -117.2300)));
    }

    #[test]
    fn test_replay_sample_drive() {
        use crate::gps::{GpsTracker, SentenceSource};

        let mut planner = Planner::from_params(params(vec![[32.8812307, -117.2332711]])).unwrap();
        let mut source = SentenceSource::new(
            include_str!("../../../data/sample_drive.nmea").as_bytes()
        );
        let mut tracker = GpsTracker::new();
        let mut num_steered = 0;

        while let Some(fix) = source.next_fix().unwrap() {
            tracker.push(fix);

            let (out, report) = planner.proc(&InputData { fixes: tracker.fix_pair() }).unwrap();

            if report.route_complete {
                break
            }

            // The vehicle is driving straight at the goal
            if report.heading_err_rad.is_some() {
                num_steered += 1;
                assert!(out.steer_cmd.abs() < 0.1, "steer {}", out.steer_cmd);
                assert!(out.throttle_cmd > 0.0);
            }
        }

        assert!(planner.is_route_complete());
        assert!(num_steered > 10);
        assert_eq!(source.num_rejected(), 1);
    }
}
