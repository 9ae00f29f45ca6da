//! GPS navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging, parameters and modules
//!     - Spawn the GPS reader thread, which decodes sentences from the input
//!       stream and sends positions to the drive loop
//!     - Drive loop, at a fixed rate:
//!         - Take the next GPS fix, if one has arrived
//!         - Planner processing: heading error and distance to the goal into
//!           steering and throttle demands
//!         - Actuation of the demands
//!     - Stop the vehicle and save a summary of the route into the session
//!
//! GPS sentences are read from stdin unless a file is given, so a serial
//! receiver can be attached with e.g. `nav_exec < /dev/ttyS0`. At most one fix
//! is consumed per cycle, which paces a recorded file to the loop rate.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use nav_lib::{
    actuator::{Actuators, LogDriver, PwmDriver},
    geodesy::GeoPoint,
    gps::{GpsTracker, SentenceSource},
    params::NavExecParams,
    planner::{InputData, Planner, StatusReport},
};
use util::{
    logger::{logger_init, LevelFilter, LoggerConfig, TargetLevel},
    module::{init_module, State},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Command line options
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec", about = "Drive the vehicle along a route of GPS waypoints")]
struct Opt {
    /// File of NMEA sentences to read instead of stdin
    #[structopt(short, long, parse(from_os_str))]
    input: Option<PathBuf>,

    /// Only log the actuator pulses, even if a driver board is available
    #[structopt(long)]
    dry_run: bool,

    /// Log level for all targets, at least `info`
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,

    /// Level for one target and its children, e.g. `nav_lib::gps=info`.
    /// May be given more than once.
    #[structopt(long = "log-filter")]
    log_filters: Vec<TargetLevel>,
}

/// Summary of the run, saved into the session directory.
#[derive(Debug, Default, Serialize)]
struct RouteSummary {
    num_cycles: u64,
    num_fixes: u64,
    num_steered_cycles: u64,
    num_waypoints: usize,
    waypoints_reached: usize,
    route_complete: bool,
    last_report: Option<StatusReport>,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "nav_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_config = LoggerConfig {
        level: opt.log_level,
        target_levels: opt.log_filters.clone()
    };
    logger_init(&log_config, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("GPS Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let params: NavExecParams = util::params::load("nav_exec.toml")
        .wrap_err("Could not load exec params")?;

    if !(params.drive_loop_hz > 0.0) {
        return Err(eyre!(
            "Expected a positive drive loop rate, found {} Hz", params.drive_loop_hz)
        );
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut planner = Planner::default();
    init_module(&mut planner, "planner.toml")
        .wrap_err("Failed to initialise Planner")?;

    // ---- INITIALISE GPS ----

    let reader: Box<dyn BufRead + Send> = match opt.input {
        Some(ref path) => {
            info!("Reading GPS sentences from {:?}", path);
            Box::new(BufReader::new(
                File::open(path).wrap_err("Failed to open the GPS input file")?
            ))
        },
        None => {
            info!("Reading GPS sentences from stdin");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    let fix_rx = spawn_gps_reader(reader);

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let summary = if opt.dry_run {
        info!("Dry run, actuator pulses will only be logged");
        drive(Actuators::new(LogDriver::new(), params.steering, params.throttle),
            &params, &mut planner, fix_rx)?
    }
    else {
        drive_with_board(&params, &mut planner, fix_rx)?
    };

    // ---- SHUTDOWN ----

    info!(
        "Drive loop finished after {} cycles, {}/{} waypoints reached",
        summary.num_cycles, summary.waypoints_reached, summary.num_waypoints
    );

    session.save("route_summary.json", &summary)
        .wrap_err("Failed to save the route summary")?;

    Ok(())
}

/// Run the drive loop with the PCA9685 driver board.
#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn drive_with_board(
    params: &NavExecParams,
    planner: &mut Planner,
    fix_rx: Receiver<GeoPoint>
) -> Result<RouteSummary, Report> {
    use pwm_pca9685::{Address, Pca9685};

    let i2c = rppal::i2c::I2c::new()
        .wrap_err("Failed to open the I2C bus")?;

    let mut board = Pca9685::new(i2c, Address::from(params.pwm_board_address))
        .map_err(|e| eyre!("Failed to initialise the PCA9685: {:?}", e))?;

    // The board's 25 MHz oscillator is divided down to the PWM frequency
    let prescale = ((25_000_000.0 / (4096.0 * params.pwm_freq_hz)).round() - 1.0) as u8;
    board.set_prescale(prescale)
        .map_err(|e| eyre!("Failed to set the PCA9685 prescale: {:?}", e))?;
    board.enable()
        .map_err(|e| eyre!("Failed to enable the PCA9685: {:?}", e))?;

    info!("PCA9685 initialised at {} Hz", params.pwm_freq_hz);

    drive(Actuators::new(board, params.steering, params.throttle), params, planner, fix_rx)
}

/// Run the drive loop, no driver board is available on this platform.
#[cfg(not(all(target_arch = "arm", target_os = "linux")))]
fn drive_with_board(
    params: &NavExecParams,
    planner: &mut Planner,
    fix_rx: Receiver<GeoPoint>
) -> Result<RouteSummary, Report> {
    warn!("No PWM driver board support on this platform, actuator pulses will only be logged");

    drive(Actuators::new(LogDriver::new(), params.steering, params.throttle), params, planner, fix_rx)
}

/// The fixed rate drive loop.
///
/// Returns once the route is complete, the GPS input ends, or the maximum
/// number of cycles is reached. The vehicle is always stopped on return.
fn drive<D: PwmDriver>(
    mut actuators: Actuators<D>,
    params: &NavExecParams,
    planner: &mut Planner,
    fix_rx: Receiver<GeoPoint>
) -> Result<RouteSummary, Report> {

    let cycle_period = Duration::from_secs_f64(1.0 / params.drive_loop_hz);
    let mut tracker = GpsTracker::new();
    let mut summary = RouteSummary {
        num_waypoints: planner.num_waypoints(),
        ..Default::default()
    };

    info!("Entering drive loop at {} Hz", params.drive_loop_hz);

    let result = (|| -> Result<(), Report> {
        for _ in 0..params.max_loops {
            let cycle_start = Instant::now();
            summary.num_cycles += 1;

            // ---- GPS ----

            // Disconnected is only reported once every sent fix is taken
            let input_ended = match fix_rx.try_recv() {
                Ok(fix) => {
                    tracker.push(fix);
                    false
                },
                Err(TryRecvError::Empty) => false,
                Err(TryRecvError::Disconnected) => true
            };

            // ---- PLANNER ----

            let (demands, report) = planner
                .proc(&InputData { fixes: tracker.fix_pair() })
                .wrap_err("Error during Planner processing")?;

            summary.last_report = Some(report);
            if report.heading_err_rad.is_some() {
                summary.num_steered_cycles += 1;
            }

            if report.route_complete {
                info!("Route complete, stopping");
                break
            }

            // ---- ACTUATORS ----

            actuators.actuate(&demands)
                .wrap_err("Failed to actuate demands")?;

            if input_ended {
                warn!("GPS input ended before the route was complete");
                break
            }

            // ---- CYCLE MANAGEMENT ----

            match cycle_period.checked_sub(cycle_start.elapsed()) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    (cycle_start.elapsed() - cycle_period).as_secs_f64()
                )
            }
        }

        Ok(())
    })();

    // Stop even if the loop failed
    actuators.stop().wrap_err("Failed to stop the vehicle")?;
    info!("Vehicle stopped");

    result?;

    summary.num_fixes = tracker.num_fixes();
    summary.waypoints_reached = planner.waypoint_index();
    summary.route_complete = planner.is_finished();

    Ok(summary)
}

/// Spawn the thread which reads GPS sentences and sends decoded fixes to the
/// drive loop. The channel disconnects when the input ends.
fn spawn_gps_reader(reader: Box<dyn BufRead + Send>) -> Receiver<GeoPoint> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut source = SentenceSource::new(reader);

        loop {
            match source.next_fix() {
                Ok(Some(fix)) => {
                    if tx.send(fix).is_err() {
                        debug!("Drive loop has exited, stopping GPS reader");
                        break
                    }
                },
                Ok(None) => {
                    info!("End of GPS input ({} sentences rejected)", source.num_rejected());
                    break
                },
                Err(e) => {
                    warn!("Failed to read GPS input: {}", e);
                    break
                }
            }
        }
    });

    rx
}
