//! Logging for the navigation executable
//!
//! Every line is stamped with the session elapsed time and written to stdout
//! and the session log file. The overall level can be lowered per target, so
//! for example the GPS decoder can be silenced while the planner is traced:
//!
//! ```text
//! nav_exec --log-level info --log-filter nav_lib::planner=trace
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::info;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Crate prefixes removed from targets when they are printed.
const TRIMMED_TARGET_PREFIXES: [&str; 2] = ["nav_lib::", "util::"];

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Logger settings for one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    /// Level for every target without an override. Must be at least `Info`.
    pub level: LevelFilter,

    /// Per target overrides, applied to the target and all of its children.
    pub target_levels: Vec<TargetLevel>,
}

/// A level for a single log target, written as `target=level`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetLevel {
    pub target: String,
    pub level: LevelFilter,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Expected a target filter of the form `target=level`, found {0:?}")]
    InvalidTargetFilter(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Debug,
            target_levels: Vec::new()
        }
    }
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<(), LoggerInitError> {
        // Info lines carry the session header, so they are never filtered
        // globally
        if self.level < LevelFilter::Info {
            return Err(LoggerInitError::InvalidMinLogLevel(self.level))
        }

        Ok(())
    }
}

impl FromStr for TargetLevel {
    type Err = LoggerInitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LoggerInitError::InvalidTargetFilter(s.to_string());

        let (target, level) = match s.split_once('=') {
            Some((t, l)) => (t.trim(), l.trim()),
            None => return Err(invalid())
        };

        if target.is_empty() {
            return Err(invalid())
        }

        Ok(Self {
            target: target.to_string(),
            level: level.parse().map_err(|_| invalid())?
        })
    }
}

impl fmt::Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.target, self.level)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    config: &LoggerConfig,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    config.validate()?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(config.level);

    for t in &config.target_levels {
        dispatch = dispatch.level_for(t.target.clone(), t.level);
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", config.level);
    for t in &config.target_levels {
        info!("    Target level: {}", t);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Format one log line. Debug and trace lines include the target.
fn format_line(
    elapsed_s: f64,
    level: log::Level,
    target: &str,
    message: &fmt::Arguments
) -> String {
    if level > log::Level::Info {
        format!(
            "[{:10.6} {}] {}: {}",
            elapsed_s,
            level_to_str(level),
            trim_target(target),
            message
        )
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, level_to_str(level), message)
    }
}

fn trim_target(target: &str) -> &str {
    TRIMMED_TARGET_PREFIXES
        .iter()
        .find_map(|p| target.strip_prefix(p))
        .unwrap_or(target)
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}
