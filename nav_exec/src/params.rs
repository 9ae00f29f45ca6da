//! Parameters for the navigation executable

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::actuator::{PwmSteering, PwmThrottle};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the drive loop and its actuators.
#[derive(Debug, Clone, Deserialize)]
pub struct NavExecParams {

    /// Rate of the drive loop.
    ///
    /// Units: hertz
    pub drive_loop_hz: f64,

    /// Number of cycles after which the drive loop stops regardless of
    /// progress.
    pub max_loops: u64,

    /// PWM frequency of the driver board.
    ///
    /// Units: hertz
    #[serde(default = "default_pwm_freq_hz")]
    pub pwm_freq_hz: f64,

    /// I2C address of the driver board.
    #[serde(default = "default_pwm_board_address")]
    pub pwm_board_address: u8,

    #[serde(default)]
    pub steering: PwmSteering,

    #[serde(default)]
    pub throttle: PwmThrottle,
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_pwm_freq_hz() -> f64 {
    60.0
}

fn default_pwm_board_address() -> u8 {
    0x40
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let p: NavExecParams = util::params::from_toml_str(
            "drive_loop_hz = 20.0\nmax_loops = 100000\n"
        ).unwrap();

        assert_eq!(p.drive_loop_hz, 20.0);
        assert_eq!(p.max_loops, 100_000);
        assert_eq!(p.pwm_freq_hz, 60.0);
        assert_eq!(p.pwm_board_address, 0x40);
        assert_eq!(p.steering, PwmSteering::default());
        assert_eq!(p.throttle, PwmThrottle::default());
    }

    #[test]
    fn test_params_actuators() {
        let p: NavExecParams = util::params::from_toml_str(r#"
            drive_loop_hz = 10.0
            max_loops = 50

            [steering]
            channel = 0
            left_pulse = 300
            right_pulse = 420

            [throttle]
            channel = 3
            max_pulse = 470
            zero_pulse = 380
            min_pulse = 290
        "#).unwrap();

        assert_eq!(p.steering.channel, 0);
        assert_eq!(p.steering.pulse(1.0), Ok(420));
        assert_eq!(p.throttle.zero_pulse, 380);
    }
}
