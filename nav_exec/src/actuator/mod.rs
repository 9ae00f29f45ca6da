//! # Actuator module
//!
//! Converts the planner's normalised steering and throttle demands into PWM
//! pulses for the steering servo and the motor speed controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`PwmDriver`] implementation for the PCA9685 16 channel PWM driver board.
pub mod pca9685;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Internal
use crate::planner::OutputData;
use util::maths::{clamp, lin_map};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing PWM driver boards.
pub trait PwmDriver {

    /// Set the pulse length on a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel index on the board
    /// - `pulse` - The pulse length in board ticks
    fn set_pulse(&mut self, channel: u8, pulse: u16) -> Result<(), ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Calibration of the steering servo.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PwmSteering {
    pub channel: u8,

    /// Pulse for full left lock.
    pub left_pulse: u16,

    /// Pulse for full right lock.
    pub right_pulse: u16,
}

/// Calibration of the motor speed controller.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PwmThrottle {
    pub channel: u8,

    /// Pulse for full forward throttle.
    pub max_pulse: u16,

    /// Pulse for stopped.
    pub zero_pulse: u16,

    /// Pulse for full reverse throttle.
    pub min_pulse: u16,
}

/// The steering and throttle actuators sharing one driver board.
pub struct Actuators<D> {
    driver: D,
    steering: PwmSteering,
    throttle: PwmThrottle,
}

/// A driver which only logs and records the demanded pulses.
///
/// Used for dry runs, or when no driver board is attached.
#[derive(Debug, Default)]
pub struct LogDriver {
    pulses: HashMap<u8, u16>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ActuatorError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Channel {0} does not exist on the driver board")]
    InvalidChannel(u8),

    #[error("Pulse {0} is longer than the driver's PWM period")]
    PulseOutOfRange(u16),

    #[error("Actuator demand {0} is not finite")]
    NonFiniteCommand(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PwmSteering {
    fn default() -> Self {
        Self {
            channel: 1,
            left_pulse: 276,
            right_pulse: 450,
        }
    }
}

impl Default for PwmThrottle {
    fn default() -> Self {
        Self {
            channel: 2,
            max_pulse: 480,
            zero_pulse: 391,
            min_pulse: 270,
        }
    }
}

impl PwmSteering {
    /// Get the pulse for a steering demand in [-1, 1], -1 being full left.
    ///
    /// Demands outside the range are clamped.
    pub fn pulse(&self, steer_cmd: f64) -> Result<u16, ActuatorError> {
        check_finite(steer_cmd)?;

        let pulse = lin_map(
            (-1.0, 1.0),
            (self.left_pulse as f64, self.right_pulse as f64),
            clamp(steer_cmd, -1.0, 1.0)
        );

        Ok(pulse.round() as u16)
    }

    /// Pulse for the wheels pointing straight ahead.
    pub fn centre_pulse(&self) -> u16 {
        ((self.left_pulse as u32 + self.right_pulse as u32) / 2) as u16
    }
}

impl PwmThrottle {
    /// Get the pulse for a throttle demand in [-1, 1], negative being reverse.
    ///
    /// Demands outside the range are clamped.
    pub fn pulse(&self, throttle_cmd: f64) -> Result<u16, ActuatorError> {
        check_finite(throttle_cmd)?;

        let throttle_cmd = clamp(throttle_cmd, -1.0, 1.0);

        let pulse = if throttle_cmd > 0.0 {
            lin_map(
                (0.0, 1.0),
                (self.zero_pulse as f64, self.max_pulse as f64),
                throttle_cmd
            )
        }
        else {
            lin_map(
                (-1.0, 0.0),
                (self.min_pulse as f64, self.zero_pulse as f64),
                throttle_cmd
            )
        };

        Ok(pulse.round() as u16)
    }
}

impl<D: PwmDriver> Actuators<D> {
    pub fn new(driver: D, steering: PwmSteering, throttle: PwmThrottle) -> Self {
        Self {
            driver,
            steering,
            throttle
        }
    }

    /// Drive both actuators with the planner's demands.
    pub fn actuate(&mut self, demands: &OutputData) -> Result<(), ActuatorError> {
        let steer_pulse = self.steering.pulse(demands.steer_cmd)?;
        let throttle_pulse = self.throttle.pulse(demands.throttle_cmd)?;

        trace!(
            "Steering pulse {} (demand {:.3}), throttle pulse {} (demand {:.3})",
            steer_pulse, demands.steer_cmd, throttle_pulse, demands.throttle_cmd
        );

        self.driver.set_pulse(self.steering.channel, steer_pulse)?;
        self.driver.set_pulse(self.throttle.channel, throttle_pulse)
    }

    /// Stop the motor and centre the steering.
    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.driver.set_pulse(self.throttle.channel, self.throttle.zero_pulse)?;
        self.driver.set_pulse(self.steering.channel, self.steering.centre_pulse())
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl LogDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last pulse set on a channel.
    pub fn last_pulse(&self, channel: u8) -> Option<u16> {
        self.pulses.get(&channel).copied()
    }
}

impl PwmDriver for LogDriver {
    fn set_pulse(&mut self, channel: u8, pulse: u16) -> Result<(), ActuatorError> {
        if channel >= pca9685::NUM_CHANNELS {
            return Err(ActuatorError::InvalidChannel(channel))
        }

        trace!("PWM channel {} -> {}", channel, pulse);
        self.pulses.insert(channel, pulse);

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_finite(cmd: f64) -> Result<(), ActuatorError> {
    if cmd.is_finite() {
        Ok(())
    }
    else {
        Err(ActuatorError::NonFiniteCommand(cmd))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_steering_pulse() {
        let steering = PwmSteering::default();

        assert_eq!(steering.pulse(-1.0), Ok(276));
        assert_eq!(steering.pulse(1.0), Ok(450));
        assert_eq!(steering.pulse(0.0), Ok(363));
        assert_eq!(steering.pulse(0.0), Ok(steering.centre_pulse()));
        assert_eq!(steering.pulse(-3.0), Ok(276));
        assert!(matches!(
            steering.pulse(f64::NAN),
            Err(ActuatorError::NonFiniteCommand(_))
        ));
    }

    #[test]
    fn test_throttle_pulse() {
        let throttle = PwmThrottle::default();

        assert_eq!(throttle.pulse(0.0), Ok(391));
        assert_eq!(throttle.pulse(1.0), Ok(480));
        assert_eq!(throttle.pulse(-1.0), Ok(270));
        assert_eq!(throttle.pulse(0.5), Ok(436));
        assert_eq!(throttle.pulse(2.0), Ok(480));
        assert_eq!(
            throttle.pulse(f64::INFINITY),
            Err(ActuatorError::NonFiniteCommand(f64::INFINITY))
        );
    }

    #[test]
    fn test_actuate_and_stop() {
        let mut actuators = Actuators::new(
            LogDriver::new(),
            PwmSteering::default(),
            PwmThrottle::default()
        );

        actuators.actuate(&OutputData { steer_cmd: 1.0, throttle_cmd: 0.3 }).unwrap();
        assert_eq!(actuators.driver().last_pulse(1), Some(450));
        assert_eq!(actuators.driver().last_pulse(2), Some(418));

        actuators.stop().unwrap();
        assert_eq!(actuators.driver().last_pulse(1), Some(363));
        assert_eq!(actuators.driver().last_pulse(2), Some(391));
    }

    #[test]
    fn test_invalid_channel() {
        let mut actuators = Actuators::new(
            LogDriver::new(),
            PwmSteering { channel: 16, ..Default::default() },
            PwmThrottle::default()
        );

        assert_eq!(
            actuators.actuate(&OutputData::default()),
            Err(ActuatorError::InvalidChannel(16))
        );
    }
}
