//! [`PwmDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use pwm_pca9685::{Channel, Pca9685};
use embedded_hal::blocking::i2c::{Write, WriteRead};

use super::{ActuatorError, PwmDriver};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of PWM channels on the board.
pub const NUM_CHANNELS: u8 = 16;

/// Longest pulse the 12 bit counter can produce.
pub const MAX_PULSE: u16 = 4095;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> PwmDriver for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    fn set_pulse(&mut self, channel: u8, pulse: u16) -> Result<(), ActuatorError> {

        // If the pulse is out of range return an error
        if pulse > MAX_PULSE {
            return Err(ActuatorError::PulseOutOfRange(pulse))
        }

        // Pulse starts at the beginning of the period and ends after `pulse`
        // ticks
        match self.set_channel_on_off(channel_from_index(channel)?, 0, pulse) {
            Ok(_) => Ok(()),
            Err(pwm_pca9685::Error::I2C(_)) => Err(ActuatorError::I2c),
            Err(pwm_pca9685::Error::InvalidInputData) => Err(ActuatorError::PulseOutOfRange(pulse))
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn channel_from_index(index: u8) -> Result<Channel, ActuatorError> {
    Ok(match index {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        _ => return Err(ActuatorError::InvalidChannel(index))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_channel_from_index() {
        assert!(matches!(channel_from_index(0), Ok(Channel::C0)));
        assert!(matches!(channel_from_index(15), Ok(Channel::C15)));
        assert_eq!(
            channel_from_index(NUM_CHANNELS).err(),
            Some(ActuatorError::InvalidChannel(16))
        );
    }
}
