//! Error types for the LT8500 driver.

use core::fmt;

use crate::registers::RangeError;
use crate::State;

/// Everything that can go wrong while talking to the LT8500.
///
/// `SpiE` is the error type of the serial bus. `PinE` is the error type shared
/// by the strobe (LDIBLANK) and boot-detect (SDO) lines.
///
/// The LT8500 never acknowledges a frame, so a `Bus` or `Pin` error means the
/// chip may or may not have latched what was sent. The driver does not retry;
/// the caller decides whether to resend or to [`crate::Lt8500::reset`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SpiE, PinE> {
    /// The serial bus reported a failure
    Bus(SpiE),
    /// Driving the strobe line, or reading the detect line, failed
    Pin(PinE),
    /// The detect line did not go low within the boot timeout
    BootTimeout,
    /// Channels are numbered 1 to 48
    InvalidChannel(u8),
    /// PWM values are 12 bits wide
    InvalidPwm(u16),
    /// Correction values are 6 bits wide
    InvalidCorrection(u8),
    /// A command frame was requested before [`crate::Lt8500::begin`] finished
    NotReady(State),
    /// The chip's self test is not supported by this driver
    NotImplemented,
}

impl<SpiE, PinE> From<RangeError> for Error<SpiE, PinE> {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::Channel(channel) => Error::InvalidChannel(channel),
            RangeError::Pwm(value) => Error::InvalidPwm(value),
            RangeError::Correction(value) => Error::InvalidCorrection(value),
        }
    }
}

impl<SpiE, PinE> fmt::Display for Error<SpiE, PinE>
where
    SpiE: fmt::Debug,
    PinE: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "serial bus error: {:?}", e),
            Self::Pin(e) => write!(f, "control line error: {:?}", e),
            Self::BootTimeout => write!(f, "LT8500 did not finish booting"),
            Self::InvalidChannel(channel) => {
                write!(f, "channel {} is outside 1..=48", channel)
            }
            Self::InvalidPwm(value) => write!(f, "PWM value {} does not fit 12 bits", value),
            Self::InvalidCorrection(value) => {
                write!(f, "correction value {} does not fit 6 bits", value)
            }
            Self::NotReady(state) => write!(f, "driver not ready (state {:?})", state),
            Self::NotImplemented => write!(f, "self test is not implemented"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    type TestError = Error<(), ()>;

    #[test]
    fn range_errors_map_onto_driver_errors() {
        assert_eq!(
            TestError::from(RangeError::Channel(49)),
            Error::InvalidChannel(49)
        );
        assert_eq!(
            TestError::from(RangeError::Pwm(4096)),
            Error::InvalidPwm(4096)
        );
        assert_eq!(
            TestError::from(RangeError::Correction(64)),
            Error::InvalidCorrection(64)
        );
    }

    #[test]
    fn display_names_the_problem() {
        assert_eq!(
            TestError::InvalidChannel(0).to_string(),
            "channel 0 is outside 1..=48"
        );
        assert_eq!(
            TestError::NotReady(State::Uninitialized).to_string(),
            "driver not ready (state Uninitialized)"
        );
    }
}
