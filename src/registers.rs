//! The in-memory mirror of the LT8500's registers.
//!
//! The LT8500 has a *write-only* interface, so the driver has to keep its own
//! copy of every PWM and correction value. The copies are held already packed
//! in the chip's wire layout; sending a frame is then just a matter of
//! shifting the buffer out.

use core::fmt;

use crate::pack::{pack12, pack6, unpack12, unpack6};
use crate::{
    CORRECTION_BUFFER_LEN, FRAME_LEN, MAX_CORRECTION, MAX_PWM, NUM_CHANNELS, PWM_BUFFER_LEN,
};

//
// Public Types
//

/// A channel number or value was outside what the chip accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeError {
    /// Channel was not in `1..=48`
    Channel(u8),
    /// PWM value was above 4095
    Pwm(u16),
    /// Correction value was above 63
    Correction(u8),
}

/// Packed PWM and correction registers for all 48 channels.
///
/// Channels are numbered from 1 here, as on the datasheet pinout. Everything
/// is range checked on the way in, so the packed buffers can never hold a
/// value that bleeds into a neighbouring channel.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterStore {
    pwm: [u8; PWM_BUFFER_LEN],
    correction: [u8; CORRECTION_BUFFER_LEN],
}

//
// impls on Public Types
//

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(channel) => write!(f, "channel {} is outside 1..=48", channel),
            Self::Pwm(value) => write!(f, "PWM value {} does not fit 12 bits", value),
            Self::Correction(value) => write!(f, "correction value {} does not fit 6 bits", value),
        }
    }
}

impl Default for RegisterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegisterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterStore")
            .field("pwm", &&self.pwm[..])
            .field("correction", &&self.correction[..])
            .finish()
    }
}

impl RegisterStore {
    /// Create a register mirror with every value at zero.
    pub const fn new() -> RegisterStore {
        RegisterStore {
            pwm: [0; PWM_BUFFER_LEN],
            correction: [0; CORRECTION_BUFFER_LEN],
        }
    }

    /// Put every PWM and correction value back to zero.
    pub fn clear(&mut self) {
        self.pwm = [0; PWM_BUFFER_LEN];
        self.correction = [0; CORRECTION_BUFFER_LEN];
    }

    /// Set the 12-bit PWM duty cycle of one channel.
    pub fn set_pwm(&mut self, channel: u8, value: u16) -> Result<(), RangeError> {
        let index = Self::index(channel)?;
        if value > MAX_PWM {
            return Err(RangeError::Pwm(value));
        }
        pack12(&mut self.pwm, index, value);
        Ok(())
    }

    /// Get the PWM duty cycle last set for a channel.
    pub fn get_pwm(&self, channel: u8) -> Result<u16, RangeError> {
        let index = Self::index(channel)?;
        Ok(unpack12(&self.pwm, index))
    }

    /// Set the 6-bit correction factor of one channel.
    ///
    /// See [`crate::corrected_pwm`] for what the chip does with it.
    pub fn set_correction(&mut self, channel: u8, value: u8) -> Result<(), RangeError> {
        let index = Self::index(channel)?;
        if value > MAX_CORRECTION {
            return Err(RangeError::Correction(value));
        }
        pack6(&mut self.correction, index, value);
        Ok(())
    }

    /// Get the correction factor last set for a channel.
    pub fn get_correction(&self, channel: u8) -> Result<u8, RangeError> {
        let index = Self::index(channel)?;
        Ok(unpack6(&self.correction, index))
    }

    /// Set every channel to the same PWM duty cycle.
    pub fn set_all_pwm(&mut self, value: u16) -> Result<(), RangeError> {
        if value > MAX_PWM {
            return Err(RangeError::Pwm(value));
        }
        for index in 0..NUM_CHANNELS {
            pack12(&mut self.pwm, index, value);
        }
        Ok(())
    }

    /// Set every channel to the same correction factor.
    pub fn set_all_correction(&mut self, value: u8) -> Result<(), RangeError> {
        if value > MAX_CORRECTION {
            return Err(RangeError::Correction(value));
        }
        for index in 0..NUM_CHANNELS {
            pack6(&mut self.correction, index, value);
        }
        Ok(())
    }

    /// The packed PWM registers, in the order they are stored (channel 1 in
    /// the lowest bits of byte 0).
    pub fn pwm_buffer(&self) -> &[u8; PWM_BUFFER_LEN] {
        &self.pwm
    }

    /// The packed correction registers.
    pub fn correction_buffer(&self) -> &[u8; CORRECTION_BUFFER_LEN] {
        &self.correction
    }

    /// Build the payload of a correction frame.
    ///
    /// A correction frame uses the same 12-bits-per-channel layout as an
    /// update frame, with each 6-bit correction value in the top six bits of
    /// its slot.
    pub fn correction_frame(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        for index in 0..NUM_CHANNELS {
            let value = u16::from(unpack6(&self.correction, index)) << 6;
            pack12(&mut frame, index, value);
        }
        frame
    }

    /// Convert a 1-based channel number into a packed slot index.
    fn index(channel: u8) -> Result<usize, RangeError> {
        match channel {
            1..=48 => Ok(usize::from(channel - 1)),
            _ => Err(RangeError::Channel(channel)),
        }
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let store = RegisterStore::new();
        assert!(store.pwm_buffer().iter().all(|b| *b == 0));
        assert!(store.correction_buffer().iter().all(|b| *b == 0));
        assert_eq!(store, RegisterStore::default());
    }

    #[test]
    fn channel_one_is_the_first_slot() {
        let mut store = RegisterStore::new();
        store.set_pwm(1, 4095).unwrap();
        store.set_pwm(2, 0).unwrap();
        let pwm = store.pwm_buffer();
        assert_eq!(pwm[0], 0xFF);
        assert_eq!(pwm[1], 0x0F);
        assert_eq!(pwm[2], 0x00);

        store.set_correction(1, 63).unwrap();
        assert_eq!(store.correction_buffer()[0], 0x3F);
    }

    #[test]
    fn values_read_back_per_channel() {
        let mut store = RegisterStore::new();
        for channel in 1..=48u8 {
            store.set_pwm(channel, u16::from(channel) * 85).unwrap();
            store.set_correction(channel, channel + 15).unwrap();
        }
        for channel in 1..=48u8 {
            assert_eq!(store.get_pwm(channel), Ok(u16::from(channel) * 85));
            assert_eq!(store.get_correction(channel), Ok(channel + 15));
        }
    }

    #[test]
    fn bad_channels_are_rejected() {
        let mut store = RegisterStore::new();
        assert_eq!(store.set_pwm(0, 1), Err(RangeError::Channel(0)));
        assert_eq!(store.set_pwm(49, 1), Err(RangeError::Channel(49)));
        assert_eq!(store.get_pwm(0), Err(RangeError::Channel(0)));
        assert_eq!(store.set_correction(255, 1), Err(RangeError::Channel(255)));
        assert_eq!(store.get_correction(49), Err(RangeError::Channel(49)));
        assert_eq!(store, RegisterStore::new());
    }

    #[test]
    fn oversized_values_are_rejected_without_touching_neighbours() {
        let mut store = RegisterStore::new();
        store.set_pwm(2, 0x0AA).unwrap();
        store.set_correction(2, 0x15).unwrap();

        assert_eq!(store.set_pwm(1, 4096), Err(RangeError::Pwm(4096)));
        assert_eq!(store.set_correction(1, 64), Err(RangeError::Correction(64)));
        assert_eq!(store.set_all_pwm(0xFFFF), Err(RangeError::Pwm(0xFFFF)));
        assert_eq!(store.set_all_correction(200), Err(RangeError::Correction(200)));

        assert_eq!(store.get_pwm(1), Ok(0));
        assert_eq!(store.get_pwm(2), Ok(0x0AA));
        assert_eq!(store.get_correction(1), Ok(0));
        assert_eq!(store.get_correction(2), Ok(0x15));
    }

    #[test]
    fn bulk_setters_fill_every_channel() {
        let mut store = RegisterStore::new();
        store.set_all_pwm(4095).unwrap();
        store.set_all_correction(63).unwrap();
        assert!(store.pwm_buffer().iter().all(|b| *b == 0xFF));
        assert!(store.correction_buffer().iter().all(|b| *b == 0xFF));

        store.clear();
        assert_eq!(store, RegisterStore::new());
    }

    #[test]
    fn correction_frame_puts_values_in_the_top_six_bits() {
        let mut store = RegisterStore::new();
        for channel in 1..=48u8 {
            store.set_correction(channel, (channel * 5) % 64).unwrap();
        }
        let frame = store.correction_frame();
        for index in 0..NUM_CHANNELS {
            let expected = u16::from(store.get_correction(index as u8 + 1).unwrap()) << 6;
            assert_eq!(unpack12(&frame, index), expected);
        }
    }

    #[test]
    fn correction_frame_leaves_pwm_alone() {
        let mut store = RegisterStore::new();
        store.set_all_pwm(0x123).unwrap();
        store.set_all_correction(63).unwrap();
        let before = *store.pwm_buffer();
        let frame = store.correction_frame();
        assert_eq!(unpack12(&frame, 0), 0xFC0);
        assert_eq!(store.pwm_buffer(), &before);
    }
}
