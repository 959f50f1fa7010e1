//! # LT8500 Driver
//!
//! This is a driver for the Analog Devices (Linear Technology) LT8500, a
//! 48-channel, 12-bit PWM generator with a 6-bit correction multiplier per
//! channel.
//!
//! The LT8500 is fed over a one-way serial interface (SCKI/SDI, SPI mode 0)
//! plus a single strobe line, LDIBLANK. Every transfer is a *frame*: 72 bytes
//! of packed channel data followed by a command byte, committed by a pulse on
//! LDIBLANK. A long pulse on the same line resets the chip. After reset, the
//! SDO line goes low once the chip has booted.
//!
//! The [`Lt8500`] object must cache the register contents because the LT8500
//! only has a *write-only* interface and you cannot read back any register
//! contents. The same goes for the two toggle bits (correction disable and
//! phase shift): the driver tracks what it *thinks* they are. If a toggle
//! frame is lost on the way, the cached value is wrong until the next
//! [`Lt8500::reset`] and [`Lt8500::begin`].
//!
//! The driver does not configure the bus. Set it up for
//! [`SPI_MODE`] (MSB first) at up to [`MAX_SPI_FREQUENCY_HZ`];
//! [`DEFAULT_SPI_FREQUENCY_HZ`] is a safe choice.
//!
//! # Example
//!
//! You might drive the LT8500 like this:
//!
//! ```rust
//! # use embedded_hal::blocking::{delay::DelayUs, spi};
//! # use embedded_hal::digital::v2::{InputPin, OutputPin};
//! # struct Spi;
//! # impl spi::Write<u8> for Spi {
//! #     type Error = ();
//! #     fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct Pin;
//! # impl OutputPin for Pin {
//! #     type Error = ();
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for Pin {
//! #     type Error = ();
//! #     fn is_high(&self) -> Result<bool, Self::Error> { Ok(false) }
//! #     fn is_low(&self) -> Result<bool, Self::Error> { Ok(true) }
//! # }
//! # struct Delay;
//! # impl DelayUs<u32> for Delay {
//! #     fn delay_us(&mut self, _us: u32) {}
//! # }
//! # let (spi, ldi_blank, sdo, delay) = (Spi, Pin, Pin, Delay);
//! let mut leds = lt8500::Lt8500::new(spi, ldi_blank, sdo, delay);
//! if let Err(e) = leds.begin() {
//!     // LT8500 didn't boot
//! }
//! leds.set_pwm(1, 4095).unwrap();
//! leds.set_pwm(2, 2048).unwrap();
//! leds.set_correction(1, 40).unwrap();
//! if let Err(e) = leds.send_correction() {
//!     // Bus or strobe failure
//! }
//! leds.sync_update().unwrap();
//! leds.enable_output().unwrap();
//! ```

#![no_std]
#![deny(unsafe_code)]
#![deny(missing_docs)]

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi;
use embedded_hal::digital::v2::{InputPin, OutputPin};

pub mod error;
pub mod pack;
pub mod registers;
pub mod transport;

pub use error::Error;
pub use registers::{RangeError, RegisterStore};

use transport::Transport;

//
// Public Types
//

/// The command byte that follows every frame.
///
/// Codes `0x80` to `0x8F` are reserved on the LT8500 and have no variant
/// here, so they can never be sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Update PWM registers at the start of the next PWM period
    SyncUpdate = 0x00,
    /// Update PWM registers as soon as the frame is latched
    AsyncUpdate = 0x10,
    /// Load the correction multipliers
    Correction = 0x20,
    /// Enable the PWM outputs
    OutputEnable = 0x30,
    /// Disable the PWM outputs (drive them low)
    OutputDisable = 0x40,
    /// Start the on-chip self test
    SelfTest = 0x50,
    /// Toggle the 120° phase shift between the three 16-channel banks
    PhaseShiftToggle = 0x60,
    /// Toggle the correction-disable bit of the multiplier
    CorrectionToggle = 0x70,
}

/// Where the driver is in the LT8500 power-up sequence.
///
/// [`Lt8500::begin`] walks through these in order. If it fails part way, the
/// driver stays in the state it had reached.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not started, or ended, or reset
    Uninitialized,
    /// Held in reset, or waiting for SDO to signal the end of boot
    Resetting,
    /// The initial correction frame has been sent
    CorrectionFrameSent,
    /// Correction has been toggled off
    CorrectionDisabled,
    /// The initial PWM values have been sent
    Synced,
    /// Accepting command frames
    Ready,
}

/// Timings used on LDIBLANK and while waiting for the chip.
///
/// All times are in microseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Width of the pulse that latches a frame. The datasheet minimum is a few
    /// nanoseconds, so anything from 1 up is fine.
    pub latch_pulse_us: u32,
    /// Width of the pulse that resets the chip. At least 50.
    pub reset_pulse_us: u32,
    /// How long LDIBLANK is held high before boot. At least 500.
    pub power_up_hold_us: u32,
    /// Pause after each frame of the power-up sequence.
    pub settle_us: u32,
    /// Interval between reads of SDO while waiting for boot. At least 1.
    pub boot_poll_us: u32,
    /// Give up waiting for SDO to go low after this long.
    pub boot_timeout_us: u32,
}

/// Represents the state inside our LT8500 chip.
///
/// * `SPI` is the serial bus, connected to SCKI and SDI
/// * `STB` is the LDIBLANK strobe line
/// * `DET` is the SDO line, read only during boot
/// * `D` is a microsecond delay source
pub struct Lt8500<SPI, STB, DET, D> {
    transport: Transport<SPI, STB, D>,
    detect: DET,
    registers: RegisterStore,
    correction_enabled: bool,
    phase_shift_enabled: bool,
    state: State,
}

//
// Public Data
//

/// Number of PWM channels on one LT8500.
pub const NUM_CHANNELS: usize = 48;

/// Size of the packed PWM registers (48 × 12 bits).
pub const PWM_BUFFER_LEN: usize = NUM_CHANNELS * 12 / 8;

/// Size of the packed correction registers (48 × 6 bits).
pub const CORRECTION_BUFFER_LEN: usize = NUM_CHANNELS * 6 / 8;

/// Size of a frame payload, excluding the command byte.
pub const FRAME_LEN: usize = PWM_BUFFER_LEN;

/// Largest PWM value.
pub const MAX_PWM: u16 = 0x0FFF;

/// Largest correction value.
pub const MAX_CORRECTION: u8 = 0x3F;

/// The LT8500 samples SDI on the rising edge of SCKI with the clock idle low.
pub const SPI_MODE: embedded_hal::spi::Mode = embedded_hal::spi::MODE_0;

/// A conservative bus clock.
pub const DEFAULT_SPI_FREQUENCY_HZ: u32 = 5_000_000;

/// Fastest bus clock the LT8500 accepts.
pub const MAX_SPI_FREQUENCY_HZ: u32 = 50_000_000;

/// Timings that work for a single LT8500.
pub const DEFAULT_TIMING: Timing = Timing {
    latch_pulse_us: 1,
    reset_pulse_us: 70,
    power_up_hold_us: 500,
    settle_us: 10,
    boot_poll_us: 10,
    boot_timeout_us: 100_000,
};

//
// Private Data
//

const MIN_RESET_PULSE_US: u32 = 50;

const MIN_POWER_UP_HOLD_US: u32 = 500;

/// Payload for frames whose command ignores the data.
const BLANK_FRAME: [u8; FRAME_LEN] = [0; FRAME_LEN];

//
// Public Functions
//

/// The PWM duty cycle the LT8500 actually outputs when correction is
/// enabled.
///
/// The chip computes `pwm × 2/3 × (correction + 32)/64`, so a correction of
/// 0 gives about a third of full scale and 63 about 99%. The driver never
/// applies this itself; it is here for working out expected brightness.
pub fn corrected_pwm(pwm: u16, correction: u8) -> u16 {
    let pwm = u32::from(pwm & MAX_PWM);
    let correction = u32::from(correction & MAX_CORRECTION);
    (pwm * 2 * (correction + 32) / (3 * 64)) as u16
}

//
// impls on Public Types
//

impl Command {
    /// The byte sent on the wire.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.code()
    }
}

impl Default for Timing {
    fn default() -> Self {
        DEFAULT_TIMING
    }
}

impl Timing {
    /// Raise any value below its protocol minimum to that minimum.
    pub fn sanitized(self) -> Timing {
        Timing {
            latch_pulse_us: self.latch_pulse_us.max(1),
            reset_pulse_us: self.reset_pulse_us.max(MIN_RESET_PULSE_US),
            power_up_hold_us: self.power_up_hold_us.max(MIN_POWER_UP_HOLD_US),
            settle_us: self.settle_us,
            boot_poll_us: self.boot_poll_us.max(1),
            boot_timeout_us: self.boot_timeout_us,
        }
    }
}

impl<SPI, STB, DET, D, SpiE, PinE> Lt8500<SPI, STB, DET, D>
where
    SPI: spi::Write<u8, Error = SpiE>,
    STB: OutputPin<Error = PinE>,
    DET: InputPin<Error = PinE>,
    D: DelayUs<u32>,
{
    /// Create a new LT8500 proxy object with [`DEFAULT_TIMING`].
    ///
    /// Nothing is sent until you call [`Lt8500::begin`].
    pub fn new(spi: SPI, strobe: STB, detect: DET, delay: D) -> Self {
        Self::with_timing(spi, strobe, detect, delay, DEFAULT_TIMING)
    }

    /// Create a new LT8500 proxy object with custom timing.
    ///
    /// Timings shorter than the protocol allows are lengthened, see
    /// [`Timing::sanitized`].
    pub fn with_timing(spi: SPI, strobe: STB, detect: DET, delay: D, timing: Timing) -> Self {
        Lt8500 {
            transport: Transport::new(spi, strobe, delay, timing),
            detect,
            registers: RegisterStore::new(),
            correction_enabled: true,
            phase_shift_enabled: false,
            state: State::Uninitialized,
        }
    }

    /// Run the LT8500 power-up sequence.
    ///
    /// Clears every cached PWM and correction value, then:
    ///
    /// 1. holds LDIBLANK high to keep the chip in reset,
    /// 2. drops LDIBLANK and waits for SDO to go low,
    /// 3. sends a correction frame,
    /// 4. toggles correction off (it is on after power up),
    /// 5. sends a synchronous update frame.
    ///
    /// The outputs are left disabled; call [`Lt8500::enable_output`] when you
    /// have set some PWM values. If SDO is still high after
    /// [`Timing::boot_timeout_us`], this returns [`Error::BootTimeout`]
    /// without having sent any frame.
    pub fn begin(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.registers.clear();
        self.correction_enabled = true;
        self.phase_shift_enabled = false;

        self.state = State::Resetting;
        self.transport.hold_in_reset()?;
        self.transport.release_reset()?;
        self.wait_for_boot()?;

        self.transmit_correction()?;
        self.state = State::CorrectionFrameSent;
        self.settle();

        if self.correction_enabled {
            self.transmit_toggle(Command::CorrectionToggle)?;
        }
        self.state = State::CorrectionDisabled;
        self.settle();

        self.transport
            .send_frame(self.registers.pwm_buffer(), Command::SyncUpdate)?;
        self.state = State::Synced;
        self.settle();

        #[cfg(feature = "defmt")]
        defmt::debug!("LT8500 ready");
        self.state = State::Ready;
        Ok(())
    }

    /// Mark the driver as stopped.
    ///
    /// The chip is left as it is. Command frames are refused until
    /// [`Lt8500::begin`] is called again.
    pub fn end(&mut self) {
        self.state = State::Uninitialized;
    }

    /// Give back the bus, pins and delay.
    pub fn release(self) -> (SPI, STB, DET, D) {
        let (spi, strobe, delay) = self.transport.release();
        (spi, strobe, self.detect, delay)
    }

    /// Resets the LT8500 with a long LDIBLANK pulse.
    ///
    /// The chip goes back to its power-up state, and so do the cached toggle
    /// bits. You need to call [`Lt8500::begin`] again afterwards. The cached
    /// PWM and correction values are kept until then.
    pub fn reset(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.state = State::Uninitialized;
        self.correction_enabled = true;
        self.phase_shift_enabled = false;
        self.transport.reset_pulse()
    }

    /// Where the driver is in the power-up sequence.
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the driver believes correction is enabled on the chip.
    pub fn correction_enabled(&self) -> bool {
        self.correction_enabled
    }

    /// Whether the driver believes phase shift is enabled on the chip.
    pub fn phase_shift_enabled(&self) -> bool {
        self.phase_shift_enabled
    }

    /// The cached PWM and correction registers.
    pub fn registers(&self) -> &RegisterStore {
        &self.registers
    }

    /// Set the PWM duty cycle (0 to 4095) of a channel (1 to 48).
    ///
    /// Call [`Lt8500::sync_update`] or [`Lt8500::async_update`] to have this
    /// change take effect.
    pub fn set_pwm(&mut self, channel: u8, value: u16) -> Result<(), Error<SpiE, PinE>> {
        Ok(self.registers.set_pwm(channel, value)?)
    }

    /// Get the cached PWM duty cycle of a channel.
    ///
    /// See [`Lt8500::set_pwm`].
    pub fn get_pwm(&self, channel: u8) -> Result<u16, Error<SpiE, PinE>> {
        Ok(self.registers.get_pwm(channel)?)
    }

    /// Set every channel to the same PWM duty cycle.
    ///
    /// Call [`Lt8500::sync_update`] or [`Lt8500::async_update`] to have this
    /// change take effect.
    pub fn set_all_pwm(&mut self, value: u16) -> Result<(), Error<SpiE, PinE>> {
        Ok(self.registers.set_all_pwm(value)?)
    }

    /// Set the correction factor (0 to 63) of a channel (1 to 48).
    ///
    /// Call [`Lt8500::send_correction`] to have this change take effect.
    pub fn set_correction(&mut self, channel: u8, value: u8) -> Result<(), Error<SpiE, PinE>> {
        Ok(self.registers.set_correction(channel, value)?)
    }

    /// Get the cached correction factor of a channel.
    ///
    /// See [`Lt8500::set_correction`].
    pub fn get_correction(&self, channel: u8) -> Result<u8, Error<SpiE, PinE>> {
        Ok(self.registers.get_correction(channel)?)
    }

    /// Set every channel to the same correction factor.
    ///
    /// Call [`Lt8500::send_correction`] to have this change take effect.
    pub fn set_all_correction(&mut self, value: u8) -> Result<(), Error<SpiE, PinE>> {
        Ok(self.registers.set_all_correction(value)?)
    }

    /// Send the cached PWM values, applied at the next PWM period.
    pub fn sync_update(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.ensure_ready()?;
        self.transport
            .send_frame(self.registers.pwm_buffer(), Command::SyncUpdate)
    }

    /// Send the cached PWM values, applied straight away.
    pub fn async_update(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.ensure_ready()?;
        self.transport
            .send_frame(self.registers.pwm_buffer(), Command::AsyncUpdate)
    }

    /// Send the cached correction factors.
    ///
    /// They only change the outputs while correction is enabled, see
    /// [`Lt8500::toggle_correction`].
    pub fn send_correction(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.ensure_ready()?;
        self.transmit_correction()
    }

    /// Turn the PWM outputs on.
    pub fn enable_output(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.ensure_ready()?;
        self.transport.send_frame(&BLANK_FRAME, Command::OutputEnable)
    }

    /// Turn the PWM outputs off, driving them low.
    pub fn disable_output(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.ensure_ready()?;
        self.transport
            .send_frame(&BLANK_FRAME, Command::OutputDisable)
    }

    /// Flip the chip's correction-disable bit.
    ///
    /// The chip cannot be asked what the bit is, so the driver flips its own
    /// copy once the frame is sent. If the frame is sent but never makes it
    /// into the chip, the two disagree until the next reset.
    pub fn toggle_correction(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.ensure_ready()?;
        self.transmit_toggle(Command::CorrectionToggle)
    }

    /// Flip the chip's phase-shift bit.
    ///
    /// Has the same caveat as [`Lt8500::toggle_correction`].
    pub fn toggle_phase_shift(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.ensure_ready()?;
        self.transmit_toggle(Command::PhaseShiftToggle)
    }

    /// Run the chip's self test.
    ///
    /// Reading back the result needs SDO to be clocked in, which this driver
    /// does not do, so this always returns [`Error::NotImplemented`] without
    /// touching the bus.
    pub fn self_test(&mut self) -> Result<(), Error<SpiE, PinE>> {
        Err(Error::NotImplemented)
    }

    fn ensure_ready(&self) -> Result<(), Error<SpiE, PinE>> {
        if self.state == State::Ready {
            Ok(())
        } else {
            Err(Error::NotReady(self.state))
        }
    }

    fn transmit_correction(&mut self) -> Result<(), Error<SpiE, PinE>> {
        let frame = self.registers.correction_frame();
        self.transport.send_frame(&frame, Command::Correction)
    }

    fn transmit_toggle(&mut self, command: Command) -> Result<(), Error<SpiE, PinE>> {
        self.transport.send_frame(&BLANK_FRAME, command)?;
        match command {
            Command::CorrectionToggle => self.correction_enabled = !self.correction_enabled,
            Command::PhaseShiftToggle => self.phase_shift_enabled = !self.phase_shift_enabled,
            _ => {}
        }
        Ok(())
    }

    /// Poll SDO until the chip says it has booted.
    fn wait_for_boot(&mut self) -> Result<(), Error<SpiE, PinE>> {
        let timing = *self.transport.timing();
        let mut waited: u32 = 0;
        loop {
            if self.detect.is_low().map_err(Error::Pin)? {
                #[cfg(feature = "defmt")]
                defmt::debug!("LT8500 booted after {=u32} us", waited);
                return Ok(());
            }
            if waited >= timing.boot_timeout_us {
                #[cfg(feature = "defmt")]
                defmt::warn!("LT8500 SDO still high after {=u32} us", waited);
                return Err(Error::BootTimeout);
            }
            self.transport.delay_us(timing.boot_poll_us);
            waited = waited.saturating_add(timing.boot_poll_us);
        }
    }

    fn settle(&mut self) {
        let settle_us = self.transport.timing().settle_us;
        self.transport.delay_us(settle_us);
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_match_the_datasheet() {
        assert_eq!(Command::SyncUpdate.code(), 0x00);
        assert_eq!(Command::AsyncUpdate.code(), 0x10);
        assert_eq!(Command::Correction.code(), 0x20);
        assert_eq!(Command::OutputEnable.code(), 0x30);
        assert_eq!(Command::OutputDisable.code(), 0x40);
        assert_eq!(Command::SelfTest.code(), 0x50);
        assert_eq!(Command::PhaseShiftToggle.code(), 0x60);
        assert_eq!(u8::from(Command::CorrectionToggle), 0x70);
    }

    #[test]
    fn buffer_sizes() {
        assert_eq!(PWM_BUFFER_LEN, 72);
        assert_eq!(CORRECTION_BUFFER_LEN, 36);
        assert_eq!(FRAME_LEN, 72);
    }

    #[test]
    fn correction_multiplier_spans_half_to_one_and_a_half() {
        assert_eq!(corrected_pwm(4095, 32), 2730);
        assert_eq!(corrected_pwm(4095, 0), 1365);
        assert_eq!(corrected_pwm(4095, 63), 4052);
        assert_eq!(corrected_pwm(0, 63), 0);
        assert_eq!(corrected_pwm(3000, 64), corrected_pwm(3000, 0));
    }

    #[test]
    fn default_timing_is_already_sane() {
        assert_eq!(DEFAULT_TIMING.sanitized(), DEFAULT_TIMING);
        assert_eq!(Timing::default(), DEFAULT_TIMING);
        let raised = Timing {
            latch_pulse_us: 0,
            reset_pulse_us: 0,
            power_up_hold_us: 0,
            settle_us: 0,
            boot_poll_us: 0,
            boot_timeout_us: 0,
        }
        .sanitized();
        assert_eq!(raised.latch_pulse_us, 1);
        assert_eq!(raised.reset_pulse_us, 50);
        assert_eq!(raised.power_up_hold_us, 500);
        assert_eq!(raised.boot_poll_us, 1);
        assert_eq!(raised.settle_us, 0);
    }
}

//
// End of file
//
