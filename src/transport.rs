//! Shifting frames into the LT8500 and strobing LDIBLANK.
//!
//! Every frame is the same shape on the wire: 72 payload bytes, sent last
//! byte first, then one command byte. The chip's shift register ends up
//! holding byte 0 nearest its output, which is why the payload goes out in
//! reverse. Nothing happens on the chip until LDIBLANK is pulsed.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi;
use embedded_hal::digital::v2::OutputPin;

use crate::error::Error;
use crate::{Command, Timing, FRAME_LEN};

/// Number of bytes clocked out per frame, including the command byte.
pub const WIRE_FRAME_LEN: usize = FRAME_LEN + 1;

/// Owns the serial bus, the LDIBLANK strobe line and a delay source.
///
/// The strobe is driven through [`OutputPin`], so a HAL with a faster way to
/// toggle the pin only needs to provide an `OutputPin` for it.
pub struct Transport<SPI, STB, D> {
    spi: SPI,
    strobe: STB,
    delay: D,
    timing: Timing,
}

impl<SPI, STB, D, SpiE, PinE> Transport<SPI, STB, D>
where
    SPI: spi::Write<u8, Error = SpiE>,
    STB: OutputPin<Error = PinE>,
    D: DelayUs<u32>,
{
    /// Wrap the bus, strobe line and delay.
    ///
    /// The timing is raised to the protocol minimums where needed.
    pub fn new(spi: SPI, strobe: STB, delay: D, timing: Timing) -> Self {
        Transport {
            spi,
            strobe,
            delay,
            timing: timing.sanitized(),
        }
    }

    /// The timing actually in use.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Shift out one frame and latch it.
    ///
    /// The bus write happens first; if it fails, no latch pulse is sent and
    /// the chip keeps whatever it had latched before.
    pub fn send_frame(
        &mut self,
        payload: &[u8; FRAME_LEN],
        command: Command,
    ) -> Result<(), Error<SpiE, PinE>> {
        let wire = encode_frame(payload, command);
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "LT8500 frame {} head={=[u8]}",
            command,
            &wire[FRAME_LEN - 4..FRAME_LEN]
        );
        self.spi.write(&wire).map_err(Error::Bus)?;
        self.latch_pulse()
    }

    /// The short LDIBLANK pulse that commits a frame.
    pub fn latch_pulse(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.pulse(self.timing.latch_pulse_us)
    }

    /// The long LDIBLANK pulse that puts the chip back to its power-up state.
    pub fn reset_pulse(&mut self) -> Result<(), Error<SpiE, PinE>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("LT8500 reset pulse, {=u32} us", self.timing.reset_pulse_us);
        self.pulse(self.timing.reset_pulse_us)
    }

    /// Drive LDIBLANK high and hold it long enough to keep the chip in reset.
    pub fn hold_in_reset(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.strobe.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(self.timing.power_up_hold_us);
        Ok(())
    }

    /// Drive LDIBLANK low, letting the chip boot.
    pub fn release_reset(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.strobe.set_low().map_err(Error::Pin)
    }

    /// Wait for `us` microseconds.
    pub fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    /// Hand back the bus, strobe line and delay.
    pub fn release(self) -> (SPI, STB, D) {
        (self.spi, self.strobe, self.delay)
    }

    fn pulse(&mut self, width_us: u32) -> Result<(), Error<SpiE, PinE>> {
        self.strobe.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(width_us);
        self.strobe.set_low().map_err(Error::Pin)
    }
}

/// Lay out a frame exactly as it is clocked onto the bus.
pub fn encode_frame(payload: &[u8; FRAME_LEN], command: Command) -> [u8; WIRE_FRAME_LEN] {
    let mut wire = [0u8; WIRE_FRAME_LEN];
    for (out, byte) in wire.iter_mut().zip(payload.iter().rev()) {
        *out = *byte;
    }
    wire[FRAME_LEN] = command.code();
    wire
}

//
// Tests
//
