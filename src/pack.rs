//! Bit packing for the LT8500 register buffers.
//!
//! The chip takes 12-bit PWM values and 6-bit correction values packed back
//! to back, least significant bits first. Neither width is byte aligned, so
//! every write here must leave the bits of neighbouring fields alone.
//!
//! These functions do no range checking. An `index` past the end of
//! `buffer` panics on the slice access, and out-of-width bits in `value` are
//! dropped. Callers are expected to validate at their own boundary (see
//! [`crate::registers::RegisterStore`]).

//
// Public Functions
//

/// Write a 12-bit `value` into packed slot `index` of `buffer`.
///
/// Two slots share three bytes. An even slot owns a whole byte plus the low
/// nibble of the next one; an odd slot owns the high nibble of its first byte
/// plus the whole next byte.
#[inline]
pub fn pack12(buffer: &mut [u8], index: usize, value: u16) {
    let pos = index * 3 / 2;
    let value = value & 0x0FFF;
    if index % 2 == 0 {
        buffer[pos] = value as u8;
        buffer[pos + 1] = (buffer[pos + 1] & 0xF0) | (value >> 8) as u8;
    } else {
        buffer[pos] = (buffer[pos] & 0x0F) | ((value & 0x0F) << 4) as u8;
        buffer[pos + 1] = (value >> 4) as u8;
    }
}

/// Read the 12-bit value stored in packed slot `index` of `buffer`.
#[inline]
pub fn unpack12(buffer: &[u8], index: usize) -> u16 {
    let pos = index * 3 / 2;
    if index % 2 == 0 {
        u16::from(buffer[pos]) | (u16::from(buffer[pos + 1] & 0x0F) << 8)
    } else {
        u16::from(buffer[pos] >> 4) | (u16::from(buffer[pos + 1]) << 4)
    }
}

/// Write a 6-bit `value` into packed slot `index` of `buffer`.
///
/// Four slots share three bytes:
///
/// ```text
///  byte 0          byte 1          byte 2
///  7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0
///  b a a a a a a   c c c c b b b b d d d d d d c c
/// ```
///
/// where `a` is slot 0, `b` slot 1, `c` slot 2 and `d` slot 3 of the group.
#[inline]
pub fn pack6(buffer: &mut [u8], index: usize, value: u8) {
    let base = (index / 4) * 3;
    let value = value & 0x3F;
    match index % 4 {
        0 => {
            buffer[base] = (buffer[base] & 0xC0) | value;
        }
        1 => {
            buffer[base] = (buffer[base] & 0x3F) | (value << 6);
            buffer[base + 1] = (buffer[base + 1] & 0xF0) | (value >> 2);
        }
        2 => {
            buffer[base + 1] = (buffer[base + 1] & 0x0F) | (value << 4);
            buffer[base + 2] = (buffer[base + 2] & 0xFC) | (value >> 4);
        }
        _ => {
            buffer[base + 2] = (buffer[base + 2] & 0x03) | (value << 2);
        }
    }
}

/// Read the 6-bit value stored in packed slot `index` of `buffer`.
#[inline]
pub fn unpack6(buffer: &[u8], index: usize) -> u8 {
    let base = (index / 4) * 3;
    match index % 4 {
        0 => buffer[base] & 0x3F,
        1 => (buffer[base] >> 6) | ((buffer[base + 1] & 0x0F) << 2),
        2 => (buffer[base + 1] >> 4) | ((buffer[base + 2] & 0x03) << 4),
        _ => buffer[base + 2] >> 2,
    }
}

//
// Tests
//
