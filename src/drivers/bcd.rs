//! Packed BCD conversion used by the RTC register codec.
//!
//! Upper nibble holds the tens digit, lower nibble the units digit. Callers
//! mask off any flag bits before decoding and validate ranges before encoding.

/// Convert a binary value in `0..=99` to packed BCD.
#[inline]
pub fn bin_to_bcd(value: u8) -> u8 {
    debug_assert!(value <= 99, "BCD input out of range");
    ((value / 10) << 4) | (value % 10)
}

/// Convert packed BCD to binary.
#[inline]
pub fn bcd_to_bin(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}
