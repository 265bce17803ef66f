//! Bus clock prescaler
//!
//! The core divides its input clock by `5 * (PRER + 1)` to generate SCL:
//!
//! ```text
//! PRER = input_clock / (5 * scl_clock) - 1
//! ```

use crate::error::Error;

/// Fixed divisor of the controller's clock generator
pub const CLOCK_DIVISOR: u64 = 5;

/// Compute the prescaler for a requested bus clock
///
/// Fails with [`Error::InvalidClock`] when `bus_hz` is zero, when it is too
/// fast for the input clock (the quotient would be zero), or when the
/// result does not fit the 16-bit prescaler register.
pub fn prescaler(input_hz: u32, bus_hz: u32) -> Result<u16, Error> {
    if bus_hz == 0 {
        return Err(Error::InvalidClock);
    }

    let quotient = u64::from(input_hz) / (CLOCK_DIVISOR * u64::from(bus_hz));
    quotient
        .checked_sub(1)
        .and_then(|p| u16::try_from(p).ok())
        .ok_or(Error::InvalidClock)
}

/// Split a prescaler into its (PRERlo, PRERhi) register bytes
pub fn prescaler_bytes(prescale: u16) -> (u8, u8) {
    let [hi, lo] = prescale.to_be_bytes();
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_board_standard_mode() {
        // 50 MHz / (5 * 100 kHz) - 1
        let p = prescaler(50_000_000, 100_000).unwrap();
        assert_eq!(p, 99);
        assert_eq!(prescaler_bytes(p), (99, 0));
    }

    #[test]
    fn test_fast_mode() {
        assert_eq!(prescaler(50_000_000, 400_000), Ok(24));
    }

    #[test]
    fn test_zero_clock_rejected() {
        assert_eq!(prescaler(50_000_000, 0), Err(Error::InvalidClock));
    }

    #[test]
    fn test_clock_too_fast_rejected() {
        // 50 MHz / (5 * 20 MHz) = 0, nothing to subtract from
        assert_eq!(prescaler(50_000_000, 20_000_000), Err(Error::InvalidClock));
    }

    #[test]
    fn test_clock_too_slow_rejected() {
        // 50 MHz / (5 * 100 Hz) - 1 = 99_999 does not fit 16 bits
        assert_eq!(prescaler(50_000_000, 100), Err(Error::InvalidClock));
    }

    #[test]
    fn test_high_byte_split() {
        assert_eq!(prescaler_bytes(0x1234), (0x34, 0x12));
    }

    proptest! {
        #[test]
        fn prop_prescaler_matches_formula(input in 1u32.., bus in 1u32..) {
            let expected = (input as u64) / (5 * bus as u64);
            match prescaler(input, bus) {
                Ok(p) => prop_assert_eq!(p as u64, expected - 1),
                Err(e) => {
                    prop_assert_eq!(e, Error::InvalidClock);
                    prop_assert!(expected == 0 || expected - 1 > u16::MAX as u64);
                }
            }
        }
    }
}
