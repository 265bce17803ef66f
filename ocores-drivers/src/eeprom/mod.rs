//! Serial EEPROMs
//!
//! 24Cxx parts: a memory array behind a one- or two-byte word address,
//! written a page at a time, unavailable for a few milliseconds while each
//! page is programmed.

pub mod at24;

pub use at24::{At24, At24Config};

/// EEPROM access failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError<E> {
    /// The underlying transfer failed
    Bus(E),
    /// The device never came back from a write cycle
    AckPollTimeout,
    /// The access runs past the end of the array
    OutOfRange,
    /// The configured geometry cannot describe a real part
    InvalidGeometry,
}

impl<E> From<E> for EepromError<E> {
    fn from(e: E) -> Self {
        EepromError::Bus(e)
    }
}

impl<E: core::fmt::Display> core::fmt::Display for EepromError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EepromError::Bus(e) => write!(f, "EEPROM bus error: {}", e),
            EepromError::AckPollTimeout => write!(f, "EEPROM write cycle did not finish"),
            EepromError::OutOfRange => write!(f, "EEPROM access out of range"),
            EepromError::InvalidGeometry => write!(f, "EEPROM geometry invalid"),
        }
    }
}
