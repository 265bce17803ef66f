//! Driver error kinds
//!
//! Every failure below the caller is reported with one of these kinds and
//! passed up unchanged; nothing in the driver retries or downgrades.

use core::fmt;

/// Which phase of a transfer went unacknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NackSource {
    /// The chip address byte (no device answered)
    Address,
    /// A word-address or payload byte
    Data,
}

/// Errors from bus operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus index outside the configured controller table
    InvalidBus,
    /// Requested bus clock of zero, or one the prescaler cannot encode
    InvalidClock,
    /// Bus stayed busy for the whole not-busy budget
    Busy,
    /// Byte transfer did not finish within the transfer budget
    Timeout,
    /// Another master won the bus mid-transfer
    ArbitrationLost,
    /// The acknowledge bit had the wrong polarity
    NotAcknowledged(NackSource),
}

impl Error {
    /// Re-tag a NACK as belonging to the address phase
    pub(crate) fn in_address_phase(self) -> Self {
        match self {
            Error::NotAcknowledged(_) => Error::NotAcknowledged(NackSource::Address),
            other => other,
        }
    }

    /// No device answered its chip address
    pub fn is_device_absent(&self) -> bool {
        matches!(self, Error::NotAcknowledged(NackSource::Address))
    }

    /// The bus itself misbehaved (stuck, too slow, or contended)
    pub fn is_bus_fault(&self) -> bool {
        matches!(
            self,
            Error::Busy | Error::Timeout | Error::ArbitrationLost
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBus => f.write_str("invalid bus index"),
            Error::InvalidClock => f.write_str("invalid bus clock"),
            Error::Busy => f.write_str("bus busy"),
            Error::Timeout => f.write_str("transfer timed out"),
            Error::ArbitrationLost => f.write_str("arbitration lost"),
            Error::NotAcknowledged(NackSource::Address) => f.write_str("address not acknowledged"),
            Error::NotAcknowledged(NackSource::Data) => f.write_str("data not acknowledged"),
        }
    }
}
