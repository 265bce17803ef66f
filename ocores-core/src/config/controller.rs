//! Controller configuration
//!
//! Where the register blocks live, what clock feeds them, and how long the
//! driver is willing to poll before giving up.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::selector::BUS_COUNT;

/// Poll budgets for the two kinds of wait
///
/// Budgets count status register reads, not time. On the reference board a
/// status read is a few Wishbone cycles, so the defaults allow well over a
/// second for clock stretching before a wait is declared failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeoutBudget {
    /// Status reads while waiting for BUSY to clear
    pub not_busy_polls: u32,
    /// Status reads while waiting for a byte transfer to complete
    pub transfer_polls: u32,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self::REFERENCE
    }
}

impl TimeoutBudget {
    /// Budgets used by the reference firmware
    pub const REFERENCE: Self = Self {
        not_busy_polls: 1_000_000,
        transfer_polls: 10_000_000,
    };

    /// Create a budget with explicit poll counts
    pub const fn new(not_busy_polls: u32, transfer_polls: u32) -> Self {
        Self {
            not_busy_polls,
            transfer_polls,
        }
    }
}

/// Board-level controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerConfig {
    /// Register block base address per bus index
    pub base_addresses: [usize; BUS_COUNT],
    /// Clock feeding the prescaler in Hz
    pub input_clock_hz: u32,
    /// Poll budgets
    pub timeouts: TimeoutBudget,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new([0xa000_0000, 0xa100_0000], 50_000_000)
    }
}

impl ControllerConfig {
    /// Create a config with the reference poll budgets
    pub const fn new(base_addresses: [usize; BUS_COUNT], input_clock_hz: u32) -> Self {
        Self {
            base_addresses,
            input_clock_hz,
            timeouts: TimeoutBudget::REFERENCE,
        }
    }

    /// Replace the poll budgets
    pub const fn with_timeouts(mut self, timeouts: TimeoutBudget) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Errors from loading persisted configuration
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Output buffer too small
    BufferTooSmall,
    /// Stored bytes are not a valid configuration
    Deserialize,
}

#[cfg(feature = "serde")]
impl ControllerConfig {
    /// Serialize into `buf`, returning the used prefix
    pub fn to_bytes<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::BufferTooSmall)
    }

    /// Deserialize from bytes produced by [`to_bytes`](Self::to_bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.base_addresses, [0xa000_0000, 0xa100_0000]);
        assert_eq!(config.input_clock_hz, 50_000_000);
        assert_eq!(config.timeouts.not_busy_polls, 1_000_000);
        assert_eq!(config.timeouts.transfer_polls, 10_000_000);
    }

    #[test]
    fn test_with_timeouts() {
        let config = ControllerConfig::default().with_timeouts(TimeoutBudget::new(8, 16));
        assert_eq!(config.timeouts, TimeoutBudget::new(8, 16));
        assert_eq!(config.input_clock_hz, 50_000_000);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_truncated_config_rejected() {
        let config = ControllerConfig::default();
        let mut buf = [0u8; 64];
        let len = config.to_bytes(&mut buf).unwrap().len();

        assert_eq!(ControllerConfig::from_bytes(&buf[..len]), Ok(config));
        assert_eq!(
            ControllerConfig::from_bytes(&buf[..len - 1]),
            Err(ConfigError::Deserialize)
        );
    }
}
