//! Device drivers for Ocores I2C buses
//!
//! Drivers are written against [`ocores_hal::I2cBus`], so they run on a bare
//! controller, a `&mut` borrow of one, or a shared bus handle:
//!
//! - Bus scan over the non-reserved address range
//! - 24Cxx-style EEPROMs with page-split writes and acknowledge polling
//! - Ethernet address stored in an EEPROM, as on the reference board

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod eeprom;
pub mod mac;
pub mod scan;
