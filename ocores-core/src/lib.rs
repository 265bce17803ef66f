//! Polled master-mode driver for OpenCores-compatible I2C controllers
//!
//! This crate drives the `i2c_master_slave` register block during early
//! bring-up, where there are no interrupts, no scheduler and no allocator.
//! Every wait is a bounded status poll.
//!
//! The driver is layered bottom-up:
//!
//! - Register access ([`regs`]) - the only place the controller is touched
//! - Bus selection ([`selector`]) - which of the two register blocks is live
//! - Primitive sequencer ([`sequencer`]) - single-byte transfers and status polls
//! - Transaction protocol ([`protocol`]) - chip addressing, block reads/writes
//! - Lifecycle ([`controller`]) - prescaler setup, enable, bus reset
//!
//! [`SharedBus`] adds a lock around whole transactions for callers that
//! share one controller between contexts, and [`OcoresI2c`] implements the
//! `embedded-hal` 1.0 `I2c` trait for third-party device drivers.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod config;
pub mod controller;
mod ehal;
pub mod error;
pub mod protocol;
pub mod regs;
pub mod selector;
pub mod sequencer;
pub mod shared;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use config::{prescaler, ControllerConfig, TimeoutBudget};
pub use controller::OcoresI2c;
pub use error::{Error, NackSource};
pub use protocol::Direction;
pub use selector::{BusHandle, BusSelector, BUS_COUNT};
pub use sequencer::AckCheck;
pub use shared::SharedBus;
