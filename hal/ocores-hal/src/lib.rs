//! Ocores Hardware Abstraction Layer
//!
//! This crate defines the seams between the I2C driver and the platform
//! it runs on. The driver core is written against these traits only, so
//! the same code drives real silicon and the in-memory model used by the
//! host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Device drivers (ocores-drivers)        │
//! └─────────────────────────────────────────┘
//!                     │  I2cBus
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Bus controller driver (ocores-core)    │
//! └─────────────────────────────────────────┘
//!                     │  IoSpace
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ocores-hal-   │       │ in-memory     │
//! │    mmio       │       │ model (tests) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`io::IoSpace`] - Byte-wide access to the physical register space
//! - [`i2c::I2cBus`] - Addressed block transfers to bus devices

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod io;

// Re-export key traits at crate root for convenience
pub use i2c::{I2cBus, I2cConfig};
pub use io::IoSpace;
