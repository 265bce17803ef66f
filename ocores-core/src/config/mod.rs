//! Configuration types
//!
//! Board-supplied controller configuration. With the `serde` feature the
//! types can be persisted as postcard binary data.

pub mod clock;
pub mod controller;

pub use clock::*;
pub use controller::*;
