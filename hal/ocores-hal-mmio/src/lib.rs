//! Memory-mapped register access for Ocores I2C controllers
//!
//! This is the only crate in the workspace that touches raw addresses.
//! The driver core sees it through [`ocores_hal::IoSpace`].

#![no_std]

pub mod board;

use core::ptr;

use ocores_hal::IoSpace;

/// Volatile byte access to the physical address space
///
/// Every call is a single `read_volatile`/`write_volatile`, so the compiler
/// can neither elide status polls nor reorder command writes.
#[derive(Debug)]
pub struct MmioSpace {
    _private: (),
}

impl MmioSpace {
    /// Create the accessor
    ///
    /// # Safety
    ///
    /// Every address later handed to [`IoSpace::read8`] or
    /// [`IoSpace::write8`] must be a byte register of a mapped device (or
    /// valid read-writable memory), and no other code may access those
    /// registers while this value is in use.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl IoSpace for MmioSpace {
    #[inline]
    fn read8(&mut self, addr: usize) -> u8 {
        // SAFETY: the caller of `new` vouched for every address we are given.
        unsafe { ptr::read_volatile(addr as *const u8) }
    }

    #[inline]
    fn write8(&mut self, addr: usize, value: u8) {
        // SAFETY: as above.
        unsafe { ptr::write_volatile(addr as *mut u8, value) }
    }
}
