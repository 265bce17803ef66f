//! Register space access
//!
//! The bus controller is a bank of 8-bit registers at a fixed physical
//! address. Everything the driver does to the hardware goes through the
//! two calls of [`IoSpace`].

/// Byte-wide access to a physical address space
///
/// Accesses are not plain memory operations: reading a status register
/// may clear flags, and a write to the command register starts a bus
/// cycle. Implementations must perform exactly one device access per call,
/// in call order, and must never cache or merge accesses.
pub trait IoSpace {
    /// Read the byte register at `addr`
    fn read8(&mut self, addr: usize) -> u8;

    /// Write `value` to the byte register at `addr`
    fn write8(&mut self, addr: usize, value: u8);
}

impl<T: IoSpace + ?Sized> IoSpace for &mut T {
    #[inline]
    fn read8(&mut self, addr: usize) -> u8 {
        T::read8(self, addr)
    }

    #[inline]
    fn write8(&mut self, addr: usize, value: u8) {
        T::write8(self, addr, value)
    }
}
