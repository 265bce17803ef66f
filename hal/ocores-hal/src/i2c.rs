//! I2C bus abstractions
//!
//! Provides the addressed-transfer trait that device drivers (EEPROMs,
//! sensors, PMICs) are written against.

/// I2C bus master
///
/// Devices on the bus are addressed by a 7-bit chip address. Most of them
/// expose an internal register or memory array selected by a word address
/// of one or two bytes, sent most-significant byte first right after the
/// chip address.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Read `buf.len()` bytes starting at `offset`
    ///
    /// # Arguments
    /// * `chip` - 7-bit I2C address
    /// * `offset` - Word address inside the device
    /// * `offset_len` - Number of word address bytes to send (0 sends none)
    /// * `buf` - Buffer to read into
    fn read_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Write `data` starting at `offset`
    ///
    /// # Arguments
    /// * `chip` - 7-bit I2C address
    /// * `offset` - Word address inside the device
    /// * `offset_len` - Number of word address bytes to send (0 sends none)
    /// * `data` - Bytes to write
    fn write_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    /// Check whether a device answers at `chip`
    ///
    /// Reads one byte from word address 0. The payload is discarded; only
    /// completion of the transfer matters.
    fn probe(&mut self, chip: u8) -> Result<(), Self::Error> {
        let mut scratch = [0u8; 1];
        self.read_block(chip, 0, 1, &mut scratch)
    }
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn read_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::read_block(self, chip, offset, offset_len, buf)
    }

    fn write_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        T::write_block(self, chip, offset, offset_len, data)
    }

    fn probe(&mut self, chip: u8) -> Result<(), Self::Error> {
        T::probe(self, chip)
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };
}
