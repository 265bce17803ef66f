//! AT24-family EEPROM driver
//!
//! # Writes
//!
//! The device latches a write into a page buffer and programs it on the
//! stop condition. Bytes that run past the end of a page wrap to its
//! start, so [`At24::write`] splits data on page boundaries and issues one
//! transfer per page.
//!
//! While programming, the device ignores its address. After every page the
//! driver addresses it repeatedly (acknowledge polling) until it ACKs,
//! giving up after [`At24Config::ack_polls`] attempts.

use embedded_hal::i2c::{Error as _, ErrorKind};
use ocores_hal::I2cBus;

use super::EepromError;

/// Geometry and addressing of one EEPROM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct At24Config {
    /// 7-bit chip address
    pub chip: u8,
    /// Word address bytes
    pub offset_len: usize,
    /// Page write buffer size in bytes
    pub page_size: usize,
    /// Array size in bytes
    pub capacity: usize,
    /// Addressing attempts after a page write before giving up
    pub ack_polls: u32,
}

impl At24Config {
    /// 2 Kbit, 8-byte pages
    pub const AT24C02: Self = Self {
        chip: 0x50,
        offset_len: 1,
        page_size: 8,
        capacity: 256,
        ack_polls: 1000,
    };

    /// 32 Kbit, 32-byte pages, two-byte word address
    pub const AT24C32: Self = Self {
        chip: 0x50,
        offset_len: 2,
        page_size: 32,
        capacity: 4096,
        ack_polls: 1000,
    };

    /// Same part at another chip address
    pub const fn at(mut self, chip: u8) -> Self {
        self.chip = chip;
        self
    }

    /// Same part with a different acknowledge polling budget
    pub const fn with_ack_polls(mut self, polls: u32) -> Self {
        self.ack_polls = polls;
        self
    }
}

/// AT24 EEPROM on an I2C bus
pub struct At24<B> {
    bus: B,
    config: At24Config,
}

impl<B> At24<B>
where
    B: I2cBus,
    B::Error: embedded_hal::i2c::Error,
{
    /// Create a driver for the EEPROM described by `config`
    pub fn new(bus: B, config: At24Config) -> Self {
        Self { bus, config }
    }

    /// EEPROM geometry
    pub fn config(&self) -> &At24Config {
        &self.config
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    fn check_range(&self, offset: u32, len: usize) -> Result<(), EepromError<B::Error>> {
        if self.config.page_size == 0 || self.config.capacity == 0 {
            return Err(EepromError::InvalidGeometry);
        }
        let end = usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(len));
        match end {
            Some(end) if end <= self.config.capacity => Ok(()),
            _ => Err(EepromError::OutOfRange),
        }
    }

    /// Read `buf.len()` bytes starting at `offset`
    ///
    /// Sequential reads are not page-limited, so this is one transfer.
    pub fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), EepromError<B::Error>> {
        self.check_range(offset, buf.len())?;
        let cfg = self.config;
        self.bus.read_block(cfg.chip, offset, cfg.offset_len, buf)?;
        Ok(())
    }

    /// Write `data` starting at `offset`, one page at a time
    ///
    /// Returns once the last page has finished programming.
    pub fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), EepromError<B::Error>> {
        self.check_range(offset, data.len())?;
        let cfg = self.config;

        let mut addr = offset as usize;
        let mut rest = data;
        while !rest.is_empty() {
            let room = cfg.page_size - addr % cfg.page_size;
            let (chunk, tail) = rest.split_at(room.min(rest.len()));

            self.bus.write_block(cfg.chip, addr as u32, cfg.offset_len, chunk)?;
            self.wait_ready()?;

            addr += chunk.len();
            rest = tail;
        }
        Ok(())
    }

    /// Acknowledge-poll until the device answers its address again
    pub fn wait_ready(&mut self) -> Result<(), EepromError<B::Error>> {
        let chip = self.config.chip;

        for _ in 0..self.config.ack_polls {
            // Address only, then stop
            match self.bus.write_block(chip, 0, 0, &[]) {
                Ok(()) => return Ok(()),
                Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => {}
                Err(e) => return Err(EepromError::Bus(e)),
            }
        }
        Err(EepromError::AckPollTimeout)
    }
}
