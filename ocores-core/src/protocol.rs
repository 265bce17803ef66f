//! Transaction protocol
//!
//! Composes the primitive sequencer into the transfers callers actually
//! want: address a chip, point it at a word address, then stream bytes in
//! or out.
//!
//! # Wire sequences
//!
//! ```text
//! read:   S [chip|W] A [offset..] A  Sr [chip|R] A  D A .. D N P
//! write:  S [chip|W] A [offset..] A  D A .. D A P
//! ```
//!
//! Any failed step abandons the rest of the transfer and hands the error
//! back unchanged. Retrying is up to the caller; every transfer begins with
//! its own start condition, so a retry from the top is always safe.

use ocores_hal::IoSpace;

use crate::controller::OcoresI2c;
use crate::error::Error;
use crate::sequencer::AckCheck;

/// Direction of the transfer that follows a chip address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits
    Write,
    /// Master receives
    Read,
}

/// Encode a 7-bit chip address and direction as the first byte on the wire
pub const fn address_byte(chip: u8, direction: Direction) -> u8 {
    let rw = match direction {
        Direction::Write => 0,
        Direction::Read => 1,
    };
    (chip << 1) | rw
}

/// Byte `index` of a word address sent MSB first over `len` bytes
fn offset_byte(offset: u32, len: usize, index: usize) -> u8 {
    (len - 1 - index)
        .checked_mul(8)
        .and_then(|shift| u32::try_from(shift).ok())
        .and_then(|s| offset.checked_shr(s))
        .unwrap_or(0) as u8
}

impl<IO: IoSpace> OcoresI2c<IO> {
    /// Send a start condition and the chip address, requiring an ACK
    ///
    /// Also used for repeated starts: no stop is sent first.
    pub fn start_addressed(&mut self, chip: u8, direction: Direction) -> Result<(), Error> {
        self.send_byte(address_byte(chip, direction), true, false);
        self.await_transfer_complete(AckCheck::Ack, self.config.timeouts.transfer_polls)
            .map_err(Error::in_address_phase)
    }

    /// Address `chip` and send `offset_len` bytes of `offset`, MSB first
    ///
    /// For [`Direction::Read`] a repeated start turns the bus around so the
    /// chip can start transmitting from `offset`. `offset_len` 0 sends the
    /// chip address alone.
    pub fn address_with_offset(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        direction: Direction,
    ) -> Result<(), Error> {
        let polls = self.config.timeouts.transfer_polls;

        self.start_addressed(chip, Direction::Write)?;
        for i in 0..offset_len {
            self.send_byte(offset_byte(offset, offset_len, i), false, false);
            self.await_transfer_complete(AckCheck::Ack, polls)?;
        }
        if direction == Direction::Read {
            self.start_addressed(chip, Direction::Read)?;
        }
        Ok(())
    }

    /// Read `buf.len()` bytes from `chip` starting at `offset`
    ///
    /// The last byte is NACKed and followed by a stop. An empty `buf` skips
    /// the read phase and just stops after the word address.
    pub fn read_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        buf: &mut [u8],
    ) -> Result<(), Error> {
        self.await_bus_not_busy(self.config.timeouts.not_busy_polls)?;

        if buf.is_empty() {
            self.address_with_offset(chip, offset, offset_len, Direction::Write)?;
            self.send_stop();
            return Ok(());
        }

        self.address_with_offset(chip, offset, offset_len, Direction::Read)
            .map_err(|e| {
                debug!("I2C read from {=u8:#x} failed to address: {}", chip, e);
                e
            })?;

        let last = buf.len() - 1;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(i == last)?;
        }
        Ok(())
    }

    /// Write `data` to `chip` starting at `offset`
    ///
    /// Every byte must be ACKed; the stop rides on the last one. An empty
    /// `data` stops right after the word address.
    pub fn write_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        data: &[u8],
    ) -> Result<(), Error> {
        let polls = self.config.timeouts.transfer_polls;

        self.await_bus_not_busy(self.config.timeouts.not_busy_polls)?;
        self.address_with_offset(chip, offset, offset_len, Direction::Write)
            .map_err(|e| {
                debug!("I2C write to {=u8:#x} failed to address: {}", chip, e);
                e
            })?;

        let Some(last) = data.len().checked_sub(1) else {
            self.send_stop();
            return Ok(());
        };
        for (i, &byte) in data.iter().enumerate() {
            self.send_byte(byte, false, i == last);
            self.await_transfer_complete(AckCheck::Ack, polls)?;
        }
        Ok(())
    }

    /// Read a fixed number of bytes into a fresh array
    pub fn read_array<const N: usize>(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
    ) -> Result<[u8; N], Error> {
        let mut buf = [0u8; N];
        self.read_block(chip, offset, offset_len, &mut buf)?;
        Ok(buf)
    }

    /// Check whether a device answers at `chip`
    ///
    /// Reads one byte at word address 0 and discards it.
    pub fn probe(&mut self, chip: u8) -> Result<(), Error> {
        self.read_array::<1>(chip, 0, 1).map(|_| ())
    }
}
