//! Controller register map and raw register access
//!
//! Register layout of the `i2c_master_slave` core. TXR/RXR and CR/SR share
//! an offset: writes hit the first, reads return the second.

use ocores_hal::IoSpace;

use crate::controller::OcoresI2c;

/// Register offsets from the controller base address
pub mod reg {
    /// Clock prescaler, low byte
    pub const PRER_LO: u8 = 0x0;
    /// Clock prescaler, high byte
    pub const PRER_HI: u8 = 0x1;
    /// Control register
    pub const CTR: u8 = 0x2;
    /// Transmit register (write)
    pub const TXR: u8 = 0x3;
    /// Receive register (read)
    pub const RXR: u8 = 0x3;
    /// Command register (write)
    pub const CR: u8 = 0x4;
    /// Status register (read)
    pub const SR: u8 = 0x4;
    /// Own slave address (slave mode only)
    pub const SLADR: u8 = 0x7;
}

/// Size of the register block in bytes
pub const BLOCK_SIZE: usize = 8;

bitflags::bitflags! {
    /// CTR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u8 {
        /// Core enable
        const CORE_ENABLE = 0x80;
        /// Interrupt enable
        const INTR_ENABLE = 0x40;
        /// Slave mode enable
        const SLAVE_ENABLE = 0x20;
    }
}

bitflags::bitflags! {
    /// CR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Command: u8 {
        /// Generate (repeated) start condition
        const START = 0x80;
        /// Generate stop condition
        const STOP = 0x40;
        /// Read a byte from the slave
        const READ = 0x20;
        /// Write TXR to the slave
        const WRITE = 0x10;
        /// Acknowledge bit to send when reading; set means NACK
        const ACK = 0x08;
        /// Continue a slave-mode transfer
        const SLAVE_CONT = 0x02;
        /// Clear a pending interrupt
        const IACK = 0x01;
    }
}

bitflags::bitflags! {
    /// SR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Acknowledge received from the slave; set means NACK
        const RXACK = 0x80;
        /// Bus busy (start seen, stop not yet seen)
        const BUSY = 0x40;
        /// Arbitration lost
        const ARB_LOST = 0x20;
        /// Addressed as slave
        const SLAVE_MODE = 0x10;
        /// Slave data available
        const SLAVE_DATA_AVAIL = 0x08;
        /// Slave data requested
        const SLAVE_DATA_REQ = 0x04;
        /// Transfer in progress
        const TIP = 0x02;
        /// Interrupt pending
        const IRQ_FLAG = 0x01;
    }
}

impl<IO: IoSpace> OcoresI2c<IO> {
    /// Read a register of the active controller
    pub fn read_register(&mut self, offset: u8) -> u8 {
        let addr = self.selector.resolve() + usize::from(offset);
        let value = self.io.read8(addr);
        trace!("I2C read {=u8:#x} = {=u8:#x}", offset, value);
        value
    }

    /// Write a register of the active controller
    pub fn write_register(&mut self, offset: u8, value: u8) {
        let addr = self.selector.resolve() + usize::from(offset);
        trace!("I2C write {=u8:#x} = {=u8:#x}", offset, value);
        self.io.write8(addr, value);
    }

    pub(crate) fn status(&mut self) -> Status {
        Status::from_bits_retain(self.read_register(reg::SR))
    }

    pub(crate) fn command(&mut self, cmd: Command) {
        self.write_register(reg::CR, cmd.bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::sim::{Access, SimIo, BASE_0, BASE_1};

    fn controller() -> OcoresI2c<SimIo> {
        OcoresI2c::new(SimIo::new(BASE_0), ControllerConfig::default())
    }

    #[test]
    fn test_command_bits_match_register_map() {
        assert_eq!((Command::START | Command::WRITE | Command::IACK).bits(), 0x91);
        assert_eq!((Command::READ | Command::STOP | Command::ACK).bits(), 0x68);
        assert_eq!((Command::STOP | Command::IACK).bits(), 0x41);
        assert_eq!(Control::CORE_ENABLE.bits(), 0x80);
    }

    #[test]
    fn test_status_keeps_unknown_bits() {
        let status = Status::from_bits_retain(0xFF);
        assert!(status.contains(Status::RXACK | Status::BUSY | Status::TIP));
        assert_eq!(status.bits(), 0xFF);
    }

    #[test]
    fn test_access_defaults_to_bus_zero() {
        let mut i2c = controller();
        i2c.write_register(reg::PRER_LO, 0x42);

        assert_eq!(
            i2c.io().log().last(),
            Some(&Access::Write { addr: BASE_0, value: 0x42 })
        );
        assert_eq!(i2c.current_bus(), Ok(0));
    }

    #[test]
    fn test_access_follows_selected_bus() {
        let mut i2c = controller();
        i2c.select_bus(1).unwrap();
        i2c.write_register(reg::CTR, 0x80);
        let _ = i2c.read_register(reg::SR);

        let log = i2c.io().log();
        assert_eq!(log[0], Access::Write { addr: BASE_1 + 2, value: 0x80 });
        assert!(matches!(log[1], Access::Read { addr, .. } if addr == BASE_1 + 4));
    }
}
