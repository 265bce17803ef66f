//! Controller lifecycle
//!
//! Owns the register-space accessor and the bus selection, and brings a
//! controller from an unknown power-on or post-abort state to an enabled
//! master with a clean bus.

use ocores_hal::{I2cBus, I2cConfig, IoSpace};

use crate::config::{prescaler, prescaler_bytes, ControllerConfig, TimeoutBudget};
use crate::error::Error;
use crate::regs::{reg, Command, Control};
use crate::selector::{BusHandle, BusSelector};

/// Polled I2C master over an OpenCores controller
///
/// All operations take `&mut self`, so one transaction can never interleave
/// with another on the same value. Wrap it in a [`SharedBus`] to share it.
///
/// [`SharedBus`]: crate::SharedBus
pub struct OcoresI2c<IO> {
    pub(crate) io: IO,
    pub(crate) selector: BusSelector,
    pub(crate) config: ControllerConfig,
}

impl<IO: IoSpace> OcoresI2c<IO> {
    /// Create a driver over `io`
    ///
    /// No register is touched until the first operation.
    pub fn new(io: IO, config: ControllerConfig) -> Self {
        Self {
            io,
            selector: BusSelector::new(config.base_addresses),
            config,
        }
    }

    /// Make bus `index` the active controller
    pub fn select_bus(&mut self, index: usize) -> Result<BusHandle, Error> {
        let handle = self.selector.select(index).map_err(|e| {
            warn!("I2C bus {=usize} does not exist", index);
            e
        })?;
        debug!("I2C bus {=usize} selected at {=usize:#x}", handle.index, handle.base);
        Ok(handle)
    }

    /// Index of the active controller
    pub fn current_bus(&self) -> Result<usize, Error> {
        self.selector.current()
    }

    /// Configuration in use
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Poll budgets in use
    pub fn timeouts(&self) -> TimeoutBudget {
        self.config.timeouts
    }

    /// Replace the poll budgets
    pub fn set_timeouts(&mut self, timeouts: TimeoutBudget) {
        self.config.timeouts = timeouts;
    }

    /// Borrow the register-space accessor
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Mutably borrow the register-space accessor
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Give back the register-space accessor
    pub fn release(self) -> IO {
        self.io
    }

    /// Program and enable the active controller
    ///
    /// Disables the core, acknowledges any pending interrupt, programs the
    /// prescaler for `clock_hz`, re-enables the core and resets the bus.
    /// `_slave_address` exists for parity with slave-capable controllers;
    /// this driver is master-only.
    ///
    /// An unusable `clock_hz` fails with [`Error::InvalidClock`] before any
    /// register is written.
    pub fn initialize(&mut self, clock_hz: u32, _slave_address: u8) -> Result<(), Error> {
        let prescale = prescaler(self.config.input_clock_hz, clock_hz).map_err(|e| {
            warn!("I2C clock {=u32} Hz not reachable", clock_hz);
            e
        })?;
        let (lo, hi) = prescaler_bytes(prescale);

        self.selector.resolve();

        // Disable controller and ack any pending IRQ
        self.write_register(reg::CTR, Control::empty().bits());
        self.command(Command::IACK);

        self.write_register(reg::PRER_LO, lo);
        self.write_register(reg::PRER_HI, hi);

        self.write_register(reg::CTR, Control::CORE_ENABLE.bits());

        debug!(
            "I2C bus {=usize} enabled at {=u32} Hz (prescaler {=u16})",
            self.selector.current().unwrap_or(usize::MAX),
            clock_hz,
            prescale
        );

        self.reset_bus()
    }

    /// [`initialize`](Self::initialize) from a generic bus configuration
    pub fn init(&mut self, bus: I2cConfig) -> Result<(), Error> {
        self.initialize(bus.frequency, 0)
    }
}

impl<IO: IoSpace> I2cBus for OcoresI2c<IO> {
    type Error = Error;

    fn read_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        buf: &mut [u8],
    ) -> Result<(), Error> {
        OcoresI2c::read_block(self, chip, offset, offset_len, buf)
    }

    fn write_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        data: &[u8],
    ) -> Result<(), Error> {
        OcoresI2c::write_block(self, chip, offset, offset_len, data)
    }

    fn probe(&mut self, chip: u8) -> Result<(), Error> {
        OcoresI2c::probe(self, chip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimIo, BASE_0, BASE_1};

    fn controller(io: SimIo) -> OcoresI2c<SimIo> {
        OcoresI2c::new(io, ControllerConfig::default().with_timeouts(TimeoutBudget::new(32, 32)))
    }

    #[test]
    fn test_zero_clock_writes_nothing() {
        let mut i2c = controller(SimIo::new(BASE_0));

        assert_eq!(i2c.initialize(0, 0), Err(Error::InvalidClock));
        assert!(i2c.io().log().is_empty());
    }

    #[test]
    fn test_unreachable_clock_writes_nothing() {
        let mut i2c = controller(SimIo::new(BASE_0));

        assert_eq!(i2c.initialize(50_000_000, 0), Err(Error::InvalidClock));
        assert!(i2c.io().log().is_empty());
    }

    #[test]
    fn test_initialize_programs_prescaler_and_enables() {
        let mut i2c = controller(SimIo::new(BASE_0));

        i2c.initialize(100_000, 0).unwrap();

        let sim = i2c.io();
        assert_eq!(sim.register(reg::PRER_LO), 99);
        assert_eq!(sim.register(reg::PRER_HI), 0);
        assert!(sim.is_enabled());
        assert_eq!(i2c.current_bus(), Ok(0));
    }

    #[test]
    fn test_initialize_sequence() {
        let mut i2c = controller(SimIo::new(BASE_0));

        i2c.initialize(100_000, 0).unwrap();

        let sim = i2c.io();
        // Disable, ack, prescaler, enable, in that order
        assert_eq!(
            &sim.writes_to(reg::CTR).collect::<heapless::Vec<u8, 4>>()[..],
            &[0x00, 0x80]
        );
        // IACK, then the reset cycle: dummy read, stop
        assert_eq!(
            &sim.commands().collect::<heapless::Vec<u8, 4>>()[..],
            &[0x01, 0x21, 0x41]
        );
    }

    #[test]
    fn test_initialize_on_second_bus() {
        let mut i2c = controller(SimIo::new(BASE_1));
        i2c.select_bus(1).unwrap();

        i2c.init(I2cConfig::FAST).unwrap();

        assert_eq!(i2c.io().register(reg::PRER_LO), 24);
        assert_eq!(i2c.current_bus(), Ok(1));
    }

    #[test]
    fn test_initialize_reports_stuck_bus() {
        let mut sim = SimIo::new(BASE_0);
        sim.set_stuck_busy(true);
        let mut i2c = controller(sim);

        assert_eq!(i2c.initialize(100_000, 0), Err(Error::Busy));
    }

    #[test]
    fn test_select_out_of_range_keeps_bus() {
        let mut i2c = controller(SimIo::new(BASE_0));
        i2c.select_bus(1).unwrap();

        assert_eq!(i2c.select_bus(2), Err(Error::InvalidBus));
        assert_eq!(i2c.current_bus(), Ok(1));
    }
}
