//! Shared bus access
//!
//! The driver assumes nothing else touches the controller between the
//! bus-not-busy wait and the final stop of a transfer, and that the active
//! bus does not change meanwhile. Where more than one context can reach
//! the controller, [`SharedBus`] makes each complete transfer one critical
//! section.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use ocores_hal::{I2cBus, IoSpace};

use crate::controller::OcoresI2c;
use crate::error::Error;

/// A controller behind a blocking mutex
///
/// `M` picks the locking flavour: `CriticalSectionRawMutex` when interrupt
/// handlers or other cores share the bus, `NoopRawMutex` for a single
/// thread.
pub struct SharedBus<M: RawMutex, IO> {
    inner: Mutex<M, RefCell<OcoresI2c<IO>>>,
}

impl<M: RawMutex, IO: IoSpace> SharedBus<M, IO> {
    /// Wrap `i2c`, using `raw` as the lock
    pub const fn new(raw: M, i2c: OcoresI2c<IO>) -> Self {
        Self {
            inner: Mutex::const_new(raw, RefCell::new(i2c)),
        }
    }

    /// Run `f` with exclusive use of the controller
    ///
    /// Bus selection and every transfer made inside `f` happen under one
    /// lock, so a select-then-transfer sequence cannot be split.
    ///
    /// # Panics
    ///
    /// Panics if `f` re-enters `transaction` on the same bus.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut OcoresI2c<IO>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Run a transfer on bus `index`
    pub fn on_bus<R>(
        &self,
        index: usize,
        f: impl FnOnce(&mut OcoresI2c<IO>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.transaction(|i2c| {
            i2c.select_bus(index)?;
            f(i2c)
        })
    }

    /// Take the controller back out
    pub fn into_inner(self) -> OcoresI2c<IO> {
        self.inner.into_inner().into_inner()
    }
}

impl<M: RawMutex, IO: IoSpace> I2cBus for &SharedBus<M, IO> {
    type Error = Error;

    fn read_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        buf: &mut [u8],
    ) -> Result<(), Error> {
        self.transaction(|i2c| i2c.read_block(chip, offset, offset_len, buf))
    }

    fn write_block(
        &mut self,
        chip: u8,
        offset: u32,
        offset_len: usize,
        data: &[u8],
    ) -> Result<(), Error> {
        self.transaction(|i2c| i2c.write_block(chip, offset, offset_len, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ControllerConfig, TimeoutBudget};
    use crate::sim::{SimDevice, SimIo, BASE_0};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn shared() -> SharedBus<NoopRawMutex, SimIo> {
        let sim = SimIo::new(BASE_0).with_device(SimDevice::new(0x50));
        let config = ControllerConfig::default().with_timeouts(TimeoutBudget::new(64, 64));
        let mut i2c = OcoresI2c::new(sim, config);
        i2c.initialize(100_000, 0).unwrap();
        SharedBus::new(NoopRawMutex::new(), i2c)
    }

    #[test]
    fn test_transfers_through_trait() {
        let bus = shared();
        let mut handle = &bus;

        handle.write_block(0x50, 0x04, 1, &[0x11, 0x22]).unwrap();
        let mut buf = [0u8; 2];
        handle.read_block(0x50, 0x04, 1, &mut buf).unwrap();

        assert_eq!(buf, [0x11, 0x22]);
        assert!(handle.probe(0x50).is_ok());
    }

    #[test]
    fn test_on_bus_selects_first() {
        let bus = shared();

        let r = bus.on_bus(1, |i2c| i2c.current_bus());
        assert_eq!(r, Ok(1));

        let r = bus.on_bus(5, |i2c| i2c.current_bus());
        assert_eq!(r, Err(Error::InvalidBus));
        // Failed selection did not disturb bus 1
        assert_eq!(bus.transaction(|i2c| i2c.current_bus()), Ok(1));
    }

    #[test]
    fn test_into_inner_returns_controller() {
        let bus = shared();
        bus.transaction(|i2c| i2c.probe(0x50)).unwrap();

        let i2c = bus.into_inner();
        assert!(i2c.io().status_reads() > 0);
    }
}
