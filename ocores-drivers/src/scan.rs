//! Bus scan
//!
//! Probes every address outside the two reserved blocks (0x00-0x07 and
//! 0x78-0x7F) and reports the ones that answer.

use embedded_hal::i2c::{Error as _, ErrorKind};
use heapless::Vec;
use ocores_hal::I2cBus;

/// First address probed
pub const FIRST_ADDRESS: u8 = 0x08;
/// Last address probed
pub const LAST_ADDRESS: u8 = 0x77;

/// Whether `chip` falls in a reserved block
pub const fn is_reserved(chip: u8) -> bool {
    chip < FIRST_ADDRESS || chip > LAST_ADDRESS
}

/// Probe the whole address range and collect responders, lowest first
///
/// An address NACK just means nobody is there; any other failure aborts
/// the scan. Responders beyond `N` are not recorded.
pub fn scan<B, const N: usize>(bus: &mut B) -> Result<Vec<u8, N>, B::Error>
where
    B: I2cBus,
    B::Error: embedded_hal::i2c::Error,
{
    let mut found = Vec::new();

    for chip in FIRST_ADDRESS..=LAST_ADDRESS {
        match bus.probe(chip) {
            Ok(()) => {
                if found.push(chip).is_err() {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocores_core::sim::{SimDevice, SimIo, BASE_0};
    use ocores_core::{ControllerConfig, Error, OcoresI2c, TimeoutBudget};

    fn controller(sim: SimIo) -> OcoresI2c<SimIo> {
        let config = ControllerConfig::default().with_timeouts(TimeoutBudget::new(64, 64));
        let mut i2c = OcoresI2c::new(sim, config);
        i2c.initialize(100_000, 0).unwrap();
        i2c
    }

    #[test]
    fn test_reserved_ranges() {
        assert!(is_reserved(0x00));
        assert!(is_reserved(0x07));
        assert!(!is_reserved(0x08));
        assert!(!is_reserved(0x77));
        assert!(is_reserved(0x78));
        assert!(is_reserved(0x7F));
    }

    #[test]
    fn test_scan_finds_devices_in_order() {
        let sim = SimIo::new(BASE_0)
            .with_device(SimDevice::new(0x68))
            .with_device(SimDevice::new(0x50))
            .with_device(SimDevice::new(0x54));
        let mut i2c = controller(sim);

        let found: Vec<u8, 8> = scan(&mut i2c).unwrap();

        assert_eq!(&found[..], &[0x50, 0x54, 0x68]);
        // Every probe ended with a stop
        assert!(!i2c.io().bus_owned());
    }

    #[test]
    fn test_scan_empty_bus() {
        let mut i2c = controller(SimIo::new(BASE_0));

        let found: Vec<u8, 8> = scan(&mut i2c).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_skips_reserved_addresses() {
        let sim = SimIo::new(BASE_0)
            .with_device(SimDevice::new(0x03))
            .with_device(SimDevice::new(0x7C));
        let mut i2c = controller(sim);

        let found: Vec<u8, 8> = scan(&mut i2c).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_stops_when_full() {
        let sim = SimIo::new(BASE_0)
            .with_device(SimDevice::new(0x20))
            .with_device(SimDevice::new(0x21));
        let mut i2c = controller(sim);

        let found: Vec<u8, 1> = scan(&mut i2c).unwrap();
        assert_eq!(&found[..], &[0x20]);
    }

    #[test]
    fn test_scan_aborts_on_bus_fault() {
        let mut i2c = controller(SimIo::new(BASE_0).with_device(SimDevice::new(0x50)));
        i2c.io_mut().set_stuck_busy(true);

        let result: Result<Vec<u8, 8>, _> = scan(&mut i2c);
        assert_eq!(result, Err(Error::Busy));
    }
}
