//! Ethernet address EEPROM
//!
//! The reference board stores each interface's MAC address in the last
//! six bytes of a 24C02 at chip 0x50. Interface 0 uses the EEPROM on bus 0;
//! every other interface uses the one on bus 1.

use core::fmt;

use ocores_core::{Error, OcoresI2c};
use ocores_hal::{I2cBus, IoSpace};

/// EEPROM chip address holding the MAC
pub const MAC_CHIP: u8 = 0x50;
/// Word address of the first MAC byte
pub const MAC_OFFSET: u32 = 0xFA;
/// Word address bytes of the EEPROM
pub const MAC_OFFSET_LEN: usize = 1;

/// A 48-bit Ethernet address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Address bytes in transmission order
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Group address bit set
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// All zeros, as left by an unprogrammed part
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Usable as a station address: unicast and not all zeros
    pub fn is_valid(&self) -> bool {
        !self.is_multicast() && !self.is_zero()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

/// MAC read failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacError<E> {
    /// The EEPROM could not be read
    Bus(E),
    /// The stored bytes are not a station address
    Invalid(MacAddress),
}

impl<E> From<E> for MacError<E> {
    fn from(e: E) -> Self {
        MacError::Bus(e)
    }
}

/// Bus carrying the EEPROM for Ethernet interface `interface`
pub const fn bus_for_interface(interface: usize) -> usize {
    if interface == 0 {
        0
    } else {
        1
    }
}

/// Read and validate the MAC stored on `bus`
pub fn read_mac<B: I2cBus>(bus: &mut B) -> Result<MacAddress, MacError<B::Error>> {
    let mut octets = [0u8; 6];
    bus.read_block(MAC_CHIP, MAC_OFFSET, MAC_OFFSET_LEN, &mut octets)?;

    let mac = MacAddress(octets);
    if mac.is_valid() {
        Ok(mac)
    } else {
        Err(MacError::Invalid(mac))
    }
}

/// Fetch the MAC for Ethernet interface `interface`
///
/// Selects the interface's bus, brings the controller up at `bus_hz`, then
/// reads the EEPROM. The bus stays selected afterwards.
pub fn read_board_mac<IO: IoSpace>(
    i2c: &mut OcoresI2c<IO>,
    interface: usize,
    bus_hz: u32,
) -> Result<MacAddress, MacError<Error>> {
    i2c.select_bus(bus_for_interface(interface))?;
    i2c.initialize(bus_hz, 0)?;
    read_mac(i2c)
}
