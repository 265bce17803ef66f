//! OpenRISC ORDB2A reference board
//!
//! Two I2C controllers hang off the Wishbone bus. Bus 0 carries the
//! EEPROM holding the first Ethernet address; bus 1 carries the one for
//! the second interface.

use ocores_core::{ControllerConfig, OcoresI2c};

use crate::MmioSpace;

/// Board name as printed by the boot banner
pub const BOARD_NAME: &str = "ordb2a";

/// System (Wishbone) clock feeding the I2C prescalers
pub const SYS_CLK_HZ: u32 = 50_000_000;

/// Default I2C bus clock
pub const I2C_SPEED_HZ: u32 = 100_000;

/// Register block base addresses, indexed by bus number
pub const I2C_BASES: [usize; 2] = [0xa000_0000, 0xa100_0000];

/// Controller configuration for this board
pub const fn config() -> ControllerConfig {
    ControllerConfig::new(I2C_BASES, SYS_CLK_HZ)
}

/// The board's I2C controllers, not yet initialized
///
/// # Safety
///
/// Must only run on the ORDB2A (or a bitstream with the same memory map),
/// and at most one returned value may be alive at a time.
pub unsafe fn controller() -> OcoresI2c<MmioSpace> {
    // SAFETY: the caller guarantees the board memory map, so both register
    // blocks named by `config()` are mapped, and exclusive ownership.
    OcoresI2c::new(unsafe { MmioSpace::new() }, config())
}
