//! In-memory controller model
//!
//! A behavioural stand-in for the register block, used by the host tests
//! here and (with the `sim` feature) by downstream crates. It decodes
//! command writes the way the controller does, answers with a small set of
//! simulated slave devices, and records every register access so tests can
//! assert exact command sequences and poll counts.
//!
//! Faults are injected explicitly: a BUSY line that never clears, a
//! transfer that never finishes, arbitration loss on a chosen byte, and
//! devices that refuse payload bytes or hold off while "programming".

use heapless::Vec;
use ocores_hal::IoSpace;

use crate::regs::{reg, Command, Control, Status, BLOCK_SIZE};

/// Base address of bus 0 in the default configuration
pub const BASE_0: usize = 0xa000_0000;
/// Base address of bus 1 in the default configuration
pub const BASE_1: usize = 0xa100_0000;

/// Accesses kept in the log; later ones are dropped
pub const LOG_CAPACITY: usize = 1024;
/// Devices one bus can carry
pub const MAX_DEVICES: usize = 8;
/// Bytes of memory behind each device
pub const MEMORY_SIZE: usize = 1024;

/// Status polls that see TIP after each transfer, unless changed
const DEFAULT_TIP_LATENCY: u32 = 2;

/// One recorded register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Byte read from `addr`
    Read { addr: usize, value: u8 },
    /// Byte written to `addr`
    Write { addr: usize, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Offset { remaining: usize, acc: u32 },
    Write,
    Read,
}

/// A simulated slave: a memory array behind a word-address pointer
#[derive(Debug, Clone)]
pub struct SimDevice {
    address: u8,
    offset_len: usize,
    page_size: Option<usize>,
    write_cycle: u32,
    busy_for: u32,
    nack_data: bool,
    pointer: usize,
    written: bool,
    memory: [u8; MEMORY_SIZE],
}

impl SimDevice {
    /// Device at `address` with a one-byte word address
    pub fn new(address: u8) -> Self {
        Self {
            address,
            offset_len: 1,
            page_size: None,
            write_cycle: 0,
            busy_for: 0,
            nack_data: false,
            pointer: 0,
            written: false,
            memory: [0xFF; MEMORY_SIZE],
        }
    }

    /// Use a word address of `len` bytes (0 for none)
    pub fn with_offset_len(mut self, len: usize) -> Self {
        self.offset_len = len;
        self
    }

    /// Wrap writes inside pages of `size` bytes, like an EEPROM page buffer
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// NACK the next `attempts` addressings after a write is stopped
    pub fn with_write_cycle(mut self, attempts: u32) -> Self {
        self.write_cycle = attempts;
        self
    }

    /// Refuse payload bytes
    pub fn set_nack_data(&mut self, nack: bool) {
        self.nack_data = nack;
    }

    /// 7-bit chip address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Device memory
    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    /// Device memory, for preloading contents
    pub fn memory_mut(&mut self) -> &mut [u8; MEMORY_SIZE] {
        &mut self.memory
    }

    /// Still ignoring its address after a write
    pub fn is_programming(&self) -> bool {
        self.busy_for > 0
    }

    fn advance_write(&self) -> usize {
        match self.page_size {
            Some(page) => {
                let start = self.pointer - self.pointer % page;
                start + (self.pointer + 1) % page
            }
            None => (self.pointer + 1) % MEMORY_SIZE,
        }
    }
}

/// Simulated register block at one base address
///
/// Accesses outside the block are logged, read as zero and otherwise
/// ignored.
#[derive(Debug)]
pub struct SimIo {
    base: usize,
    regs: [u8; BLOCK_SIZE],
    rxr: u8,
    status: Status,
    bus_owned: bool,
    stuck_busy: bool,
    tip_latency: u32,
    tip_left: u32,
    arbitration_after: Option<u32>,
    devices: Vec<SimDevice, MAX_DEVICES>,
    active: Option<usize>,
    phase: Phase,
    log: Vec<Access, LOG_CAPACITY>,
    status_reads: usize,
}

impl SimIo {
    /// Idle, disabled controller at `base` with no devices
    pub fn new(base: usize) -> Self {
        Self {
            base,
            regs: [0; BLOCK_SIZE],
            rxr: 0,
            status: Status::empty(),
            bus_owned: false,
            stuck_busy: false,
            tip_latency: DEFAULT_TIP_LATENCY,
            tip_left: 0,
            arbitration_after: None,
            devices: Vec::new(),
            active: None,
            phase: Phase::Idle,
            log: Vec::new(),
            status_reads: 0,
        }
    }

    /// Attach a device
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_DEVICES`] are attached.
    pub fn with_device(mut self, device: SimDevice) -> Self {
        assert!(self.devices.push(device).is_ok(), "too many simulated devices");
        self
    }

    /// Device at `address`
    pub fn device(&self, address: u8) -> Option<&SimDevice> {
        self.devices.iter().find(|d| d.address == address)
    }

    /// Device at `address`, mutably
    pub fn device_mut(&mut self, address: u8) -> Option<&mut SimDevice> {
        self.devices.iter_mut().find(|d| d.address == address)
    }

    /// Status polls that see TIP after each transfer
    pub fn set_tip_latency(&mut self, polls: u32) {
        self.tip_latency = polls;
    }

    /// Hold BUSY set no matter what
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Lose arbitration on the next byte transfer
    pub fn lose_arbitration(&mut self) {
        self.lose_arbitration_after(0);
    }

    /// Let `transfers` byte transfers through, then lose arbitration
    pub fn lose_arbitration_after(&mut self, transfers: u32) {
        self.arbitration_after = Some(transfers);
    }

    /// Forget any transfer in flight and clear latched flags
    pub fn reset_bus_state(&mut self) {
        self.status = Status::empty();
        self.bus_owned = false;
        self.tip_left = 0;
        self.arbitration_after = None;
        self.active = None;
        self.phase = Phase::Idle;
    }

    /// Every access since the last [`clear_log`](Self::clear_log)
    pub fn log(&self) -> &[Access] {
        &self.log
    }

    /// Drop the access log and the status poll count
    pub fn clear_log(&mut self) {
        self.log.clear();
        self.status_reads = 0;
    }

    /// Status register reads since the last [`clear_log`](Self::clear_log)
    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    /// Values written to register `offset` of this block, in order
    pub fn writes_to(&self, offset: u8) -> impl Iterator<Item = u8> + '_ {
        let target = self.base + usize::from(offset);
        self.log.iter().filter_map(move |access| match *access {
            Access::Write { addr, value } if addr == target => Some(value),
            _ => None,
        })
    }

    /// Values written to the command register, in order
    pub fn commands(&self) -> impl Iterator<Item = u8> + '_ {
        self.writes_to(reg::CR)
    }

    /// Last value written to register `offset`
    pub fn register(&self, offset: u8) -> u8 {
        self.regs[usize::from(offset)]
    }

    /// Core enable bit set in CTR
    pub fn is_enabled(&self) -> bool {
        Control::from_bits_retain(self.regs[usize::from(reg::CTR)]).contains(Control::CORE_ENABLE)
    }

    /// A start has been issued and no stop since
    pub fn bus_owned(&self) -> bool {
        self.bus_owned
    }

    fn offset_of(&self, addr: usize) -> Option<u8> {
        addr.checked_sub(self.base)
            .filter(|&o| o < BLOCK_SIZE)
            .map(|o| o as u8)
    }

    fn record(&mut self, access: Access) {
        // A full log keeps its oldest entries
        let _ = self.log.push(access);
    }

    fn poll_status(&mut self) -> u8 {
        self.status_reads += 1;

        let mut status = self.status;
        if self.tip_left > 0 {
            self.tip_left -= 1;
            status |= Status::TIP;
        }
        if self.bus_owned || self.stuck_busy {
            status |= Status::BUSY;
        }
        status.bits()
    }

    fn execute(&mut self, cmd: Command) {
        if !self.is_enabled() {
            return;
        }

        if cmd.intersects(Command::READ | Command::WRITE) {
            let lose = match self.arbitration_after {
                Some(0) => {
                    self.arbitration_after = None;
                    true
                }
                Some(n) => {
                    self.arbitration_after = Some(n - 1);
                    false
                }
                None => false,
            };
            if lose {
                self.status.insert(Status::ARB_LOST);
                self.tip_left = 0;
                self.bus_owned = false;
                self.active = None;
                self.phase = Phase::Idle;
                return;
            }

            self.tip_left = self.tip_latency;
            if cmd.contains(Command::START) {
                self.status.remove(Status::ARB_LOST);
                self.bus_owned = true;
            }
            if cmd.contains(Command::WRITE) {
                let byte = self.regs[usize::from(reg::TXR)];
                let acked = self.transmit(cmd.contains(Command::START), byte);
                self.status.set(Status::RXACK, !acked);
            } else {
                self.rxr = self.receive();
            }
        }

        if cmd.contains(Command::STOP) {
            self.stop();
        }
    }

    /// Put `byte` on the bus; returns whether it was ACKed
    fn transmit(&mut self, start: bool, byte: u8) -> bool {
        if start {
            self.active = None;
            self.phase = Phase::Idle;

            let chip = byte >> 1;
            let Some(i) = self.devices.iter().position(|d| d.address == chip) else {
                return false;
            };
            let dev = &mut self.devices[i];
            if dev.busy_for > 0 {
                dev.busy_for -= 1;
                return false;
            }

            self.active = Some(i);
            self.phase = if byte & 1 == 1 {
                Phase::Read
            } else if dev.offset_len == 0 {
                Phase::Write
            } else {
                Phase::Offset {
                    remaining: dev.offset_len,
                    acc: 0,
                }
            };
            return true;
        }

        let Some(i) = self.active else {
            return false;
        };
        let dev = &mut self.devices[i];
        match self.phase {
            Phase::Offset { remaining, acc } => {
                let acc = (acc << 8) | u32::from(byte);
                if remaining == 1 {
                    dev.pointer = acc as usize % MEMORY_SIZE;
                    self.phase = Phase::Write;
                } else {
                    self.phase = Phase::Offset {
                        remaining: remaining - 1,
                        acc,
                    };
                }
                true
            }
            Phase::Write => {
                if dev.nack_data {
                    return false;
                }
                dev.memory[dev.pointer] = byte;
                dev.written = true;
                dev.pointer = dev.advance_write();
                true
            }
            Phase::Read | Phase::Idle => false,
        }
    }

    fn receive(&mut self) -> u8 {
        let (Some(i), Phase::Read) = (self.active, self.phase) else {
            return 0xFF;
        };
        let dev = &mut self.devices[i];
        let value = dev.memory[dev.pointer];
        dev.pointer = (dev.pointer + 1) % MEMORY_SIZE;
        value
    }

    fn stop(&mut self) {
        if let Some(i) = self.active {
            let dev = &mut self.devices[i];
            if dev.written {
                dev.written = false;
                dev.busy_for = dev.write_cycle;
            }
        }
        self.active = None;
        self.phase = Phase::Idle;
        self.bus_owned = false;
    }
}

impl IoSpace for SimIo {
    fn read8(&mut self, addr: usize) -> u8 {
        let value = match self.offset_of(addr) {
            Some(reg::SR) => self.poll_status(),
            Some(reg::RXR) => self.rxr,
            Some(offset) => self.regs[usize::from(offset)],
            None => 0,
        };
        self.record(Access::Read { addr, value });
        value
    }

    fn write8(&mut self, addr: usize, value: u8) {
        self.record(Access::Write { addr, value });
        match self.offset_of(addr) {
            Some(reg::CR) => self.execute(Command::from_bits_retain(value)),
            Some(offset) => self.regs[usize::from(offset)] = value,
            None => {}
        }
    }
}
