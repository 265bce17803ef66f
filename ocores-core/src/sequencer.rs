//! Primitive sequencer
//!
//! Single-byte transfers and the status polls that observe them. Start and
//! stop conditions are attached to the byte they frame, the way the
//! command register defines them, so a framed byte costs one command write.
//!
//! Nothing here waits implicitly: [`send_byte`](OcoresI2c::send_byte) only
//! kicks off a transfer, and completion is observed with
//! [`await_transfer_complete`](OcoresI2c::await_transfer_complete).

use ocores_hal::IoSpace;

use crate::controller::OcoresI2c;
use crate::error::{Error, NackSource};
use crate::regs::{reg, Command, Status};

/// Acknowledge expected after a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckCheck {
    /// Ignore the acknowledge bit
    DontCare,
    /// The receiver must ACK; a NACK releases the bus with a stop
    Ack,
    /// The receiver must NACK
    Nack,
}

impl<IO: IoSpace> OcoresI2c<IO> {
    /// Load `byte` into TXR and start transmitting it
    pub fn send_byte(&mut self, byte: u8, start: bool, stop: bool) {
        let mut cmd = Command::WRITE | Command::IACK;
        cmd.set(Command::START, start);
        cmd.set(Command::STOP, stop);

        self.write_register(reg::TXR, byte);
        self.command(cmd);
    }

    /// Generate a stop condition
    pub fn send_stop(&mut self) {
        self.command(Command::STOP | Command::IACK);
    }

    /// Poll until the bus is idle
    ///
    /// Reads the status register at most `polls` times.
    pub fn await_bus_not_busy(&mut self, polls: u32) -> Result<(), Error> {
        for _ in 0..polls {
            if !self.status().contains(Status::BUSY) {
                return Ok(());
            }
        }
        warn!("I2C bus still busy after {=u32} polls", polls);
        Err(Error::Busy)
    }

    /// Poll until the current byte transfer finishes, then check its ACK
    ///
    /// Arbitration loss fails immediately whatever `ack` says. A NACK where
    /// an ACK was required issues a stop before failing, so the bus is
    /// released on every acknowledge failure.
    pub fn await_transfer_complete(&mut self, ack: AckCheck, polls: u32) -> Result<(), Error> {
        for _ in 0..polls {
            let status = self.status();

            if status.contains(Status::ARB_LOST) {
                warn!("I2C arbitration lost");
                return Err(Error::ArbitrationLost);
            }
            if status.contains(Status::TIP) {
                continue;
            }

            let nacked = status.contains(Status::RXACK);
            return match (ack, nacked) {
                (AckCheck::DontCare, _) | (AckCheck::Ack, false) | (AckCheck::Nack, true) => Ok(()),
                (AckCheck::Ack, true) => {
                    self.send_stop();
                    Err(Error::NotAcknowledged(NackSource::Data))
                }
                (AckCheck::Nack, false) => Err(Error::NotAcknowledged(NackSource::Data)),
            };
        }
        warn!("I2C transfer incomplete after {=u32} polls", polls);
        Err(Error::Timeout)
    }

    /// Receive one byte
    ///
    /// With `stop` the byte is NACKed and followed by a stop condition,
    /// which is how a master ends a read.
    pub fn read_byte(&mut self, stop: bool) -> Result<u8, Error> {
        self.receive_byte(stop, stop)
    }

    /// Receive one byte, choosing the acknowledge and stop independently
    ///
    /// A NACK without stop ends a read segment that is followed by a
    /// repeated start.
    pub(crate) fn receive_byte(&mut self, nack: bool, stop: bool) -> Result<u8, Error> {
        let mut cmd = Command::READ;
        cmd.set(Command::ACK, nack);
        cmd.set(Command::STOP, stop);
        self.command(cmd);

        self.await_transfer_complete(AckCheck::DontCare, self.config.timeouts.transfer_polls)?;
        Ok(self.read_register(reg::RXR))
    }

    /// Clear whatever state an aborted transaction left on the bus
    ///
    /// Clocks one dummy read, then stops and waits for the bus to go idle.
    pub fn reset_bus(&mut self) -> Result<(), Error> {
        let timeouts = self.config.timeouts;

        self.command(Command::READ | Command::IACK);
        self.await_transfer_complete(AckCheck::DontCare, timeouts.transfer_polls)?;
        self.send_stop();
        self.await_bus_not_busy(timeouts.not_busy_polls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ControllerConfig, TimeoutBudget};
    use crate::sim::{SimDevice, SimIo, BASE_0};

    const BUDGET: TimeoutBudget = TimeoutBudget::new(25, 40);

    fn controller(sim: SimIo) -> OcoresI2c<SimIo> {
        let mut i2c = OcoresI2c::new(sim, ControllerConfig::default().with_timeouts(BUDGET));
        i2c.initialize(100_000, 0).unwrap();
        i2c.io_mut().clear_log();
        i2c
    }

    #[test]
    fn test_send_byte_framing() {
        let mut i2c = controller(SimIo::new(BASE_0));

        i2c.send_byte(0xA0, true, false);
        i2c.send_byte(0x12, false, false);
        i2c.send_byte(0x34, false, true);

        let sim = i2c.io();
        assert_eq!(
            &sim.commands().collect::<heapless::Vec<u8, 4>>()[..],
            &[0x91, 0x11, 0x51]
        );
        assert_eq!(
            &sim.writes_to(reg::TXR).collect::<heapless::Vec<u8, 4>>()[..],
            &[0xA0, 0x12, 0x34]
        );
    }

    #[test]
    fn test_stuck_busy_polls_exactly_budget() {
        let mut sim = SimIo::new(BASE_0);
        sim.set_stuck_busy(true);
        let mut i2c = OcoresI2c::new(sim, ControllerConfig::default().with_timeouts(BUDGET));

        assert_eq!(i2c.await_bus_not_busy(25), Err(Error::Busy));
        assert_eq!(i2c.io().status_reads(), 25);
    }

    #[test]
    fn test_zero_budget_fails_without_polling() {
        let mut i2c = controller(SimIo::new(BASE_0));

        assert_eq!(i2c.await_bus_not_busy(0), Err(Error::Busy));
        assert_eq!(i2c.await_transfer_complete(AckCheck::DontCare, 0), Err(Error::Timeout));
        assert_eq!(i2c.io().status_reads(), 0);
    }

    #[test]
    fn test_idle_bus_needs_one_poll() {
        let mut i2c = controller(SimIo::new(BASE_0));

        assert_eq!(i2c.await_bus_not_busy(25), Ok(()));
        assert_eq!(i2c.io().status_reads(), 1);
    }

    #[test]
    fn test_transfer_waits_out_tip() {
        let mut i2c = controller(SimIo::new(BASE_0).with_device(SimDevice::new(0x50)));
        i2c.io_mut().set_tip_latency(7);

        i2c.send_byte(0xA0, true, false);
        assert_eq!(i2c.await_transfer_complete(AckCheck::Ack, 40), Ok(()));
        // Seven polls see TIP, the eighth sees completion
        assert_eq!(i2c.io().status_reads(), 8);
    }

    #[test]
    fn test_stuck_tip_times_out() {
        let mut i2c = controller(SimIo::new(BASE_0).with_device(SimDevice::new(0x50)));
        i2c.io_mut().set_tip_latency(u32::MAX);

        i2c.send_byte(0xA0, true, false);
        assert_eq!(i2c.await_transfer_complete(AckCheck::Ack, 40), Err(Error::Timeout));
        assert_eq!(i2c.io().status_reads(), 40);
    }

    #[test]
    fn test_nack_when_ack_required_sends_stop() {
        let mut i2c = controller(SimIo::new(BASE_0));

        i2c.send_byte(0xA0, true, false);
        assert_eq!(
            i2c.await_transfer_complete(AckCheck::Ack, 40),
            Err(Error::NotAcknowledged(NackSource::Data))
        );
        assert_eq!(i2c.io().commands().last(), Some(0x41));
        assert!(!i2c.io().bus_owned());
    }

    #[test]
    fn test_nack_expected() {
        let mut i2c = controller(SimIo::new(BASE_0));

        // Nobody at 0x50, so the address byte is NACKed
        i2c.send_byte(0xA0, true, false);
        assert_eq!(i2c.await_transfer_complete(AckCheck::Nack, 40), Ok(()));
        // No recovery stop on the expected outcome
        assert_eq!(i2c.io().commands().last(), Some(0x91));
    }

    #[test]
    fn test_ack_when_nack_required() {
        let mut i2c = controller(SimIo::new(BASE_0).with_device(SimDevice::new(0x50)));

        i2c.send_byte(0xA0, true, false);
        assert_eq!(
            i2c.await_transfer_complete(AckCheck::Nack, 40),
            Err(Error::NotAcknowledged(NackSource::Data))
        );
    }

    #[test]
    fn test_dont_care_ignores_nack() {
        let mut i2c = controller(SimIo::new(BASE_0));

        i2c.send_byte(0xA0, true, false);
        assert_eq!(i2c.await_transfer_complete(AckCheck::DontCare, 40), Ok(()));
    }

    #[test]
    fn test_arbitration_loss_beats_ack_check() {
        let mut i2c = controller(SimIo::new(BASE_0).with_device(SimDevice::new(0x50)));
        i2c.io_mut().lose_arbitration();

        i2c.send_byte(0xA0, true, false);
        for ack in [AckCheck::DontCare, AckCheck::Ack, AckCheck::Nack] {
            assert_eq!(i2c.await_transfer_complete(ack, 40), Err(Error::ArbitrationLost));
        }
    }

    #[test]
    fn test_read_byte_framing() {
        let mut i2c = controller(SimIo::new(BASE_0));

        let _ = i2c.read_byte(false).unwrap();
        let _ = i2c.read_byte(true).unwrap();

        assert_eq!(
            &i2c.io().commands().collect::<heapless::Vec<u8, 4>>()[..],
            &[0x20, 0x68]
        );
    }

    #[test]
    fn test_reset_bus_sequence() {
        let mut i2c = controller(SimIo::new(BASE_0));

        i2c.reset_bus().unwrap();

        assert_eq!(
            &i2c.io().commands().collect::<heapless::Vec<u8, 4>>()[..],
            &[0x21, 0x41]
        );
        assert!(!i2c.io().bus_owned());
    }
}
