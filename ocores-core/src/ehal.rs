//! embedded-hal 1.0 `I2c` implementation
//!
//! Lets third-party device drivers run on top of the controller. Framing
//! follows the embedded-hal transaction contract: one start and address
//! for the first operation, a repeated start and address whenever the
//! direction changes, a NACK on the last byte of every read segment, and a
//! stop after the last operation.

use embedded_hal::i2c::{
    self, ErrorKind, ErrorType, NoAcknowledgeSource, Operation, SevenBitAddress,
};
use ocores_hal::IoSpace;

use crate::controller::OcoresI2c;
use crate::error::{Error, NackSource};
use crate::protocol::Direction;
use crate::sequencer::AckCheck;

impl i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Error::NotAcknowledged(NackSource::Address) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Error::NotAcknowledged(NackSource::Data) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
            }
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Error::Busy | Error::Timeout => ErrorKind::Bus,
            Error::InvalidBus | Error::InvalidClock => ErrorKind::Other,
        }
    }
}

impl<IO: IoSpace> ErrorType for OcoresI2c<IO> {
    type Error = Error;
}

fn direction_of(op: &Operation<'_>) -> Direction {
    match op {
        Operation::Read(_) => Direction::Read,
        Operation::Write(_) => Direction::Write,
    }
}

fn has_data(op: &Operation<'_>) -> bool {
    match op {
        Operation::Read(buf) => !buf.is_empty(),
        Operation::Write(data) => !data.is_empty(),
    }
}

impl<IO: IoSpace> i2c::I2c<SevenBitAddress> for OcoresI2c<IO> {
    /// Run `operations` as one bus transaction
    ///
    /// Empty operations move no bytes and are skipped, so they never hide
    /// the end of a read segment. A transaction made only of empty
    /// operations addresses the device and stops.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }

        let polls = self.config.timeouts.transfer_polls;
        self.await_bus_not_busy(self.config.timeouts.not_busy_polls)?;

        let Some(first) = operations.iter().position(has_data) else {
            self.start_addressed(address, direction_of(&operations[0]))?;
            self.send_stop();
            return Ok(());
        };

        let mut previous = None;
        for i in first..operations.len() {
            if !has_data(&operations[i]) {
                continue;
            }
            let direction = direction_of(&operations[i]);
            let next = operations[i + 1..]
                .iter()
                .find(|op| has_data(op))
                .map(direction_of);
            let last_op = next.is_none();

            if previous != Some(direction) {
                self.start_addressed(address, direction)?;
            }

            match &mut operations[i] {
                Operation::Write(data) => {
                    let end = data.len() - 1;
                    for (j, &byte) in data.iter().enumerate() {
                        self.send_byte(byte, false, last_op && j == end);
                        self.await_transfer_complete(AckCheck::Ack, polls)?;
                    }
                }
                Operation::Read(buf) => {
                    let segment_ends = next != Some(Direction::Read);
                    let end = buf.len() - 1;
                    for (j, byte) in buf.iter_mut().enumerate() {
                        let final_byte = j == end;
                        *byte = self.receive_byte(segment_ends && final_byte, last_op && final_byte)?;
                    }
                }
            }

            previous = Some(direction);
        }
        Ok(())
    }
}
