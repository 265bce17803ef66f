//! Bus selection
//!
//! A board carries a fixed table of controller instances. One of them is
//! active at a time; register accesses always go to the active one.

use crate::error::Error;

/// Number of controller instances on the board
pub const BUS_COUNT: usize = 2;

/// Bus the selector falls back to on first use
const DEFAULT_BUS: usize = 0;

/// A resolved bus selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusHandle {
    /// Index into the controller table
    pub index: usize,
    /// Base address of the register block
    pub base: usize,
}

/// Tracks which controller instance is active
///
/// Nothing is selected until the first register access or an explicit
/// [`select`](Self::select); the first access picks bus 0.
#[derive(Debug, Clone)]
pub struct BusSelector {
    bases: [usize; BUS_COUNT],
    active: Option<usize>,
}

impl BusSelector {
    /// Create a selector over the given base address table
    pub const fn new(bases: [usize; BUS_COUNT]) -> Self {
        Self {
            bases,
            active: None,
        }
    }

    /// Make bus `index` the active one
    ///
    /// An out-of-range index leaves the current selection untouched.
    pub fn select(&mut self, index: usize) -> Result<BusHandle, Error> {
        let base = *self.bases.get(index).ok_or(Error::InvalidBus)?;
        self.active = Some(base);
        Ok(BusHandle { index, base })
    }

    /// Index of the active bus
    ///
    /// Resolved by matching the active base address against the table.
    pub fn current(&self) -> Result<usize, Error> {
        let base = self.active.ok_or(Error::InvalidBus)?;
        self.bases
            .iter()
            .position(|&b| b == base)
            .ok_or(Error::InvalidBus)
    }

    /// Active bus as a handle
    pub fn handle(&self) -> Result<BusHandle, Error> {
        let index = self.current()?;
        Ok(BusHandle {
            index,
            base: self.bases[index],
        })
    }

    /// Base address table
    pub fn bases(&self) -> &[usize; BUS_COUNT] {
        &self.bases
    }

    /// Active base address, selecting the default bus if none is active yet
    pub(crate) fn resolve(&mut self) -> usize {
        *self.active.get_or_insert(self.bases[DEFAULT_BUS])
    }
}
