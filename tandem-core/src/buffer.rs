//! Buffer store
//!
//! Owns the outbound and inbound buffers for the lifetime of the process.
//! A buffer is either in the store, where the application may read and
//! write it, or lent to its transfer channel. There is no third state, so
//! the application cannot touch a buffer while a transfer is in flight.

use tandem_hal::dma::Direction;

/// Bytes per row of the diagnostic hex dump
pub const DUMP_ROW_LEN: usize = 16;

/// Errors from buffer store access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Buffer is lent to its transfer channel
    InFlight,
    /// Buffer is already back in the store
    AlreadyStored,
    /// Returned memory is not the size of a store buffer
    SizeMismatch,
}

/// Location and size of a store buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryRegion {
    /// Start address
    pub address: usize,
    /// Size in bytes
    pub capacity: usize,
}

impl MemoryRegion {
    /// Region covering `memory`
    pub fn of(memory: &[u8]) -> Self {
        Self {
            address: memory.as_ptr() as usize,
            capacity: memory.len(),
        }
    }
}

/// The two fixed-capacity transfer buffers
pub struct BufferStore<const N: usize> {
    outbound: Option<&'static mut [u8; N]>,
    inbound: Option<&'static mut [u8; N]>,
}

impl<const N: usize> BufferStore<N> {
    /// Create a store holding both buffers
    pub fn new(outbound: &'static mut [u8; N], inbound: &'static mut [u8; N]) -> Self {
        Self {
            outbound: Some(outbound),
            inbound: Some(inbound),
        }
    }

    fn slot(&self, direction: Direction) -> &Option<&'static mut [u8; N]> {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut Option<&'static mut [u8; N]> {
        match direction {
            Direction::Outbound => &mut self.outbound,
            Direction::Inbound => &mut self.inbound,
        }
    }

    /// Check if the buffer for `direction` is in the store
    pub fn is_stored(&self, direction: Direction) -> bool {
        self.slot(direction).is_some()
    }

    /// Read access to a stored buffer
    pub fn get(&self, direction: Direction) -> Result<&[u8; N], BufferError> {
        self.slot(direction).as_deref().ok_or(BufferError::InFlight)
    }

    /// Write access to a stored buffer
    pub fn get_mut(&mut self, direction: Direction) -> Result<&mut [u8; N], BufferError> {
        self.slot_mut(direction)
            .as_deref_mut()
            .ok_or(BufferError::InFlight)
    }

    /// The outbound buffer, for the application to fill before arming
    pub fn outbound(&self) -> Result<&[u8; N], BufferError> {
        self.get(Direction::Outbound)
    }

    /// Mutable outbound buffer
    pub fn outbound_mut(&mut self) -> Result<&mut [u8; N], BufferError> {
        self.get_mut(Direction::Outbound)
    }

    /// The inbound buffer, readable once its channel completed
    pub fn inbound(&self) -> Result<&[u8; N], BufferError> {
        self.get(Direction::Inbound)
    }

    /// Mutable inbound buffer (e.g. to set a fill pattern)
    pub fn inbound_mut(&mut self) -> Result<&mut [u8; N], BufferError> {
        self.get_mut(Direction::Inbound)
    }

    /// Memory region of a stored buffer
    pub fn region(&self, direction: Direction) -> Result<MemoryRegion, BufferError> {
        self.get(direction).map(|buf| MemoryRegion::of(buf))
    }

    /// Hand a buffer to its transfer channel
    pub(crate) fn lend(&mut self, direction: Direction) -> Result<&'static mut [u8; N], BufferError> {
        self.slot_mut(direction).take().ok_or(BufferError::InFlight)
    }

    /// Take a buffer back from its transfer channel
    pub(crate) fn restore(
        &mut self,
        direction: Direction,
        memory: &'static mut [u8],
    ) -> Result<(), BufferError> {
        let memory: &'static mut [u8; N] =
            memory.try_into().map_err(|_| BufferError::SizeMismatch)?;

        let slot = self.slot_mut(direction);
        if slot.is_some() {
            return Err(BufferError::AlreadyStored);
        }
        *slot = Some(memory);
        Ok(())
    }
}

/// Split a buffer into rows for the diagnostic hex dump
pub fn hex_rows(bytes: &[u8]) -> core::slice::Chunks<'_, u8> {
    bytes.chunks(DUMP_ROW_LEN)
}
