//! Transfer channel abstractions
//!
//! A transfer channel moves a fixed number of one-byte units between a
//! memory buffer and a peripheral data register without CPU involvement.
//! Every unit is paced by the peripheral's data-request line.
//!
//! The memory side is handed over as a `&'static mut` lease: a channel owns
//! its buffer from `load` until `reclaim`, so nothing else can touch the
//! bytes while the hardware is moving them.

/// Direction of a transfer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Memory to peripheral (bus transmit)
    Outbound,
    /// Peripheral to memory (bus receive)
    Inbound,
}

impl Direction {
    /// Both directions, outbound first
    pub const ALL: [Direction; 2] = [Direction::Outbound, Direction::Inbound];

    /// Whether the read address advances after each unit
    ///
    /// Only the memory side ever increments.
    pub fn increments_read(self) -> bool {
        matches!(self, Direction::Outbound)
    }

    /// Whether the write address advances after each unit
    pub fn increments_write(self) -> bool {
        matches!(self, Direction::Inbound)
    }

    /// The opposite direction
    pub fn other(self) -> Self {
        match self {
            Direction::Outbound => Direction::Inbound,
            Direction::Inbound => Direction::Outbound,
        }
    }
}

/// Peripheral data-request line that paces a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pacing {
    /// Bus instance the request line belongs to (0 for SPI0)
    pub bus: u8,
    /// Hardware data-request number
    pub dreq: u8,
}

/// Everything a channel needs for one transfer, except the memory itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSetup {
    /// Transfer direction (fixes the increment policy)
    pub direction: Direction,
    /// Address of the peripheral data register
    pub peripheral: usize,
    /// Number of one-byte units to move
    pub length: usize,
    /// Data-request line pacing each unit
    pub pacing: Pacing,
}

/// Set of channel numbers, one bit per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask(u32);

impl ChannelMask {
    /// Highest channel number a mask can hold, plus one
    pub const WIDTH: u8 = 32;

    /// Mask with no channels
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Mask containing a single channel
    ///
    /// `None` if the channel number does not fit.
    pub const fn of(channel: u8) -> Option<Self> {
        Self::empty().with(channel)
    }

    /// Add a channel to the mask
    pub const fn with(self, channel: u8) -> Option<Self> {
        if channel >= Self::WIDTH {
            return None;
        }
        Some(Self(self.0 | (1 << channel)))
    }

    /// Check if a channel is in the mask
    pub const fn contains(&self, channel: u8) -> bool {
        channel < Self::WIDTH && self.0 & (1 << channel) != 0
    }

    /// Raw bit pattern, as written to a multi-channel trigger register
    pub const fn bits(&self) -> u32 {
        self.0
    }
}

/// Reason a channel refused a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// Channel is still moving data
    Busy,
    /// Channel still holds the memory of a previous transfer
    Occupied,
    /// Transfer length exceeds the memory handed over
    TooLong,
}

/// A refused load, returning the memory to the caller
#[derive(Debug)]
pub struct Rejected {
    /// Why the channel refused
    pub reason: LoadError,
    /// The memory that was offered
    pub memory: &'static mut [u8],
}

/// One claimed, unidirectional transfer channel
///
/// Loading programs addresses, count, pacing and increment policy but
/// never starts the channel; starting is the job of a [`TransferTrigger`].
pub trait TransferChannel {
    /// Hardware channel number
    fn number(&self) -> u8;

    /// Program a transfer over `memory` without starting it
    ///
    /// The channel keeps `memory` until [`reclaim`](Self::reclaim).
    fn load(&mut self, setup: &ChannelSetup, memory: &'static mut [u8]) -> Result<(), Rejected>;

    /// Check if the channel is moving data
    fn is_busy(&self) -> bool;

    /// Units moved so far for the loaded transfer
    fn transferred(&self) -> usize;

    /// Take back the memory once the channel is idle
    ///
    /// Returns `None` while busy or when nothing is loaded.
    fn reclaim(&mut self) -> Option<&'static mut [u8]>;
}

/// Completion indicator of one channel
///
/// Set by hardware when the channel's count reaches its configured length,
/// cleared by software. A flag object only ever refers to one channel.
pub trait CompletionFlag {
    /// Channel this flag belongs to
    fn channel(&self) -> u8;

    /// Check if a completion is waiting to be acknowledged
    fn is_pending(&self) -> bool;

    /// Clear the completion
    fn acknowledge(&mut self);
}

/// Starts loaded channels
pub trait TransferTrigger {
    /// Start every channel in `mask` in a single indivisible operation
    fn start(&mut self, mask: ChannelMask);
}
