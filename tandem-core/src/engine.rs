//! Transfer engine
//!
//! Configures the outbound (memory → bus) and inbound (bus → memory)
//! channels once, then starts both of them with a single trigger each time
//! the link is armed. Both channels always move one-byte units and the
//! memory side is the only side that increments.

use tandem_hal::dma::{ChannelMask, ChannelSetup, Direction, LoadError, Pacing};
use tandem_hal::{TransferChannel, TransferTrigger};

use crate::buffer::{BufferError, BufferStore, MemoryRegion};

/// Errors from the transfer engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// Channel for this direction was already configured
    AlreadyConfigured(Direction),
    /// Channel for this direction has no configuration yet
    NotConfigured(Direction),
    /// Zero-length transfers are not allowed
    EmptyTransfer,
    /// Length exceeds the capacity of the target buffer
    LengthExceedsCapacity { length: usize, capacity: usize },
    /// Pacing references a different bus than the other channel
    PacingMismatch,
    /// A channel is still moving data or still holds its buffer
    InFlight(Direction),
    /// Channel has not finished its transfer
    NotFinished(Direction),
    /// Lent buffer is not the region the channel was configured for
    RegionMismatch(Direction),
    /// Channel refused the transfer
    Load(Direction, LoadError),
    /// Buffer store refused a lend or restore
    Buffer(BufferError),
    /// Channel number does not fit a trigger mask
    InvalidChannel(u8),
    /// Both directions were given the same channel
    SharedChannel(u8),
}

impl From<BufferError> for EngineError {
    fn from(e: BufferError) -> Self {
        EngineError::Buffer(e)
    }
}

/// One direction: the claimed channel and its one-time configuration
struct Lane<C> {
    channel: C,
    setup: Option<ChannelSetup>,
    region: Option<MemoryRegion>,
}

impl<C: TransferChannel> Lane<C> {
    fn new(channel: C) -> Self {
        Self {
            channel,
            setup: None,
            region: None,
        }
    }

    fn is_idle(&self) -> bool {
        !self.channel.is_busy()
    }
}

/// Two unidirectional channels started as one
pub struct TransferEngine<C, T> {
    outbound: Lane<C>,
    inbound: Lane<C>,
    trigger: T,
    mask: ChannelMask,
}

impl<C: TransferChannel, T: TransferTrigger> TransferEngine<C, T> {
    /// Create an engine from two claimed channels and the shared trigger
    ///
    /// The channels must be distinct and fit a trigger mask.
    pub fn new(outbound: C, inbound: C, trigger: T) -> Result<Self, EngineError> {
        let (out_number, in_number) = (outbound.number(), inbound.number());
        if out_number == in_number {
            return Err(EngineError::SharedChannel(out_number));
        }
        let mask = ChannelMask::of(out_number)
            .ok_or(EngineError::InvalidChannel(out_number))?
            .with(in_number)
            .ok_or(EngineError::InvalidChannel(in_number))?;

        Ok(Self {
            outbound: Lane::new(outbound),
            inbound: Lane::new(inbound),
            trigger,
            mask,
        })
    }

    fn lane(&self, direction: Direction) -> &Lane<C> {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    fn lane_mut(&mut self, direction: Direction) -> &mut Lane<C> {
        match direction {
            Direction::Outbound => &mut self.outbound,
            Direction::Inbound => &mut self.inbound,
        }
    }

    /// Configure one channel
    ///
    /// May be called once per direction. `memory` is the store buffer the
    /// channel will move, `peripheral` the bus data register.
    pub fn configure(
        &mut self,
        direction: Direction,
        memory: MemoryRegion,
        peripheral: usize,
        length: usize,
        pacing: Pacing,
    ) -> Result<(), EngineError> {
        if self.lane(direction).setup.is_some() {
            return Err(EngineError::AlreadyConfigured(direction));
        }
        if length == 0 {
            return Err(EngineError::EmptyTransfer);
        }
        if length > memory.capacity {
            return Err(EngineError::LengthExceedsCapacity {
                length,
                capacity: memory.capacity,
            });
        }
        if let Some(other) = self.lane(direction.other()).setup {
            if other.pacing.bus != pacing.bus {
                return Err(EngineError::PacingMismatch);
            }
        }

        let lane = self.lane_mut(direction);
        lane.setup = Some(ChannelSetup {
            direction,
            peripheral,
            length,
            pacing,
        });
        lane.region = Some(memory);
        Ok(())
    }

    /// Check if both channels are configured
    pub fn is_configured(&self) -> bool {
        self.outbound.setup.is_some() && self.inbound.setup.is_some()
    }

    /// Configured setup of one channel
    pub fn setup(&self, direction: Direction) -> Option<&ChannelSetup> {
        self.lane(direction).setup.as_ref()
    }

    /// Hardware channel number for a direction
    pub fn channel_number(&self, direction: Direction) -> u8 {
        self.lane(direction).channel.number()
    }

    /// Mask covering both channels
    pub fn mask(&self) -> ChannelMask {
        self.mask
    }

    /// Check if neither channel is moving data
    pub fn is_idle(&self) -> bool {
        self.outbound.is_idle() && self.inbound.is_idle()
    }

    /// Units moved so far on one channel
    pub fn transferred(&self, direction: Direction) -> usize {
        self.lane(direction).channel.transferred()
    }

    /// Load both channels with their store buffers and start them together
    ///
    /// Nothing moves until both channels are loaded; the trigger then
    /// starts them in one operation. On error every buffer is back in the
    /// store and neither channel was started.
    pub fn start_both<const N: usize>(
        &mut self,
        store: &mut BufferStore<N>,
    ) -> Result<ChannelMask, EngineError> {
        for direction in Direction::ALL {
            let lane = self.lane(direction);
            if lane.setup.is_none() {
                return Err(EngineError::NotConfigured(direction));
            }
            if !lane.is_idle() || !store.is_stored(direction) {
                return Err(EngineError::InFlight(direction));
            }
        }

        self.load(Direction::Outbound, store)?;
        if let Err(e) = self.load(Direction::Inbound, store) {
            self.unload(Direction::Outbound, store)?;
            return Err(e);
        }

        let mask = self.mask();
        self.trigger.start(mask);
        Ok(mask)
    }

    fn load<const N: usize>(
        &mut self,
        direction: Direction,
        store: &mut BufferStore<N>,
    ) -> Result<(), EngineError> {
        let lane = self.lane_mut(direction);
        let (setup, region) = match (lane.setup, lane.region) {
            (Some(setup), Some(region)) => (setup, region),
            _ => return Err(EngineError::NotConfigured(direction)),
        };

        let memory = store.lend(direction)?;
        if MemoryRegion::of(&memory[..]) != region {
            store.restore(direction, memory)?;
            return Err(EngineError::RegionMismatch(direction));
        }

        if let Err(rejected) = lane.channel.load(&setup, memory) {
            store.restore(direction, rejected.memory)?;
            return Err(EngineError::Load(direction, rejected.reason));
        }
        Ok(())
    }

    fn unload<const N: usize>(
        &mut self,
        direction: Direction,
        store: &mut BufferStore<N>,
    ) -> Result<(), EngineError> {
        match self.lane_mut(direction).channel.reclaim() {
            Some(memory) => Ok(store.restore(direction, memory)?),
            None => Err(EngineError::NotFinished(direction)),
        }
    }

    /// Return a finished channel's buffer to the store
    ///
    /// Returns the number of units the channel moved.
    pub fn finish<const N: usize>(
        &mut self,
        direction: Direction,
        store: &mut BufferStore<N>,
    ) -> Result<usize, EngineError> {
        if !self.lane(direction).is_idle() {
            return Err(EngineError::NotFinished(direction));
        }
        let moved = self.transferred(direction);
        self.unload(direction, store)?;
        Ok(moved)
    }
}
