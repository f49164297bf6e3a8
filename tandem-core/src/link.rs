//! Link context
//!
//! The single context built once at start-up. It owns the buffer store,
//! the transfer engine and the link state, and is passed by reference to
//! the sync monitor and the completion notifier.

use tandem_hal::dma::{ChannelMask, Direction};
use tandem_hal::{TransferChannel, TransferTrigger};

use crate::buffer::BufferStore;
use crate::engine::{EngineError, TransferEngine};
use crate::state::{Event, FaultKind, LinkState, RearmPolicy};

/// Errors from link operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Sync edge arrived while a transfer is in flight
    AlreadyArmed,
    /// Sync edge arrived after the single transfer of this run
    SingleShot,
    /// Link was declared stalled
    Faulted(FaultKind),
    /// Sync edge arrived before the monitor was listening
    NotListening,
    /// Own sync line asserted before the monitor was listening
    MonitorNotListening,
    /// Completion flag does not belong to the channel of its direction
    FlagMismatch(Direction),
    /// Transfer engine error
    Engine(EngineError),
}

impl From<EngineError> for LinkError {
    fn from(e: EngineError) -> Self {
        LinkError::Engine(e)
    }
}

/// Shared context of one link endpoint
pub struct Link<C, T, const N: usize> {
    store: BufferStore<N>,
    engine: TransferEngine<C, T>,
    state: LinkState,
    policy: RearmPolicy,
    runs: u32,
}

impl<C: TransferChannel, T: TransferTrigger, const N: usize> Link<C, T, N> {
    /// Create the context from a store and an engine
    pub fn new(store: BufferStore<N>, engine: TransferEngine<C, T>, policy: RearmPolicy) -> Self {
        Self {
            store,
            engine,
            state: LinkState::Idle,
            policy,
            runs: 0,
        }
    }

    /// Configure one direction to move `length` bytes of its store buffer
    pub fn configure(
        &mut self,
        direction: Direction,
        peripheral: usize,
        length: usize,
        pacing: tandem_hal::dma::Pacing,
    ) -> Result<(), LinkError> {
        let region = self
            .store
            .region(direction)
            .map_err(EngineError::Buffer)?;
        self.engine
            .configure(direction, region, peripheral, length, pacing)?;
        Ok(())
    }

    /// Current link state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Re-arm policy in force
    pub fn policy(&self) -> RearmPolicy {
        self.policy
    }

    /// Number of transfers started so far
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// The buffer store
    pub fn store(&self) -> &BufferStore<N> {
        &self.store
    }

    /// Mutable buffer store, for the application to fill buffers
    pub fn store_mut(&mut self) -> &mut BufferStore<N> {
        &mut self.store
    }

    /// The transfer engine
    pub fn engine(&self) -> &TransferEngine<C, T> {
        &self.engine
    }

    /// Start both channels
    ///
    /// Allowed from `Idle`, after a sync timeout, or from `Complete` under
    /// [`RearmPolicy::Rearm`]. Everything else leaves the link untouched.
    pub fn arm(&mut self) -> Result<ChannelMask, LinkError> {
        match self.state {
            LinkState::Armed { .. } => return Err(LinkError::AlreadyArmed),
            state if state.accepts_sync(self.policy) => {}
            LinkState::Fault(kind) => return Err(LinkError::Faulted(kind)),
            _ => return Err(LinkError::SingleShot),
        }

        let mask = self.engine.start_both(&mut self.store)?;
        self.state = self.state.transition(Event::SyncEdge, self.policy);
        self.runs = self.runs.wrapping_add(1);
        Ok(mask)
    }

    /// Take back a finished channel's buffer and record the completion
    ///
    /// Returns the number of bytes the channel moved.
    pub fn complete(&mut self, direction: Direction) -> Result<usize, LinkError> {
        let moved = self.engine.finish(direction, &mut self.store)?;
        let event = match direction {
            Direction::Outbound => Event::OutboundDone,
            Direction::Inbound => Event::InboundDone,
        };
        self.state = self.state.transition(event, self.policy);
        Ok(moved)
    }

    /// Record a stall reported by the watchdog
    pub fn report_fault(&mut self, kind: FaultKind) -> LinkState {
        self.state = self
            .state
            .transition(Event::StallDetected(kind), self.policy);
        self.state
    }
}
