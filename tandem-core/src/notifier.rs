//! Completion notifier
//!
//! One handler per channel. Each handler owns exactly one completion flag,
//! so clearing another channel's flag cannot be expressed. The two
//! handlers are independent; nothing assumes which one runs first.

use heapless::Vec;
use tandem_hal::dma::Direction;
use tandem_hal::{CompletionFlag, TransferChannel, TransferTrigger};

use crate::link::{Link, LinkError};
use crate::state::LinkState;

/// Completion events, one per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    /// Outbound channel reached its length
    OutboundDone,
    /// Inbound channel reached its length
    InboundDone,
}

impl Completion {
    /// Channel direction this event belongs to
    pub fn direction(self) -> Direction {
        match self {
            Completion::OutboundDone => Direction::Outbound,
            Completion::InboundDone => Direction::Inbound,
        }
    }
}

/// Result of one handled completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notice {
    /// Which channel finished
    pub completion: Completion,
    /// Bytes the channel moved
    pub bytes: usize,
    /// How often this handler has run since start-up
    pub fired: u32,
    /// This completion moved the link to `Complete`; the other channel
    /// had already finished
    pub link_complete: bool,
}

/// Handler bound to a single channel's flag
struct CompletionHandler<F> {
    completion: Completion,
    flag: F,
    fired: u32,
}

impl<F: CompletionFlag> CompletionHandler<F> {
    fn handle<C, T, const N: usize>(
        &mut self,
        link: &mut Link<C, T, N>,
    ) -> Result<Notice, LinkError>
    where
        C: TransferChannel,
        T: TransferTrigger,
    {
        // Clear first, or the line fires again as soon as we return
        self.flag.acknowledge();
        self.fired = self.fired.wrapping_add(1);

        let bytes = link.complete(self.completion.direction())?;
        Ok(Notice {
            completion: self.completion,
            bytes,
            fired: self.fired,
            link_complete: link.state() == LinkState::Complete,
        })
    }
}

/// Routes completion events to their handlers
pub struct CompletionNotifier<F> {
    outbound: CompletionHandler<F>,
    inbound: CompletionHandler<F>,
}

impl<F: CompletionFlag> CompletionNotifier<F> {
    /// Bind one flag to each handler
    ///
    /// Each flag must belong to the engine channel of the same direction.
    pub fn new<C, T, const N: usize>(
        outbound_flag: F,
        inbound_flag: F,
        link: &Link<C, T, N>,
    ) -> Result<Self, LinkError>
    where
        C: TransferChannel,
        T: TransferTrigger,
    {
        for (direction, flag) in [
            (Direction::Outbound, &outbound_flag),
            (Direction::Inbound, &inbound_flag),
        ] {
            if flag.channel() != link.engine().channel_number(direction) {
                return Err(LinkError::FlagMismatch(direction));
            }
        }

        Ok(Self {
            outbound: CompletionHandler {
                completion: Completion::OutboundDone,
                flag: outbound_flag,
                fired: 0,
            },
            inbound: CompletionHandler {
                completion: Completion::InboundDone,
                flag: inbound_flag,
                fired: 0,
            },
        })
    }

    fn handler_mut(&mut self, completion: Completion) -> &mut CompletionHandler<F> {
        match completion {
            Completion::OutboundDone => &mut self.outbound,
            Completion::InboundDone => &mut self.inbound,
        }
    }

    /// Run the handler for one completion event
    pub fn dispatch<C, T, const N: usize>(
        &mut self,
        completion: Completion,
        link: &mut Link<C, T, N>,
    ) -> Result<Notice, LinkError>
    where
        C: TransferChannel,
        T: TransferTrigger,
    {
        self.handler_mut(completion).handle(link)
    }

    /// Check if a channel's flag is waiting
    pub fn is_pending(&self, completion: Completion) -> bool {
        match completion {
            Completion::OutboundDone => self.outbound.flag.is_pending(),
            Completion::InboundDone => self.inbound.flag.is_pending(),
        }
    }

    /// Dispatch every pending flag
    ///
    /// Called from the shared interrupt line.
    pub fn service<C, T, const N: usize>(
        &mut self,
        link: &mut Link<C, T, N>,
    ) -> Vec<Result<Notice, LinkError>, 2>
    where
        C: TransferChannel,
        T: TransferTrigger,
    {
        let mut handled = Vec::new();
        for completion in [Completion::OutboundDone, Completion::InboundDone] {
            if self.is_pending(completion) {
                // Capacity matches the number of handlers
                let _ = handled.push(self.dispatch(completion, link));
            }
        }
        handled
    }
}
