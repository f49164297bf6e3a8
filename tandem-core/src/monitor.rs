//! Sync signal monitor
//!
//! Reacts to rising edges on the peer's sync line by arming both transfer
//! channels through the link context.

use tandem_hal::dma::ChannelMask;
use tandem_hal::{InputPin, TransferChannel, TransferTrigger};

use crate::link::{Link, LinkError};

/// Diagnostic notification for an edge that started a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Armed {
    /// Channels started by the edge
    pub mask: ChannelMask,
    /// Edge number since start-up, counting rejected edges
    pub edge: u32,
    /// Transfer number since start-up
    pub run: u32,
}

/// Watches the peer's sync line
#[derive(Debug, Default)]
pub struct SyncMonitor {
    listening: bool,
    edges: u32,
    rejected: u32,
}

impl SyncMonitor {
    /// Create a monitor that is not yet listening
    pub const fn new() -> Self {
        Self {
            listening: false,
            edges: 0,
            rejected: 0,
        }
    }

    /// Register interest in rising edges on `line`
    ///
    /// Returns `false` if the line is already high, in which case the edge
    /// that raised it was missed.
    pub fn listen(&mut self, line: &impl InputPin) -> bool {
        self.listening = true;
        line.is_low()
    }

    /// Check if edges are being watched
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Edges seen so far
    pub fn edges(&self) -> u32 {
        self.edges
    }

    /// Edges that did not start a transfer
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Handle one rising edge: start both channels at once
    pub fn on_rising_edge<C, T, const N: usize>(
        &mut self,
        link: &mut Link<C, T, N>,
    ) -> Result<Armed, LinkError>
    where
        C: TransferChannel,
        T: TransferTrigger,
    {
        if !self.listening {
            return Err(LinkError::NotListening);
        }
        self.edges = self.edges.wrapping_add(1);

        match link.arm() {
            Ok(mask) => Ok(Armed {
                mask,
                edge: self.edges,
                run: link.runs(),
            }),
            Err(e) => {
                self.rejected = self.rejected.wrapping_add(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferStore;
    use crate::sim::{leak, SimDma, SimLink, SimPin, SPI0_DR, SPI0_PACING_RX, SPI0_PACING_TX};
    use crate::state::{LinkState, RearmPolicy};
    use tandem_hal::dma::Direction;
    use tandem_hal::OutputPin;

    const CAP: usize = 64;

    fn link(dma: &SimDma, policy: RearmPolicy) -> SimLink<CAP> {
        let store = BufferStore::new(leak(0), leak(0xA5));
        let mut link = Link::new(store, dma.engine(2, 3), policy);
        link.configure(Direction::Outbound, SPI0_DR, CAP, SPI0_PACING_TX)
            .unwrap();
        link.configure(Direction::Inbound, SPI0_DR, CAP, SPI0_PACING_RX)
            .unwrap();
        link
    }

    #[test]
    fn test_edge_before_listen_is_rejected() {
        let dma = SimDma::new();
        let mut link = link(&dma, RearmPolicy::SingleShot);
        let mut monitor = SyncMonitor::new();

        assert_eq!(monitor.on_rising_edge(&mut link), Err(LinkError::NotListening));
        assert_eq!(monitor.edges(), 0);
        assert!(dma.starts().is_empty());
    }

    #[test]
    fn test_listen_reports_missed_edge() {
        let mut wire = SimPin::new();
        let mut monitor = SyncMonitor::new();
        assert!(monitor.listen(&wire));

        wire.set_high();
        let mut late = SyncMonitor::new();
        assert!(!late.listen(&wire));
        assert!(late.is_listening());
    }

    #[test]
    fn test_edge_arms_both_channels() {
        let dma = SimDma::new();
        let mut link = link(&dma, RearmPolicy::SingleShot);
        let mut monitor = SyncMonitor::new();
        monitor.listen(&SimPin::new());

        let armed = monitor.on_rising_edge(&mut link).unwrap();
        assert_eq!(armed.mask.bits(), 0b1100);
        assert_eq!(armed.edge, 1);
        assert_eq!(armed.run, 1);
        assert_eq!(dma.starts(), [armed.mask]);
        assert!(dma.is_busy(2) && dma.is_busy(3));
        assert_eq!(link.state(), LinkState::ARMED);
    }

    #[test]
    fn test_bouncing_edge_is_counted_and_rejected() {
        let dma = SimDma::new();
        let mut link = link(&dma, RearmPolicy::Rearm);
        let mut monitor = SyncMonitor::new();
        monitor.listen(&SimPin::new());

        monitor.on_rising_edge(&mut link).unwrap();
        assert_eq!(monitor.on_rising_edge(&mut link), Err(LinkError::AlreadyArmed));
        assert_eq!(monitor.edges(), 2);
        assert_eq!(monitor.rejected(), 1);
        assert_eq!(dma.starts().len(), 1);
    }
}
