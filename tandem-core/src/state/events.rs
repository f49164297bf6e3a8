//! Events that trigger link state transitions

use super::machine::FaultKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Rising edge on the sync line started both channels
    SyncEdge,
    /// Outbound channel reached its configured length
    OutboundDone,
    /// Inbound channel reached its configured length
    InboundDone,
    /// Watchdog gave up waiting
    StallDetected(FaultKind),
}
