//! State machine definition
//!
//! ```text
//! Idle     --SyncEdge-->        Armed { false, false }
//! Armed    --OutboundDone-->    Armed { true, _ }  or Complete
//! Armed    --InboundDone-->     Armed { _, true }  or Complete
//! Complete --SyncEdge-->        Armed (only with RearmPolicy::Rearm)
//! Idle/Armed --StallDetected--> Fault
//! Fault(SyncTimeout) --SyncEdge--> Armed
//! ```
//!
//! A sync timeout only reports a silent peer; its late edge still starts
//! the transfer. A transfer stall is terminal.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::events::Event;

/// Link states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Channels configured, waiting for the sync edge
    Idle,
    /// Both channels started; tracks which ones finished
    Armed {
        /// Outbound channel reached its length
        outbound_done: bool,
        /// Inbound channel reached its length
        inbound_done: bool,
    },
    /// Both channels finished
    Complete,
    /// Watchdog declared the link stalled
    Fault(FaultKind),
}

/// Ways the link can stall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Sync edge never arrived
    SyncTimeout,
    /// A channel never reached its configured length
    TransferStall,
}

/// What a sync edge after completion does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RearmPolicy {
    /// One transfer per process run; later edges are rejected
    #[default]
    SingleShot,
    /// Each edge after completion starts another transfer
    Rearm,
}

impl LinkState {
    /// State right after both channels were started
    pub const ARMED: LinkState = LinkState::Armed {
        outbound_done: false,
        inbound_done: false,
    };

    /// Check if a transfer is in flight
    pub fn is_armed(&self) -> bool {
        matches!(self, LinkState::Armed { .. })
    }

    /// Check if this is a fault state
    pub fn is_fault(&self) -> bool {
        matches!(self, LinkState::Fault(_))
    }

    /// Check if a sync edge would start a transfer in this state
    pub fn accepts_sync(&self, policy: RearmPolicy) -> bool {
        match self {
            LinkState::Idle | LinkState::Fault(FaultKind::SyncTimeout) => true,
            LinkState::Complete => policy == RearmPolicy::Rearm,
            LinkState::Armed { .. } | LinkState::Fault(FaultKind::TransferStall) => false,
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event, policy: RearmPolicy) -> Self {
        use Event::*;
        use LinkState::*;

        match (self, event) {
            (Idle | Fault(FaultKind::SyncTimeout), SyncEdge) => Self::ARMED,
            (Complete, SyncEdge) if policy == RearmPolicy::Rearm => Self::ARMED,

            (Armed { inbound_done, .. }, OutboundDone) => {
                if inbound_done {
                    Complete
                } else {
                    Armed {
                        outbound_done: true,
                        inbound_done,
                    }
                }
            }
            (Armed { outbound_done, .. }, InboundDone) => {
                if outbound_done {
                    Complete
                } else {
                    Armed {
                        outbound_done,
                        inbound_done: true,
                    }
                }
            }

            (Idle | Armed { .. }, StallDetected(kind)) => Fault(kind),

            // Default: stay in current state
            _ => self,
        }
    }
}
