//! Stall watchdog
//!
//! Turns the two silent failure modes of the link into faults: the peer's
//! sync edge never arriving, and an armed transfer never finishing (bus
//! clock lost, peer reset mid-transfer).

use crate::config::WatchdogConfig;
use crate::state::{FaultKind, LinkState};

/// Watchdog verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogStatus {
    /// Within limits
    Ok,
    /// Limit exceeded, or the link already faulted
    Fault(FaultKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WaitingForSync,
    Transferring(u32),
    Settled,
}

impl Phase {
    fn of(state: LinkState, run: u32) -> Self {
        match state {
            LinkState::Idle => Phase::WaitingForSync,
            LinkState::Armed { .. } => Phase::Transferring(run),
            LinkState::Complete | LinkState::Fault(_) => Phase::Settled,
        }
    }
}

/// Watches how long the link stays in one phase
#[derive(Debug, Clone)]
pub struct StallWatchdog {
    config: WatchdogConfig,
    phase: Phase,
    elapsed_ms: u32,
}

impl StallWatchdog {
    /// Create a new watchdog
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            phase: Phase::WaitingForSync,
            elapsed_ms: 0,
        }
    }

    /// Time spent in the current phase
    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// Advance time and check limits
    ///
    /// # Arguments
    /// - `state`: Current link state
    /// - `run`: Transfer number, so a re-armed transfer starts a fresh window
    /// - `delta_ms`: Time elapsed since last update
    pub fn update(&mut self, state: LinkState, run: u32, delta_ms: u32) -> WatchdogStatus {
        if let LinkState::Fault(kind) = state {
            return WatchdogStatus::Fault(kind);
        }

        let phase = Phase::of(state, run);
        if phase != self.phase {
            self.phase = phase;
            self.elapsed_ms = 0;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);

        let limit = match phase {
            Phase::WaitingForSync => (self.config.sync_timeout_ms, FaultKind::SyncTimeout),
            Phase::Transferring(_) => (self.config.transfer_timeout_ms, FaultKind::TransferStall),
            Phase::Settled => return WatchdogStatus::Ok,
        };

        match limit {
            // Zero disables the limit
            (0, _) => WatchdogStatus::Ok,
            (max, kind) if self.elapsed_ms > max => WatchdogStatus::Fault(kind),
            _ => WatchdogStatus::Ok,
        }
    }
}
