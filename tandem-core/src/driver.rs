//! Sync signal driver
//!
//! Owns the local sync output. The line idles low and goes high when this
//! node is ready for the peer to start the transfer. A re-arming link drops
//! it again the moment a run completes, so the next assertion is a fresh
//! edge.

use tandem_hal::OutputPin;

use crate::link::LinkError;
use crate::monitor::SyncMonitor;
use crate::notifier::Notice;
use crate::state::RearmPolicy;

/// Own sync output line
pub struct SyncDriver<P> {
    pin: P,
}

impl<P: OutputPin> SyncDriver<P> {
    /// Take the pin and hold it low
    pub fn new(mut pin: P) -> Self {
        pin.set_low();
        Self { pin }
    }

    /// Signal readiness to the peer
    ///
    /// Refused until the local monitor listens: a peer answering our ready
    /// line at once must not raise its sync before we watch for it.
    pub fn assert_ready(&mut self, monitor: &SyncMonitor) -> Result<(), LinkError> {
        if !monitor.is_listening() {
            return Err(LinkError::MonitorNotListening);
        }
        self.pin.set_high();
        Ok(())
    }

    /// Drive the line back low
    pub fn release(&mut self) {
        self.pin.set_low();
    }

    /// Drop the line if `notice` completed a re-arming link
    ///
    /// Called from the completion path, before anything slow runs. Returns
    /// whether the line was released.
    pub fn release_on_complete(&mut self, notice: &Notice, policy: RearmPolicy) -> bool {
        if !notice.link_complete || policy != RearmPolicy::Rearm || !self.is_asserted() {
            return false;
        }
        self.release();
        true
    }

    /// Check if readiness is signalled
    pub fn is_asserted(&self) -> bool {
        self.pin.is_set_high()
    }
}
