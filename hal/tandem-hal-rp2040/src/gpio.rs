//! Sync line wrappers around embassy GPIO

use embassy_rp::gpio::{Input, Output};
use tandem_hal::{InputPin, OutputPin};

/// Own sync output
pub struct SyncOutput(Output<'static>);

impl SyncOutput {
    pub fn new(pin: Output<'static>) -> Self {
        Self(pin)
    }
}

impl OutputPin for SyncOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

/// Peer's sync input
pub struct SyncInput(Input<'static>);

impl SyncInput {
    pub fn new(pin: Input<'static>) -> Self {
        Self(pin)
    }

    /// Wait for the next rising edge
    pub async fn wait_for_rising_edge(&mut self) {
        self.0.wait_for_rising_edge().await;
    }
}

impl InputPin for SyncInput {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}
