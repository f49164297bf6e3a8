//! Sync line abstractions
//!
//! A link endpoint drives exactly one line (its own "ready" signal) and
//! watches exactly one (the peer's). Both idle low.

/// Own sync output, high while the endpoint is ready
pub trait OutputPin {
    /// Drive the line high
    fn set_high(&mut self);

    /// Drive the line low
    fn set_low(&mut self);

    /// Level currently driven
    fn is_set_high(&self) -> bool;
}

/// Peer's sync input
///
/// Edge detection is chip specific and lives next to the implementation;
/// the core only needs to sample the level.
pub trait InputPin {
    /// Sample the line
    fn is_high(&self) -> bool;

    /// Sample the line, inverted
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}
