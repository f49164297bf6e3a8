//! Link state machine
//!
//! Defines the authoritative lifecycle of one sync-then-transfer run.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{FaultKind, LinkState, RearmPolicy};
