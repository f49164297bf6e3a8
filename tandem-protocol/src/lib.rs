//! Tandem Payload Framing
//!
//! Defines how an application message is laid out in the fixed-size
//! outbound buffer before a bulk transfer. The link itself moves the
//! whole buffer and never looks at these bytes.
//!
//! # Layout
//!
//! ```text
//! ┌──────┬──────────┬────────┬─────────────┬───────────┐
//! │ TAG  │ RESERVED │ LENGTH │ PAYLOAD     │ ZERO FILL │
//! │ 2B   │ 1B       │ 2B LE  │ LENGTH B    │ to end    │
//! └──────┴──────────┴────────┴─────────────┴───────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod frame;

pub use frame::{FrameError, Message, HEADER_LEN, MAX_PAYLOAD_SIZE, TAG_AT};
