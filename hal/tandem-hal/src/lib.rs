//! Tandem Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the link logic is written
//! against. Chip-specific crates implement them; the core crate and its
//! host simulation only ever see these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tandem-firmware                        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tandem-core (engine, monitor, ...)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tandem-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ tandem-hal-   │       │  host sim     │
//! │    rp2040     │       │  (tests)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Sync lines
//! - [`dma::TransferChannel`] - One direction of a bulk transfer
//! - [`dma::CompletionFlag`] - Per-channel completion indicator
//! - [`dma::TransferTrigger`] - Simultaneous start of several channels

#![no_std]
#![deny(unsafe_code)]

pub mod dma;
pub mod gpio;
pub mod spi;

// Re-export key traits at crate root for convenience
pub use dma::{CompletionFlag, TransferChannel, TransferTrigger};
pub use gpio::{InputPin, OutputPin};
pub use spi::{BusRole, SpiConfig};
