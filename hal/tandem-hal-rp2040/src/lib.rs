//! RP2040-specific HAL for the Tandem firmware
//!
//! This crate provides RP2040 implementations of the `tandem-hal` traits:
//!
//! - DMA channels loaded without starting, and their completion flags on
//!   `DMA_IRQ_1`
//! - Simultaneous start through `MULTI_CHAN_TRIGGER`
//! - SPI0 bring-up in controller or follower role with DMA requests enabled
//! - Sync line wrappers around embassy GPIO

#![no_std]

pub mod dma;
pub mod gpio;
pub mod spi;

pub use dma::{claim, Rp2040Channel, Rp2040Flag, Rp2040Trigger};
pub use gpio::{SyncInput, SyncOutput};
pub use spi::LinkBus;
