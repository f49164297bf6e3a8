//! Inter-task communication channels
//!
//! Defines the static channels and signals shared between the completion
//! interrupt and the Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicU32;

use tandem_core::Notice;

/// Channel capacity for completion notices (two per transfer)
const NOTICE_CHANNEL_SIZE: usize = 4;

/// Completion notices from `DMA_IRQ_1`
pub static NOTICES: Channel<CriticalSectionRawMutex, Notice, NOTICE_CHANNEL_SIZE> = Channel::new();

/// Notices dropped because the report task fell behind
pub static DROPPED_NOTICES: AtomicU32 = AtomicU32::new(0);

/// Signal that the sync monitor is listening for edges
pub static MONITOR_LISTENING: Signal<CriticalSectionRawMutex, ()> = Signal::new();
