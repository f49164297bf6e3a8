//! Link context shared by the interrupt handler and the tasks

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use tandem_core::{CompletionNotifier, Link, SyncDriver, SyncMonitor};
use tandem_hal_rp2040::{Rp2040Channel, Rp2040Flag, Rp2040Trigger, SyncOutput};

use crate::link_config::BUFFER_LEN;

/// Link over the two claimed DMA channels
pub type NodeLink = Link<Rp2040Channel, Rp2040Trigger, BUFFER_LEN>;

/// Everything the interrupt handler and the tasks share
pub struct Node {
    pub link: NodeLink,
    pub notifier: CompletionNotifier<Rp2040Flag>,
    pub monitor: SyncMonitor,
    pub driver: SyncDriver<SyncOutput>,
}

static NODE: Mutex<CriticalSectionRawMutex, RefCell<Option<Node>>> =
    Mutex::new(RefCell::new(None));

/// Install the context; called once before interrupts are enabled
pub fn install(node: Node) {
    NODE.lock(|cell| cell.replace(Some(node)));
}

/// Run `f` on the context inside a critical section
///
/// Returns `None` before [`install`].
pub fn with_node<R>(f: impl FnOnce(&mut Node) -> R) -> Option<R> {
    NODE.lock(|cell| cell.borrow_mut().as_mut().map(f))
}
