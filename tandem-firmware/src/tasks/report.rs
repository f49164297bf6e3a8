//! Completion report task
//!
//! Logs each completion notice from `DMA_IRQ_1`. When the inbound channel
//! finishes, the received frame is decoded and the whole inbound buffer is
//! dumped as 16-byte hex rows.

use defmt::*;
use embassy_time::Timer;
use portable_atomic::Ordering;
use tandem_core::buffer::{hex_rows, DUMP_ROW_LEN};
use tandem_core::{Completion, RearmPolicy};
use tandem_protocol::{Message, TAG_AT};

use crate::channels::{DROPPED_NOTICES, NOTICES};
use crate::link_config::{BUFFER_LEN, CONFIG};
use crate::node::with_node;

/// Low time of the sync line between runs, long enough for the peer to
/// shift its last byte at the slowest bus clock
const REARM_SETTLE_MS: u64 = 10;

/// Payload bytes shown in the log
const PREVIEW_LEN: usize = 64;

#[embassy_executor::task]
pub async fn report_task() {
    info!("Report task started");

    loop {
        let notice = NOTICES.receive().await;

        let dropped = DROPPED_NOTICES.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            warn!("{} completion notices dropped", dropped);
        }

        match notice.completion {
            Completion::OutboundDone => {
                info!("Outbound transfer complete: {} bytes", notice.bytes);
            }
            Completion::InboundDone => {
                info!("Inbound transfer complete: {} bytes", notice.bytes);
                show_frame();
                dump_inbound();
            }
        }

        if notice.link_complete {
            info!("Both channels done");
            if CONFIG.rearm == RearmPolicy::Rearm && CONFIG.role.drives_clock() {
                signal_next_run().await;
            }
        }
    }
}

/// Decode the received frame and log its payload
fn show_frame() {
    let mut preview = [0u8; PREVIEW_LEN];
    let decoded = with_node(|node| {
        let buffer = node.link.store().inbound().ok()?;
        Some(Message::decode_tagged(buffer, TAG_AT).map(|message| {
            let shown = message.payload.len().min(PREVIEW_LEN);
            preview[..shown].copy_from_slice(&message.payload[..shown]);
            (message.payload.len(), shown)
        }))
    })
    .flatten();

    match decoded {
        Some(Ok((len, shown))) => info!("Received AT frame, {} payload bytes: {=[u8]:a}", len, &preview[..shown]),
        Some(Err(e)) => warn!("No AT frame in inbound buffer: {}", e),
        None => warn!("Inbound buffer not available"),
    }
}

/// Render the inbound buffer row by row
///
/// Each row is copied out under the lock so logging never runs inside the
/// critical section.
fn dump_inbound() {
    let mut row = [0u8; DUMP_ROW_LEN];

    for index in 0..BUFFER_LEN.div_ceil(DUMP_ROW_LEN) {
        let copied = with_node(|node| {
            let buffer = node.link.store().inbound().ok()?;
            let chunk = hex_rows(buffer).nth(index)?;
            row[..chunk.len()].copy_from_slice(chunk);
            Some(chunk.len())
        })
        .flatten();

        let Some(len) = copied else {
            warn!("Inbound buffer lent again, dump stopped at row {}", index);
            return;
        };
        info!("{=usize:04x}: {=[u8]:02x}", index * DUMP_ROW_LEN, &row[..len]);
    }
}

/// Raise the controller's sync line again to start the next run
///
/// Both lines were dropped by `DMA_IRQ_1` when each side completed; a
/// follower raises its own once the controller's edge armed it.
async fn signal_next_run() {
    Timer::after_millis(REARM_SETTLE_MS).await;
    if let Some(Err(e)) = with_node(|node| node.driver.assert_ready(&node.monitor)) {
        warn!("Could not signal next run: {}", e);
    }
}
