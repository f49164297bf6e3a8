//! Sync monitor task
//!
//! Waits for rising edges on the peer's sync line and arms both DMA
//! channels on each one.

use defmt::*;
use tandem_core::LinkError;
use tandem_hal::InputPin;
use tandem_hal_rp2040::SyncInput;

use crate::channels::MONITOR_LISTENING;
use crate::link_config::CONFIG;
use crate::node::with_node;

/// Sync monitor task
///
/// A follower raises its own sync line only after its channels are armed,
/// so the controller never clocks into an idle peer.
#[embassy_executor::task]
pub async fn sync_monitor_task(mut line: SyncInput) {
    info!("Sync monitor task started");

    match with_node(|node| node.monitor.listen(&line)) {
        Some(true) => {}
        Some(false) => warn!("Sync line already high, the peer's edge may have been missed"),
        None => {
            error!("Link context missing, sync monitor stopped");
            return;
        }
    }
    MONITOR_LISTENING.signal(());

    loop {
        line.wait_for_rising_edge().await;

        let result = with_node(|node| {
            let armed = node.monitor.on_rising_edge(&mut node.link)?;
            if !CONFIG.role.drives_clock() {
                node.driver.assert_ready(&node.monitor)?;
            }
            Ok::<_, LinkError>(armed)
        });

        match result {
            Some(Ok(armed)) => info!(
                "Sync edge {}: run {} started on channels {:#x}",
                armed.edge,
                armed.run,
                armed.mask.bits()
            ),
            Some(Err(e)) => warn!("Sync edge ignored: {} (line high: {})", e, line.is_high()),
            None => {}
        }
    }
}
