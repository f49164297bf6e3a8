//! Stall watchdog task
//!
//! Feeds the stall watchdog from a periodic tick and moves the link to
//! its fault state when the peer never answers or a transfer stops.

use defmt::*;
use embassy_time::{Duration, Ticker};
use tandem_core::config::WatchdogConfig;
use tandem_core::{StallWatchdog, WatchdogStatus};

use crate::node::with_node;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u32 = 100;

#[embassy_executor::task]
pub async fn watchdog_task(config: WatchdogConfig) {
    info!(
        "Watchdog task started (sync {} ms, transfer {} ms)",
        config.sync_timeout_ms, config.transfer_timeout_ms
    );

    let mut watchdog = StallWatchdog::new(config);
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS as u64));

    loop {
        ticker.next().await;

        // Read, check and report in one critical section so a completion
        // cannot slip in between
        let stalled = with_node(|node| {
            let state = node.link.state();
            match watchdog.update(state, node.link.runs(), TICK_INTERVAL_MS) {
                WatchdogStatus::Fault(kind) if !state.is_fault() => {
                    node.link.report_fault(kind).is_fault().then_some((kind, state))
                }
                _ => None,
            }
        })
        .flatten();

        if let Some((kind, from)) = stalled {
            error!("Link stalled: {} after {} ms in {}", kind, watchdog.elapsed_ms(), from);
        }
    }
}
