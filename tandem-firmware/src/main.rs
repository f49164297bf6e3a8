//! Tandem - Two-node SPI sync-and-transfer firmware
//!
//! Each node fills its outbound buffer, raises its own sync line once it
//! is listening, and starts both DMA channels on the peer's rising edge.
//! The controller clocks the bus; both channels then run until they have
//! moved the whole buffer, and each one reports on `DMA_IRQ_1`.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_time::Timer;
use portable_atomic::Ordering;
use static_cell::ConstStaticCell;
use {defmt_rtt as _, panic_probe as _};

use tandem_core::{BufferStore, CompletionNotifier, Link, SyncDriver, SyncMonitor, TransferEngine};
use tandem_hal::dma::Direction;
use tandem_hal_rp2040::{dma, LinkBus, Rp2040Trigger, SyncInput, SyncOutput};
use tandem_protocol::Message;

use crate::channels::{DROPPED_NOTICES, MONITOR_LISTENING, NOTICES};
use crate::link_config::{BUFFER_LEN, CONFIG};
use crate::node::{with_node, Node};

mod channels;
mod node;
mod tasks;

mod link_config {
    include!(concat!(env!("OUT_DIR"), "/link_config.rs"));
}

/// Message placed in the outbound buffer at start-up
const PAYLOAD: &[u8] = b"AT+TEST\r\n";

// Transfer buffers (must live forever, lent to the DMA channels)
static OUTBOUND: ConstStaticCell<[u8; BUFFER_LEN]> = ConstStaticCell::new([0; BUFFER_LEN]);
static INBOUND: ConstStaticCell<[u8; BUFFER_LEN]> = ConstStaticCell::new([0; BUFFER_LEN]);

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Tandem firmware starting as {}", CONFIG.role);

    // Give a debugger time to attach before anything happens on the bus
    Timer::after_millis(CONFIG.startup_delay_ms as u64).await;

    let board = link_config::split(p);

    // Own sync line idles low, peer's line is pulled down
    let sync_out = SyncOutput::new(Output::new(board.sync_out, Level::Low));
    let sync_in = SyncInput::new(Input::new(board.sync_in, Pull::Down));

    let spi_config = unwrap!(CONFIG.spi());
    let bus = LinkBus::new(board.spi, board.sck, board.tx, board.rx, board.csn, &spi_config);
    info!(
        "SPI0 up: {} Hz, {}, {}",
        bus.config().frequency,
        bus.config().mode,
        bus.config().role
    );

    let (tx_channel, tx_flag) = dma::claim(board.dma_tx);
    let (rx_channel, rx_flag) = dma::claim(board.dma_rx);
    let engine = unwrap!(TransferEngine::new(tx_channel, rx_channel, Rp2040Trigger::new()));

    let store = BufferStore::new(OUTBOUND.take(), INBOUND.take());
    let mut link = Link::new(store, engine, CONFIG.rearm);
    for direction in Direction::ALL {
        unwrap!(link.configure(direction, bus.data_register(), BUFFER_LEN, bus.pacing(direction)));
    }
    info!("DMA channels configured for {} bytes", BUFFER_LEN);

    let message = unwrap!(Message::at(PAYLOAD));
    let framed = unwrap!(message.encode(unwrap!(link.store_mut().outbound_mut())));
    info!("Outbound buffer holds a {} byte AT frame", framed);

    let notifier = unwrap!(CompletionNotifier::new(tx_flag, rx_flag, &link));
    node::install(Node {
        link,
        notifier,
        monitor: SyncMonitor::new(),
        driver: SyncDriver::new(sync_out),
    });

    interrupt::DMA_IRQ_1.set_priority(Priority::P1);
    // SAFETY: the handler only touches the context installed above
    unsafe { interrupt::DMA_IRQ_1.enable() };

    spawner.spawn(tasks::sync_monitor_task(sync_in)).unwrap();
    spawner.spawn(tasks::report_task()).unwrap();
    spawner.spawn(tasks::watchdog_task(CONFIG.watchdog)).unwrap();
    info!("All tasks spawned");

    MONITOR_LISTENING.wait().await;
    if CONFIG.role.drives_clock() {
        unwrap!(unwrap!(with_node(|node| node.driver.assert_ready(&node.monitor))));
        info!("Sync line raised, waiting for the follower");
    } else {
        info!("Waiting for the controller's sync edge");
    }

    // Nothing else to do here; the executor sleeps between events
    let _bus = bus;
    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Completion interrupt for both link channels
#[interrupt]
fn DMA_IRQ_1() {
    with_node(|node| {
        for handled in node.notifier.service(&mut node.link) {
            match handled {
                Ok(notice) => {
                    // Drop the own line before any logging, so the peer
                    // sees a fresh edge for the next run
                    node.driver.release_on_complete(&notice, node.link.policy());
                    if NOTICES.try_send(notice).is_err() {
                        DROPPED_NOTICES.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(e) => warn!("Completion without a finished transfer: {}", e),
            }
        }
    });
}
