//! Board-agnostic logic for the two-node sync-and-transfer link
//!
//! This crate contains everything that does not depend on a specific chip:
//!
//! - Buffer store lending fixed buffers to the transfer channels
//! - Transfer engine configuring and starting both channels together
//! - Sync signal monitor and driver
//! - Completion notifier with one handler per channel
//! - Link state machine and stall watchdog
//! - Link configuration types

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod buffer;
pub mod config;
pub mod driver;
pub mod engine;
pub mod link;
pub mod monitor;
pub mod notifier;
pub mod state;
pub mod watchdog;

#[cfg(test)]
mod sim;

pub use buffer::{BufferError, BufferStore, MemoryRegion};
pub use driver::SyncDriver;
pub use engine::{EngineError, TransferEngine};
pub use link::{Link, LinkError};
pub use monitor::{Armed, SyncMonitor};
pub use notifier::{Completion, CompletionNotifier, Notice};
pub use state::{Event, FaultKind, LinkState, RearmPolicy};
pub use watchdog::{StallWatchdog, WatchdogStatus};

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tandem_hal::dma::Direction;
    use tandem_hal::InputPin;
    use tandem_protocol::{Message, TAG_AT};

    use super::*;
    use crate::sim::{
        clock, exchange, leak, SimDma, SimFlag, SimLink, SimPin, SPI0_DR, SPI0_PACING_RX,
        SPI0_PACING_TX,
    };

    const CAP: usize = 256;

    struct Node {
        dma: SimDma,
        link: SimLink<CAP>,
        notifier: CompletionNotifier<SimFlag>,
        monitor: SyncMonitor,
        driver: SyncDriver<SimPin>,
    }

    impl Node {
        fn new(sync_out: SimPin, length: usize, policy: RearmPolicy) -> Self {
            let dma = SimDma::new();
            let store = BufferStore::new(leak(0), leak(0xFF));
            let mut link = Link::new(store, dma.engine(0, 1), policy);
            link.configure(Direction::Outbound, SPI0_DR, length, SPI0_PACING_TX)
                .unwrap();
            link.configure(Direction::Inbound, SPI0_DR, length, SPI0_PACING_RX)
                .unwrap();
            let notifier = CompletionNotifier::new(dma.flag(0), dma.flag(1), &link).unwrap();

            Self {
                dma,
                link,
                notifier,
                monitor: SyncMonitor::new(),
                driver: SyncDriver::new(sync_out),
            }
        }

        fn write(&mut self, payload: &[u8]) {
            let buffer = self.link.store_mut().outbound_mut().unwrap();
            Message::at(payload).unwrap().encode(buffer).unwrap();
        }

        fn edge_if_high(&mut self, sync_in: &SimPin) -> Option<Armed> {
            if sync_in.is_high() {
                self.monitor.on_rising_edge(&mut self.link).ok()
            } else {
                None
            }
        }

        /// What the completion interrupt does
        fn service(&mut self) -> std::vec::Vec<Notice> {
            let notices: std::vec::Vec<Notice> = self
                .notifier
                .service(&mut self.link)
                .into_iter()
                .map(|n| n.unwrap())
                .collect();
            for notice in &notices {
                self.driver.release_on_complete(notice, self.link.policy());
            }
            notices
        }
    }

    /// Wire up a controller and a follower and run the handshake
    ///
    /// The follower answers only once it is armed, so the controller never
    /// clocks into an idle peer.
    fn handshake(controller: &mut Node, follower: &mut Node, c_in: &SimPin, f_in: &SimPin) {
        controller.monitor.listen(c_in);
        follower.monitor.listen(f_in);

        controller.driver.assert_ready(&controller.monitor).unwrap();
        follower.edge_if_high(f_in).unwrap();
        follower.driver.assert_ready(&follower.monitor).unwrap();
        controller.edge_if_high(c_in).unwrap();
    }

    fn pair(length: usize, policy: RearmPolicy) -> (Node, Node, SimPin, SimPin) {
        // controller out -> follower in, follower out -> controller in
        let c_to_f = SimPin::new();
        let f_to_c = SimPin::new();
        let controller = Node::new(c_to_f.clone(), length, policy);
        let follower = Node::new(f_to_c.clone(), length, policy);
        (controller, follower, f_to_c, c_to_f)
    }

    #[test]
    fn test_at_command_end_to_end() {
        let (mut a, mut b, a_in, b_in) = pair(CAP, RearmPolicy::SingleShot);
        a.write(b"AT+TEST\r\n");
        b.write(b"OK\r\n");

        handshake(&mut a, &mut b, &a_in, &b_in);
        assert_eq!(exchange(&a.dma, &b.dma), CAP);

        let notices = b.service();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.bytes == CAP));
        assert!(notices.iter().any(|n| n.link_complete));
        assert_eq!(a.service().len(), 2);

        let received = b.link.store().inbound().unwrap();
        assert_eq!(&received[..5], &[0x41, 0x54, 0x00, 0x09, 0x00]);
        assert_eq!(&received[5..14], b"AT+TEST\r\n");
        assert!(received[14..].iter().all(|&byte| byte == 0));

        let reply = Message::decode_tagged(a.link.store().inbound().unwrap(), TAG_AT).unwrap();
        assert_eq!(reply.payload, b"OK\r\n");

        assert_eq!(a.link.state(), LinkState::Complete);
        assert_eq!(b.link.state(), LinkState::Complete);
    }

    #[test]
    fn test_controller_without_peer_edge_never_clocks() {
        let (mut a, mut b, a_in, b_in) = pair(CAP, RearmPolicy::SingleShot);
        a.monitor.listen(&a_in);
        b.monitor.listen(&b_in);

        // Follower never answers: nothing is armed, nothing moves
        a.driver.assert_ready(&a.monitor).unwrap();
        assert!(a.edge_if_high(&a_in).is_none());
        assert_eq!(exchange(&a.dma, &b.dma), 0);
        assert!(a.service().is_empty());
        assert_eq!(a.link.state(), LinkState::Idle);
    }

    #[test]
    fn test_single_shot_rejects_second_edge() {
        let (mut a, mut b, a_in, b_in) = pair(CAP, RearmPolicy::SingleShot);
        a.write(b"first");
        handshake(&mut a, &mut b, &a_in, &b_in);
        exchange(&a.dma, &b.dma);
        a.service();
        b.service();

        a.write(b"second");
        assert_eq!(
            a.monitor.on_rising_edge(&mut a.link),
            Err(LinkError::SingleShot)
        );
        assert_eq!(a.dma.starts().len(), 1);

        // Data written after the run is intact, the received data too
        let pending = Message::decode(a.link.store().outbound().unwrap()).unwrap();
        assert_eq!(pending.payload, b"second");
        let received = Message::decode(b.link.store().inbound().unwrap()).unwrap();
        assert_eq!(received.payload, b"first");
    }

    #[test]
    fn test_rearm_sends_new_contents() {
        let (mut a, mut b, a_in, b_in) = pair(CAP, RearmPolicy::Rearm);
        a.write(b"first");
        handshake(&mut a, &mut b, &a_in, &b_in);
        exchange(&a.dma, &b.dma);
        a.service();
        b.service();

        a.write(b"second");
        b.monitor.on_rising_edge(&mut b.link).unwrap();
        let armed = a.monitor.on_rising_edge(&mut a.link).unwrap();
        assert_eq!(armed.run, 2);

        assert_eq!(exchange(&a.dma, &b.dma), CAP);
        assert_eq!(b.service().len(), 2);
        assert_eq!(a.service().len(), 2);

        let received = Message::decode(b.link.store().inbound().unwrap()).unwrap();
        assert_eq!(received.payload, b"second");
        let sent = Message::decode(a.link.store().outbound().unwrap()).unwrap();
        assert_eq!(sent.payload, b"second");
        assert_eq!(b.link.runs(), 2);
    }

    #[test]
    fn test_rearm_lines_low_between_runs() {
        let (mut a, mut b, a_in, b_in) = pair(CAP, RearmPolicy::Rearm);

        for (run, payload) in [(1, &b"first"[..]), (2, &b"second"[..])] {
            a.write(payload);
            handshake(&mut a, &mut b, &a_in, &b_in);
            assert!(a_in.is_high() && b_in.is_high());

            assert_eq!(exchange(&a.dma, &b.dma), CAP);
            b.service();
            a.service();

            // Both lines dropped as soon as each side completed
            assert!(a_in.is_low() && b_in.is_low());
            assert!(!a.driver.is_asserted() && !b.driver.is_asserted());
            assert_eq!(a.link.state(), LinkState::Complete);
            assert_eq!(b.link.runs(), run);

            let received = Message::decode(b.link.store().inbound().unwrap()).unwrap();
            assert_eq!(received.payload, payload);
        }
    }

    #[test]
    fn test_single_shot_keeps_lines_high() {
        let (mut a, mut b, a_in, b_in) = pair(CAP, RearmPolicy::SingleShot);
        handshake(&mut a, &mut b, &a_in, &b_in);
        exchange(&a.dma, &b.dma);
        b.service();
        a.service();

        assert!(a_in.is_high() && b_in.is_high());
    }

    proptest! {
        #[test]
        fn channels_move_exactly_configured_length(length in 1usize..=CAP) {
            let (mut a, mut b, a_in, b_in) = pair(length, RearmPolicy::SingleShot);
            a.link.store_mut().outbound_mut().unwrap().fill(0x5A);
            handshake(&mut a, &mut b, &a_in, &b_in);

            // One byte short: no flag is set yet
            prop_assert_eq!(clock(&a.dma, &b.dma, length - 1), length - 1);
            prop_assert!(!a.dma.flag_pending(0) && !b.dma.flag_pending(1));
            prop_assert_eq!(b.link.engine().transferred(Direction::Inbound), length - 1);

            prop_assert_eq!(clock(&a.dma, &b.dma, usize::MAX), 1);
            prop_assert!(a.dma.flag_pending(0) && a.dma.flag_pending(1));
            prop_assert!(b.dma.flag_pending(0) && b.dma.flag_pending(1));

            for notice in b.service() {
                prop_assert_eq!(notice.bytes, length);
            }
            let received = b.link.store().inbound().unwrap();
            prop_assert!(received[..length].iter().all(|&byte| byte == 0x5A));
            prop_assert!(received[length..].iter().all(|&byte| byte == 0xFF));
        }
    }
}
