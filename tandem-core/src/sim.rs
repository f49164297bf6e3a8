//! Host simulation of the transfer hardware
//!
//! A small model of a DMA controller, the SPI bus between two nodes and the
//! sync lines. Channels move exactly their configured count, set their own
//! completion bit when the count is reached and never touch another
//! channel's bit.

use std::boxed::Box;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use tandem_hal::dma::{ChannelMask, ChannelSetup, LoadError, Pacing, Rejected};
use tandem_hal::{CompletionFlag, InputPin, OutputPin, TransferChannel, TransferTrigger};

use crate::engine::TransferEngine;
use crate::link::Link;

/// Fake address of the SPI0 data register
pub const SPI0_DR: usize = 0x4003_c008;

/// SPI0 transmit request line
pub const SPI0_PACING_TX: Pacing = Pacing { bus: 0, dreq: 16 };

/// SPI0 receive request line
pub const SPI0_PACING_RX: Pacing = Pacing { bus: 0, dreq: 17 };

const CHANNELS: usize = 12;

fn bit(channel: u8) -> u32 {
    1 << channel
}

/// Engine over simulated channels
pub type SimEngine = TransferEngine<SimChannel, SimTrigger>;

/// Link over simulated channels
pub type SimLink<const N: usize> = Link<SimChannel, SimTrigger, N>;

/// Leak a filled buffer to get the `'static` lifetime the store needs
pub fn leak<const N: usize>(fill: u8) -> &'static mut [u8; N] {
    Box::leak(Box::new([fill; N]))
}

#[derive(Default)]
struct Slot {
    setup: Option<ChannelSetup>,
    memory: Option<&'static mut [u8]>,
    count: usize,
    busy: bool,
    refuse: Option<LoadError>,
}

impl Slot {
    fn advance(&mut self) -> Option<usize> {
        let length = self.setup.as_ref()?.length;
        if !self.busy || self.count >= length {
            return None;
        }
        let index = self.count;
        self.count += 1;
        if self.count == length {
            self.busy = false;
        }
        Some(index)
    }
}

#[derive(Default)]
struct Controller {
    slots: [Slot; CHANNELS],
    starts: Vec<ChannelMask>,
    raised: u32,
    lanes: Option<(u8, u8)>,
}

impl Controller {
    fn finish_if_done(&mut self, channel: u8) {
        if !self.slots[channel as usize].busy {
            self.raised |= bit(channel);
        }
    }

    /// Read the next outbound byte, if the channel is running
    fn pull(&mut self, channel: u8) -> Option<u8> {
        let slot = &mut self.slots[channel as usize];
        let index = slot.advance()?;
        let byte = slot.memory.as_ref().map(|m| m[index])?;
        self.finish_if_done(channel);
        Some(byte)
    }

    /// Store an inbound byte; dropped when the channel is not running
    fn push(&mut self, channel: u8, byte: u8) {
        let slot = &mut self.slots[channel as usize];
        let Some(index) = slot.advance() else {
            return;
        };
        if let Some(memory) = slot.memory.as_mut() {
            memory[index] = byte;
        }
        self.finish_if_done(channel);
    }
}

/// Handle to one simulated DMA controller
#[derive(Clone, Default)]
pub struct SimDma(Rc<RefCell<Controller>>);

impl SimDma {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim two channels and build an engine over them
    pub fn engine(&self, outbound: u8, inbound: u8) -> SimEngine {
        self.0.borrow_mut().lanes = Some((outbound, inbound));
        TransferEngine::new(self.channel(outbound), self.channel(inbound), self.trigger()).unwrap()
    }

    pub fn channel(&self, number: u8) -> SimChannel {
        SimChannel {
            number,
            dma: self.0.clone(),
        }
    }

    pub fn trigger(&self) -> SimTrigger {
        SimTrigger { dma: self.0.clone() }
    }

    pub fn flag(&self, number: u8) -> SimFlag {
        SimFlag {
            number,
            dma: self.0.clone(),
        }
    }

    /// Masks written to the trigger, in order
    pub fn starts(&self) -> Vec<ChannelMask> {
        self.0.borrow().starts.clone()
    }

    pub fn is_busy(&self, channel: u8) -> bool {
        self.0.borrow().slots[channel as usize].busy
    }

    pub fn flag_pending(&self, channel: u8) -> bool {
        self.0.borrow().raised & bit(channel) != 0
    }

    /// Make every later load of `channel` fail with `reason`
    pub fn refuse_loads(&self, channel: u8, reason: LoadError) {
        self.0.borrow_mut().slots[channel as usize].refuse = Some(reason);
    }

    /// Clock the bus with the transmit line wired to the receive line
    ///
    /// Runs while the outbound channel has data.
    pub fn loopback(&self, outbound: u8, inbound: u8) {
        let mut dma = self.0.borrow_mut();
        while let Some(byte) = dma.pull(outbound) {
            dma.push(inbound, byte);
        }
    }

    fn lanes(&self) -> (u8, u8) {
        self.0.borrow().lanes.unwrap_or((0, 1))
    }
}

/// Clock `limit` bytes between a bus controller and a follower
///
/// The controller only clocks while its outbound channel has data. A
/// follower with nothing loaded shifts out zeros and its received bytes are
/// lost. Returns the number of bytes clocked.
pub fn clock(controller: &SimDma, follower: &SimDma, limit: usize) -> usize {
    let (c_out, c_in) = controller.lanes();
    let (f_out, f_in) = follower.lanes();
    let mut clocked = 0;

    while clocked < limit {
        let Some(sent) = controller.0.borrow_mut().pull(c_out) else {
            break;
        };
        let mut far = follower.0.borrow_mut();
        let reply = far.pull(f_out).unwrap_or(0);
        far.push(f_in, sent);
        drop(far);
        controller.0.borrow_mut().push(c_in, reply);
        clocked += 1;
    }
    clocked
}

/// Clock until the controller has nothing left to send
pub fn exchange(controller: &SimDma, follower: &SimDma) -> usize {
    clock(controller, follower, usize::MAX)
}

pub struct SimChannel {
    number: u8,
    dma: Rc<RefCell<Controller>>,
}

impl TransferChannel for SimChannel {
    fn number(&self) -> u8 {
        self.number
    }

    fn load(&mut self, setup: &ChannelSetup, memory: &'static mut [u8]) -> Result<(), Rejected> {
        let mut dma = self.dma.borrow_mut();
        let slot = &mut dma.slots[self.number as usize];

        let refusal = if let Some(reason) = slot.refuse {
            Some(reason)
        } else if slot.busy {
            Some(LoadError::Busy)
        } else if slot.memory.is_some() {
            Some(LoadError::Occupied)
        } else if setup.length > memory.len() {
            Some(LoadError::TooLong)
        } else {
            None
        };
        if let Some(reason) = refusal {
            return Err(Rejected { reason, memory });
        }

        slot.setup = Some(*setup);
        slot.memory = Some(memory);
        slot.count = 0;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.dma.borrow().slots[self.number as usize].busy
    }

    fn transferred(&self) -> usize {
        self.dma.borrow().slots[self.number as usize].count
    }

    fn reclaim(&mut self) -> Option<&'static mut [u8]> {
        let mut dma = self.dma.borrow_mut();
        let slot = &mut dma.slots[self.number as usize];
        if slot.busy {
            return None;
        }
        slot.memory.take()
    }
}

pub struct SimTrigger {
    dma: Rc<RefCell<Controller>>,
}

impl TransferTrigger for SimTrigger {
    fn start(&mut self, mask: ChannelMask) {
        let mut dma = self.dma.borrow_mut();
        dma.starts.push(mask);
        for number in 0..CHANNELS as u8 {
            let slot = &mut dma.slots[number as usize];
            if mask.contains(number) && slot.memory.is_some() {
                slot.count = 0;
                slot.busy = true;
            }
        }
    }
}

pub struct SimFlag {
    number: u8,
    dma: Rc<RefCell<Controller>>,
}

impl CompletionFlag for SimFlag {
    fn channel(&self) -> u8 {
        self.number
    }

    fn is_pending(&self) -> bool {
        self.dma.borrow().raised & bit(self.number) != 0
    }

    fn acknowledge(&mut self) {
        self.dma.borrow_mut().raised &= !bit(self.number);
    }
}

/// A wire between one node's output and the other node's input
#[derive(Clone, Default)]
pub struct SimPin(Rc<Cell<bool>>);

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputPin for SimPin {
    fn set_high(&mut self) {
        self.0.set(true);
    }

    fn set_low(&mut self) {
        self.0.set(false);
    }

    fn is_set_high(&self) -> bool {
        self.0.get()
    }
}

impl InputPin for SimPin {
    fn is_high(&self) -> bool {
        self.0.get()
    }
}
