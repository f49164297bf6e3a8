//! DMA channels for the bulk transfer
//!
//! Channels are programmed through the non-triggering `AL1_CTRL` alias so
//! loading never starts them; [`Rp2040Trigger`] starts both with a single
//! write to `MULTI_CHAN_TRIGGER`.
//!
//! embassy-rp owns `DMA_IRQ_0` and acknowledges whatever `INTS0` shows, so
//! claimed channels are moved to `DMA_IRQ_1` where only their own
//! completion flags clear them.

use core::sync::atomic::{compiler_fence, Ordering};

use embassy_rp::dma::{AnyChannel, Channel};
use embassy_rp::pac;
use embassy_rp::pac::dma::regs::CtrlTrig;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::Peri;
use tandem_hal::dma::{ChannelMask, ChannelSetup, LoadError, Rejected};
use tandem_hal::{CompletionFlag, TransferChannel, TransferTrigger};

/// Interrupt line the claimed channels report on
const IRQ_LINE: usize = 1;

/// Line embassy-rp services for its own transfers
const EMBASSY_IRQ_LINE: usize = 0;

/// Interrupt register bit of a channel; the RP2040 has 12 channels
fn irq_bit(number: u8) -> u32 {
    1 << number
}

/// Take a DMA channel for the link
///
/// Returns the channel and its completion flag. The flag is routed to
/// `DMA_IRQ_1` and removed from `DMA_IRQ_0`.
pub fn claim(channel: Peri<'static, impl Channel>) -> (Rp2040Channel, Rp2040Flag) {
    let channel: Peri<'static, AnyChannel> = channel.into();
    let number = channel.number();
    let bit = irq_bit(number);

    cortex_m::interrupt::free(|_| {
        pac::DMA.inte(EMBASSY_IRQ_LINE).modify(|v| *v &= !bit);
        pac::DMA.ints(IRQ_LINE).write_value(bit);
        pac::DMA.inte(IRQ_LINE).modify(|v| *v |= bit);
    });

    (
        Rp2040Channel {
            _channel: channel,
            number,
            loaded: None,
        },
        Rp2040Flag { number },
    )
}

struct Loaded {
    memory: &'static mut [u8],
    length: usize,
}

/// One claimed DMA channel
pub struct Rp2040Channel {
    _channel: Peri<'static, AnyChannel>,
    number: u8,
    loaded: Option<Loaded>,
}

impl Rp2040Channel {
    fn regs(&self) -> pac::dma::Channel {
        pac::DMA.ch(self.number as usize)
    }
}

impl TransferChannel for Rp2040Channel {
    fn number(&self) -> u8 {
        self.number
    }

    fn load(&mut self, setup: &ChannelSetup, memory: &'static mut [u8]) -> Result<(), Rejected> {
        if self.loaded.is_some() {
            let reason = if self.is_busy() {
                LoadError::Busy
            } else {
                LoadError::Occupied
            };
            return Err(Rejected { reason, memory });
        }
        if setup.length > memory.len() {
            return Err(Rejected {
                reason: LoadError::TooLong,
                memory,
            });
        }

        let buffer = memory.as_mut_ptr() as u32;
        let peripheral = setup.peripheral as u32;
        let (read, write) = if setup.direction.increments_read() {
            (buffer, peripheral)
        } else {
            (peripheral, buffer)
        };

        let mut ctrl = CtrlTrig::default();
        ctrl.set_en(true);
        ctrl.set_data_size(DataSize::SIZE_BYTE);
        ctrl.set_incr_read(setup.direction.increments_read());
        ctrl.set_incr_write(setup.direction.increments_write());
        ctrl.set_treq_sel(TreqSel::from(setup.pacing.dreq));
        // Chaining to itself disables chaining
        ctrl.set_chain_to(self.number);

        let ch = self.regs();
        ch.read_addr().write_value(read);
        ch.write_addr().write_value(write);
        ch.trans_count().write_value(setup.length as u32);
        // Buffer contents must be in memory before the channel can start
        compiler_fence(Ordering::SeqCst);
        ch.al1_ctrl().write_value(ctrl.0);

        self.loaded = Some(Loaded {
            memory,
            length: setup.length,
        });
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.regs().ctrl_trig().read().busy()
    }

    fn transferred(&self) -> usize {
        match &self.loaded {
            Some(loaded) => {
                let remaining = self.regs().trans_count().read() as usize;
                loaded.length.saturating_sub(remaining)
            }
            None => 0,
        }
    }

    fn reclaim(&mut self) -> Option<&'static mut [u8]> {
        if self.is_busy() {
            return None;
        }
        let loaded = self.loaded.take()?;
        compiler_fence(Ordering::SeqCst);
        Some(loaded.memory)
    }
}

/// Completion flag of one claimed channel on `DMA_IRQ_1`
pub struct Rp2040Flag {
    number: u8,
}

impl Rp2040Flag {
    fn bit(&self) -> u32 {
        irq_bit(self.number)
    }
}

impl CompletionFlag for Rp2040Flag {
    fn channel(&self) -> u8 {
        self.number
    }

    fn is_pending(&self) -> bool {
        pac::DMA.ints(IRQ_LINE).read() & self.bit() != 0
    }

    fn acknowledge(&mut self) {
        // Write-one-to-clear: other bits are untouched
        pac::DMA.ints(IRQ_LINE).write_value(self.bit());
    }
}

/// Starts loaded channels through `MULTI_CHAN_TRIGGER`
pub struct Rp2040Trigger {
    _private: (),
}

impl Rp2040Trigger {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for Rp2040Trigger {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferTrigger for Rp2040Trigger {
    fn start(&mut self, mask: ChannelMask) {
        compiler_fence(Ordering::SeqCst);
        pac::DMA
            .multi_chan_trigger()
            .write(|w| w.set_multi_chan_trigger(mask.bits() as u16));
    }
}
