//! SPI0 bus for the link
//!
//! embassy-rp sets up the pins and clock as a controller. The link then
//! routes chip select to the SPI block, switches to follower mode when the
//! peer owns the clock, and enables both DMA requests. No blocking
//! transfers are ever issued on the bus.

use embassy_rp::gpio::Pin;
use embassy_rp::pac;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{self, Blocking, ClkPin, CsPin, MisoPin, MosiPin, Spi};
use embassy_rp::Peri;
use tandem_hal::dma::{Direction, Pacing};
use tandem_hal::spi::{Phase, Polarity, SpiConfig};

/// SPI0 transmit data request
pub const DREQ_SPI0_TX: u8 = 16;

/// SPI0 receive data request
pub const DREQ_SPI0_RX: u8 = 17;

/// GPIO function select for SPI
const FUNCSEL_SPI: u8 = 1;

/// SPI0 configured for DMA in either role
pub struct LinkBus {
    _spi: Spi<'static, SPI0, Blocking>,
    _csn: Peri<'static, embassy_rp::gpio::AnyPin>,
    config: SpiConfig,
}

impl LinkBus {
    /// Bring up SPI0 on the given pins
    pub fn new(
        spi: Peri<'static, SPI0>,
        sck: Peri<'static, impl ClkPin<SPI0>>,
        tx: Peri<'static, impl MosiPin<SPI0>>,
        rx: Peri<'static, impl MisoPin<SPI0>>,
        csn: Peri<'static, impl CsPin<SPI0>>,
        config: &SpiConfig,
    ) -> Self {
        let mut bus_config = spi::Config::default();
        bus_config.frequency = config.frequency;
        bus_config.polarity = match config.mode.polarity() {
            Polarity::IdleLow => spi::Polarity::IdleLow,
            Polarity::IdleHigh => spi::Polarity::IdleHigh,
        };
        bus_config.phase = match config.mode.phase() {
            Phase::CaptureOnFirstTransition => spi::Phase::CaptureOnFirstTransition,
            Phase::CaptureOnSecondTransition => spi::Phase::CaptureOnSecondTransition,
        };

        let bus = Spi::new_blocking(spi, sck, tx, rx, bus_config);

        let csn_number = csn.pin() as usize;
        pac::PADS_BANK0.gpio(csn_number).modify(|w| {
            w.set_ie(true);
            w.set_od(false);
        });
        pac::IO_BANK0
            .gpio(csn_number)
            .ctrl()
            .write(|w| w.set_funcsel(FUNCSEL_SPI));

        let regs = pac::SPI0;
        if !config.role.drives_clock() {
            // MS may only change while the block is disabled
            regs.cr1().modify(|w| w.set_sse(false));
            regs.cr1().modify(|w| w.set_ms(true));
            regs.cr1().modify(|w| w.set_sse(true));
        }
        regs.dmacr().write(|w| {
            w.set_txdmae(true);
            w.set_rxdmae(true);
        });

        Self {
            _spi: bus,
            _csn: csn.into(),
            config: *config,
        }
    }

    /// Address of the data register both channels use
    pub fn data_register(&self) -> usize {
        pac::SPI0.dr().as_ptr() as usize
    }

    /// Data request pacing for one direction
    pub fn pacing(&self, direction: Direction) -> Pacing {
        let dreq = match direction {
            Direction::Outbound => DREQ_SPI0_TX,
            Direction::Inbound => DREQ_SPI0_RX,
        };
        Pacing { bus: 0, dreq }
    }

    /// Bus configuration in force
    pub fn config(&self) -> &SpiConfig {
        &self.config
    }
}
