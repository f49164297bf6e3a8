//! Link configuration
//!
//! Board-level settings shared by both nodes. The firmware build script
//! reads them from `link.toml`, validates them and bakes them into the
//! binary, so a bad pin map or buffer size fails the build.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tandem_hal::spi::{BusRole, Mode, SpiConfig};

use crate::state::RearmPolicy;

/// Highest GPIO number on the RP2040
pub const MAX_GPIO: u8 = 29;

/// Largest buffer either node may configure
pub const MAX_BUFFER_LEN: usize = 64 * 1024;

/// Peripheral clock the SPI block runs from
pub const PERI_CLOCK_HZ: u32 = 125_000_000;

/// Fastest clock a controller can generate (prescale 2)
pub const MAX_CONTROLLER_HZ: u32 = PERI_CLOCK_HZ / 2;

/// Fastest clock a follower can sample (clk_peri / 12)
pub const MAX_FOLLOWER_HZ: u32 = PERI_CLOCK_HZ / 12;

/// Slowest clock the prescalers can produce (254 * 256)
pub const MIN_BUS_HZ: u32 = PERI_CLOCK_HZ / (254 * 256);

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// GPIO number beyond the chip
    PinOutOfRange(u8),
    /// Same GPIO used for two signals
    PinConflict(u8),
    /// GPIO cannot carry this SPI0 signal
    WrongPinFunction { pin: u8, signal: SpiSignal },
    /// Buffer length is zero or too large
    BufferLength(usize),
    /// Bus clock outside what the role supports
    Frequency(u32),
    /// SPI mode above 3
    SpiMode(u8),
    /// Transfer timeout shorter than one full transfer
    WatchdogTooShort { timeout_ms: u32, transfer_ms: u32 },
}

/// SPI0 signals and the GPIO function slot carrying each of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiSignal {
    Rx = 0,
    Csn = 1,
    Sck = 2,
    Tx = 3,
}

impl SpiSignal {
    /// Check if `pin` can be muxed to this SPI0 signal
    pub fn accepts(self, pin: u8) -> bool {
        let bank = pin < 8 || (16..24).contains(&pin);
        bank && pin % 4 == self as u8
    }
}

/// GPIO assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PinMap {
    /// SPI0 RX (MISO on the controller)
    pub rx: u8,
    /// SPI0 chip select
    pub csn: u8,
    /// SPI0 clock
    pub sck: u8,
    /// SPI0 TX (MOSI on the controller)
    pub tx: u8,
    /// Peer's sync line (input, pulled down)
    pub sync_in: u8,
    /// Own sync line (output)
    pub sync_out: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            rx: 16,
            csn: 17,
            sck: 18,
            tx: 19,
            sync_in: 10,
            sync_out: 11,
        }
    }
}

impl PinMap {
    /// All assigned pins in a fixed order
    pub fn all(&self) -> [u8; 6] {
        [self.rx, self.csn, self.sck, self.tx, self.sync_in, self.sync_out]
    }

    /// Validate range, conflicts and SPI pin functions
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pins = self.all();
        for (i, &pin) in pins.iter().enumerate() {
            if pin > MAX_GPIO {
                return Err(ConfigError::PinOutOfRange(pin));
            }
            if pins[..i].contains(&pin) {
                return Err(ConfigError::PinConflict(pin));
            }
        }

        for (pin, signal) in [
            (self.rx, SpiSignal::Rx),
            (self.csn, SpiSignal::Csn),
            (self.sck, SpiSignal::Sck),
            (self.tx, SpiSignal::Tx),
        ] {
            if !signal.accepts(pin) {
                return Err(ConfigError::WrongPinFunction { pin, signal });
            }
        }
        Ok(())
    }
}

/// Stall watchdog limits; zero disables a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WatchdogConfig {
    /// How long to wait for the peer's sync edge
    pub sync_timeout_ms: u32,
    /// How long an armed transfer may run
    pub transfer_timeout_ms: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            sync_timeout_ms: 30_000,
            transfer_timeout_ms: 2_000,
        }
    }
}

/// Complete link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Which node drives the bus clock
    pub role: BusRole,
    /// Bytes per transfer, identical on both nodes
    pub buffer_len: usize,
    /// Bus clock in Hz
    pub frequency_hz: u32,
    /// SPI mode 0-3
    pub spi_mode: u8,
    /// What a sync edge after completion does
    pub rearm: RearmPolicy,
    /// Delay before bring-up, so a debugger can attach
    pub startup_delay_ms: u32,
    pub pins: PinMap,
    pub watchdog: WatchdogConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            role: BusRole::Controller,
            buffer_len: 16 * 1024,
            frequency_hz: 1_000_000,
            spi_mode: 0,
            rearm: RearmPolicy::SingleShot,
            startup_delay_ms: 1000,
            pins: PinMap::default(),
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Time one full transfer takes on the bus, rounded up
    pub fn transfer_ms(&self) -> u32 {
        let bits = self.buffer_len as u64 * 8 * 1000;
        bits.div_ceil(self.frequency_hz.max(1) as u64) as u32
    }

    /// Check every setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pins.validate()?;

        if self.buffer_len == 0 || self.buffer_len > MAX_BUFFER_LEN {
            return Err(ConfigError::BufferLength(self.buffer_len));
        }

        let max_hz = if self.role.drives_clock() {
            MAX_CONTROLLER_HZ
        } else {
            MAX_FOLLOWER_HZ
        };
        if self.frequency_hz < MIN_BUS_HZ || self.frequency_hz > max_hz {
            return Err(ConfigError::Frequency(self.frequency_hz));
        }

        Mode::try_from(self.spi_mode).map_err(ConfigError::SpiMode)?;

        let timeout_ms = self.watchdog.transfer_timeout_ms;
        let transfer_ms = self.transfer_ms();
        if timeout_ms != 0 && timeout_ms <= transfer_ms {
            return Err(ConfigError::WatchdogTooShort {
                timeout_ms,
                transfer_ms,
            });
        }
        Ok(())
    }

    /// Bus configuration for this link
    pub fn spi(&self) -> Result<SpiConfig, ConfigError> {
        let mode = Mode::try_from(self.spi_mode).map_err(ConfigError::SpiMode)?;
        Ok(SpiConfig::new(self.frequency_hz, mode, self.role))
    }
}
