//! Bus setup for the link
//!
//! The link never issues blocking SPI transfers. After setup the bus is
//! fed and drained by the two transfer channels, so all that is described
//! here is who clocks the bus, how fast, and in which mode.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which endpoint generates the bus clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BusRole {
    /// Drives SCK and chip select; its channels set the pace for both ends
    Controller,
    /// Clocked by the peer; its channels only move while the peer clocks
    Follower,
}

impl BusRole {
    /// Check if the local endpoint owns bus timing
    pub fn drives_clock(&self) -> bool {
        matches!(self, BusRole::Controller)
    }
}

/// Bus settings both endpoints must agree on, plus the local role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Clock in Hz; ignored by the hardware when following
    pub frequency: u32,
    pub mode: Mode,
    pub role: BusRole,
}

impl SpiConfig {
    pub fn new(frequency: u32, mode: Mode, role: BusRole) -> Self {
        Self {
            frequency,
            mode,
            role,
        }
    }
}

/// Idle level of the clock line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    IdleLow,
    IdleHigh,
}

/// Clock edge on which data is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    CaptureOnFirstTransition,
    CaptureOnSecondTransition,
}

/// Standard SPI mode number, 0-3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl Mode {
    /// CPOL of this mode
    pub fn polarity(self) -> Polarity {
        match self {
            Mode::Mode0 | Mode::Mode1 => Polarity::IdleLow,
            Mode::Mode2 | Mode::Mode3 => Polarity::IdleHigh,
        }
    }

    /// CPHA of this mode
    pub fn phase(self) -> Phase {
        match self {
            Mode::Mode0 | Mode::Mode2 => Phase::CaptureOnFirstTransition,
            Mode::Mode1 | Mode::Mode3 => Phase::CaptureOnSecondTransition,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Mode0),
            1 => Ok(Mode::Mode1),
            2 => Ok(Mode::Mode2),
            3 => Ok(Mode::Mode3),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_numbers() {
        assert_eq!(Mode::try_from(0), Ok(Mode::Mode0));
        assert_eq!(Mode::try_from(3), Ok(Mode::Mode3));
        assert_eq!(Mode::try_from(4), Err(4));
    }

    #[test]
    fn test_mode_bits() {
        assert_eq!(Mode::Mode1.polarity(), Polarity::IdleLow);
        assert_eq!(Mode::Mode1.phase(), Phase::CaptureOnSecondTransition);
        assert_eq!(Mode::Mode2.polarity(), Polarity::IdleHigh);
        assert_eq!(Mode::Mode2.phase(), Phase::CaptureOnFirstTransition);
    }

    #[test]
    fn test_only_controller_clocks() {
        assert!(BusRole::Controller.drives_clock());
        assert!(!BusRole::Follower.drives_clock());
    }
}
