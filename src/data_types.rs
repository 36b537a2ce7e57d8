//! Data types for MAX17320 driver.

use crate::registers::{addr, raw_to_amp_hours, raw_to_amps, raw_to_volts};

/// A scaled telemetry register: where it lives and how its raw word maps to units.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quantity {
    /// Pack voltage (V).
    Voltage,
    /// Pack current (A). Positive while charging.
    Current,
    /// Reported remaining capacity (Ah).
    StateOfCharge,
    /// Learned full capacity (Ah).
    FullCapacity,
}

impl Quantity {
    pub const fn register(self) -> u16 {
        match self {
            Quantity::Voltage => addr::BATT,
            Quantity::Current => addr::CURRENT,
            Quantity::StateOfCharge => addr::REPCAP,
            Quantity::FullCapacity => addr::FULLCAP,
        }
    }

    /// Whether the raw word is two's complement.
    pub const fn is_signed(self) -> bool {
        matches!(self, Quantity::Current)
    }

    /// Scale a raw register word to physical units.
    pub fn convert(self, raw: u16) -> f32 {
        match self {
            Quantity::Voltage => raw_to_volts(raw),
            Quantity::Current => raw_to_amps(raw),
            Quantity::StateOfCharge | Quantity::FullCapacity => raw_to_amp_hours(raw),
        }
    }
}

/// One telemetry snapshot.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatteryStats {
    pub voltage: f32,
    pub current: f32,
    pub state_of_charge: f32,
    pub full_capacity: f32,
}
