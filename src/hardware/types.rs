//! Hardware data types: fan state, FRU inventory, temperature readings, zones.

use std::collections::BTreeMap;
use std::fmt;

/// Supermicro BMC fan modes, valued as the raw byte the controller uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanMode {
    Standard = 0,
    Full = 1,
    Optimal = 2,
    HeavyIo = 4,
}

impl FanMode {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(FanMode::Standard),
            1 => Some(FanMode::Full),
            2 => Some(FanMode::Optimal),
            4 => Some(FanMode::HeavyIo),
            _ => None,
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FanMode::Standard => "STANDARD",
            FanMode::Full => "FULL",
            FanMode::Optimal => "OPTIMAL",
            FanMode::HeavyIo => "HEAVYIO",
        };
        f.write_str(name)
    }
}

/// Last mode and speed confirmed by the controller. `None` means unknown.
/// Only updated after the corresponding command succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanState {
    pub mode: Option<FanMode>,
    pub speed_percent: Option<u8>,
}

/// FRU inventory fields. Populated once per device and never refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FruInventory {
    fields: BTreeMap<String, String>,
}

impl FruInventory {
    pub const BOARD_PART_NUMBER: &'static str = "Board Part Number";

    pub fn insert_if_absent(&mut self, key: &str, value: &str) {
        self.fields
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Board part number, or an empty string when the FRU does not carry one.
    pub fn board_part_number(&self) -> &str {
        self.get(Self::BOARD_PART_NUMBER).unwrap_or("")
    }
}

/// One temperature value and where it came from (drive path or sensor label).
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    pub value: f64,
    pub source: String,
}

/// Hottest value of a set of readings, `None` when there are none.
pub fn max_reading(readings: &[TemperatureReading]) -> Option<f64> {
    readings.iter().map(|r| r.value).reduce(f64::max)
}

/// Opaque fan zone token as the controller dialect expects it (`0x10`, `00`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeedZone(pub String);

impl SpeedZone {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeedZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scale 0-100% onto the 8-bit PWM duty range, rounding to nearest.
pub fn percent_to_pwm(percent: u8) -> u8 {
    let percent = percent.min(100) as u32;
    ((percent * 255 + 50) / 100) as u8
}
