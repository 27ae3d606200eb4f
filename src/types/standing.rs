//! Per-entity timing values resolved from auxiliary streams

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Time or lap deficit to another car.
///
/// Providers report gaps either as seconds or as a lapped marker such as
/// `"+1 LAP"`; the latter cannot be expressed in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(untagged)]
pub enum Gap {
    /// Gap in seconds
    Seconds(f64),
    /// Whole laps behind
    Laps { laps: u32 },
}

impl Gap {
    /// Read a gap from a raw provider value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().filter(|s| s.is_finite()).map(Gap::Seconds),
            Value::String(raw) => Self::parse_str(raw),
            _ => None,
        }
    }

    /// Parse `"1.234"`, `"+1.234"`, `"+1 LAP"` or `"+3 LAPS"`.
    pub fn parse_str(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed).trim();

        if let Ok(seconds) = unsigned.parse::<f64>() {
            return seconds.is_finite().then_some(Gap::Seconds(seconds));
        }

        let mut parts = unsigned.split_whitespace();
        let count = parts.next()?.parse::<u32>().ok()?;
        let unit = parts.next()?;
        if parts.next().is_none() && (unit.eq_ignore_ascii_case("lap") || unit.eq_ignore_ascii_case("laps"))
        {
            Some(Gap::Laps { laps: count })
        } else {
            None
        }
    }

    /// Gap in seconds, if this is a time gap.
    pub fn seconds(self) -> Option<f64> {
        match self {
            Gap::Seconds(seconds) => Some(seconds),
            Gap::Laps { .. } => None,
        }
    }
}

/// Running state of an entity.
///
/// Derived from race-control messages addressed to the entity; an entity with
/// no such message is `Running`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum TimingStatus {
    #[default]
    Running,
    Retired,
    Disqualified,
}

impl TimingStatus {
    /// Status announced by a race-control message, if it announces one.
    ///
    /// A plain `BLACK` flag (not `BLACK AND WHITE`, which is a warning)
    /// disqualifies, as does a message saying so.
    pub fn from_race_control(flag: Option<&str>, message: Option<&str>) -> Option<Self> {
        let flag = flag.map(|flag| flag.trim().to_ascii_uppercase());
        let message = message.map(str::to_ascii_uppercase).unwrap_or_default();

        if flag.as_deref() == Some("BLACK") || message.contains("DISQUALIFIED") {
            Some(TimingStatus::Disqualified)
        } else if message.contains("RETIRED") {
            Some(TimingStatus::Retired)
        } else {
            None
        }
    }
}

/// Car telemetry channels at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CarTelemetry {
    /// km/h
    pub speed: Option<f64>,
    pub rpm: Option<u32>,
    pub gear: Option<u32>,
    /// Percent
    pub throttle: Option<f64>,
    /// Percent
    pub brake: Option<f64>,
    /// Raw DRS state code
    pub drs: Option<u32>,
}

/// As-of values for one entity at one frame.
///
/// Each auxiliary stream fills the fields it knows about; fields stay `None`
/// when that stream had no eligible record for the entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Standing {
    /// Race position (1 = leader)
    pub rank: Option<u32>,
    /// Lap the entity is on
    pub lap_number: Option<u32>,
    /// Duration of that lap in seconds
    pub lap_time: Option<f64>,
    /// Gap to the car ahead
    pub interval: Option<Gap>,
    /// Gap to the leader
    pub gap_to_leader: Option<Gap>,
    /// Latest car telemetry
    pub telemetry: Option<CarTelemetry>,
    /// Last status announced by race control
    pub status: Option<TimingStatus>,
}
