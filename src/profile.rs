//! Stream profiles: which raw field means what, per stream.
//!
//! Providers name their fields differently (and the same provider names the
//! timestamp of a lap record differently from that of a position record), so
//! every stream is read through a profile. The defaults match the public
//! OpenF1 field names; other providers can supply a YAML profile where any
//! omitted key keeps its default:
//!
//! ```rust
//! use trackside::SessionProfile;
//!
//! let profile = SessionProfile::from_yaml_str(
//!     "
//! location:
//!   entity: car_idx
//! laps:
//!   lap_time: lap_seconds
//! ",
//! )
//! .unwrap();
//!
//! assert_eq!(profile.location.entity, "car_idx");
//! assert_eq!(profile.location.timestamp, "date");
//! assert_eq!(profile.laps.timestamp, "date_start");
//! assert_eq!(profile.laps.lap_time, "lap_seconds");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::types::{CarTelemetry, Gap, Sample, SampleStream, Standing, TimingStatus};
use crate::{Result, SynthesisError};

/// The streams a session is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Spatial samples; the primary stream
    Location,
    /// Race position updates
    Position,
    /// Completed laps
    Laps,
    /// Gap and interval measurements
    Intervals,
    /// Car telemetry channels (speed, rpm, gear, pedals)
    CarData,
    /// Race-control messages
    RaceControl,
}

impl StreamKind {
    /// All kinds, primary first.
    pub const ALL: [StreamKind; 6] = [
        StreamKind::Location,
        StreamKind::Position,
        StreamKind::Laps,
        StreamKind::Intervals,
        StreamKind::CarData,
        StreamKind::RaceControl,
    ];

    /// Kinds joined onto replay frames, in join order.
    pub const AUXILIARY: [StreamKind; 5] = [
        StreamKind::Position,
        StreamKind::Laps,
        StreamKind::Intervals,
        StreamKind::CarData,
        StreamKind::RaceControl,
    ];

    /// Stream name as used in logs and loader requests.
    pub const fn name(self) -> &'static str {
        match self {
            StreamKind::Location => "location",
            StreamKind::Position => "position",
            StreamKind::Laps => "laps",
            StreamKind::Intervals => "intervals",
            StreamKind::CarData => "car_data",
            StreamKind::RaceControl => "race_control",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field names every stream must provide to be normalized.
pub trait StreamProfile {
    /// Field holding the record's instant.
    fn timestamp_field(&self) -> &str;

    /// Field holding the entity id.
    fn entity_field(&self) -> &str;
}

macro_rules! stream_profile {
    ($ty:ty) => {
        impl StreamProfile for $ty {
            fn timestamp_field(&self) -> &str {
                &self.timestamp
            }

            fn entity_field(&self) -> &str {
                &self.entity
            }
        }
    };
}

/// Primary (spatial) stream fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationProfile {
    pub timestamp: String,
    pub entity: String,
    pub x: String,
    pub y: String,
}

impl Default for LocationProfile {
    fn default() -> Self {
        Self {
            timestamp: "date".to_string(),
            entity: "driver_number".to_string(),
            x: "x".to_string(),
            y: "y".to_string(),
        }
    }
}

/// Race position stream fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PositionProfile {
    pub timestamp: String,
    pub entity: String,
    pub rank: String,
}

impl Default for PositionProfile {
    fn default() -> Self {
        Self {
            timestamp: "date".to_string(),
            entity: "driver_number".to_string(),
            rank: "position".to_string(),
        }
    }
}

/// Lap stream fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LapProfile {
    pub timestamp: String,
    pub entity: String,
    pub lap_number: String,
    /// Lap duration in seconds
    pub lap_time: String,
}

impl Default for LapProfile {
    fn default() -> Self {
        Self {
            timestamp: "date_start".to_string(),
            entity: "driver_number".to_string(),
            lap_number: "lap_number".to_string(),
            lap_time: "lap_duration".to_string(),
        }
    }
}

/// Interval stream fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntervalProfile {
    pub timestamp: String,
    pub entity: String,
    pub interval: String,
    pub gap_to_leader: String,
}

impl Default for IntervalProfile {
    fn default() -> Self {
        Self {
            timestamp: "date".to_string(),
            entity: "driver_number".to_string(),
            interval: "interval".to_string(),
            gap_to_leader: "gap_to_leader".to_string(),
        }
    }
}

/// Car telemetry stream fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarDataProfile {
    pub timestamp: String,
    pub entity: String,
    pub speed: String,
    pub rpm: String,
    pub gear: String,
    pub throttle: String,
    pub brake: String,
    pub drs: String,
}

impl Default for CarDataProfile {
    fn default() -> Self {
        Self {
            timestamp: "date".to_string(),
            entity: "driver_number".to_string(),
            speed: "speed".to_string(),
            rpm: "rpm".to_string(),
            gear: "n_gear".to_string(),
            throttle: "throttle".to_string(),
            brake: "brake".to_string(),
            drs: "drs".to_string(),
        }
    }
}

/// Race-control stream fields.
///
/// Only messages addressed to one entity are normalized; session-wide
/// messages carry no entity and are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RaceControlProfile {
    pub timestamp: String,
    pub entity: String,
    pub flag: String,
    pub message: String,
}

impl Default for RaceControlProfile {
    fn default() -> Self {
        Self {
            timestamp: "date".to_string(),
            entity: "driver_number".to_string(),
            flag: "flag".to_string(),
            message: "message".to_string(),
        }
    }
}

impl RaceControlProfile {
    /// Status a race-control sample announces, if any.
    pub fn status_of(&self, sample: &Sample) -> Option<TimingStatus> {
        TimingStatus::from_race_control(sample.str(&self.flag), sample.str(&self.message))
    }

    /// Keep only the messages that announce a status.
    ///
    /// Joining on this stream makes a status stick until the next announcing
    /// message instead of being hidden by later routine messages.
    pub fn status_events(&self, stream: &SampleStream) -> SampleStream {
        let samples = stream
            .samples()
            .iter()
            .filter(|sample| self.status_of(sample).is_some())
            .cloned()
            .collect();
        SampleStream::new(stream.name(), samples)
    }
}

stream_profile!(LocationProfile);
stream_profile!(PositionProfile);
stream_profile!(LapProfile);
stream_profile!(IntervalProfile);
stream_profile!(CarDataProfile);
stream_profile!(RaceControlProfile);

/// Field mapping for every stream of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionProfile {
    pub location: LocationProfile,
    pub position: PositionProfile,
    pub laps: LapProfile,
    pub intervals: IntervalProfile,
    pub car_data: CarDataProfile,
    pub race_control: RaceControlProfile,
}

impl SessionProfile {
    /// Parse a profile from YAML and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let profile: SessionProfile = serde_yaml_ng::from_str(yaml)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Read and parse a YAML profile file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| SynthesisError::file_error(path.to_path_buf(), source))?;

        debug!(path = %path.display(), bytes = yaml.len(), "Loaded stream profile");
        Self::from_yaml_str(&yaml)
    }

    /// Serialize the profile to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Profile for one stream.
    pub fn fields_for(&self, kind: StreamKind) -> &dyn StreamProfile {
        match kind {
            StreamKind::Location => &self.location,
            StreamKind::Position => &self.position,
            StreamKind::Laps => &self.laps,
            StreamKind::Intervals => &self.intervals,
            StreamKind::CarData => &self.car_data,
            StreamKind::RaceControl => &self.race_control,
        }
    }

    /// Copy the standing values a sample of `kind` carries into `standing`.
    ///
    /// Location samples carry no standing values and leave it untouched.
    pub fn read_standing(&self, kind: StreamKind, sample: &Sample, standing: &mut Standing) {
        match kind {
            StreamKind::Location => {}
            StreamKind::Position => {
                standing.rank = sample.u32(&self.position.rank);
            }
            StreamKind::Laps => {
                standing.lap_number = sample.u32(&self.laps.lap_number);
                standing.lap_time = sample.f64(&self.laps.lap_time);
            }
            StreamKind::Intervals => {
                standing.interval = sample.get(&self.intervals.interval).and_then(Gap::from_value);
                standing.gap_to_leader =
                    sample.get(&self.intervals.gap_to_leader).and_then(Gap::from_value);
            }
            StreamKind::CarData => {
                let fields = &self.car_data;
                standing.telemetry = Some(CarTelemetry {
                    speed: sample.f64(&fields.speed),
                    rpm: sample.u32(&fields.rpm),
                    gear: sample.u32(&fields.gear),
                    throttle: sample.f64(&fields.throttle),
                    brake: sample.f64(&fields.brake),
                    drs: sample.u32(&fields.drs),
                });
            }
            StreamKind::RaceControl => {
                if let Some(status) = self.race_control.status_of(sample) {
                    standing.status = Some(status);
                }
            }
        }
    }

    /// Reject empty field names.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("location.timestamp", &self.location.timestamp),
            ("location.entity", &self.location.entity),
            ("location.x", &self.location.x),
            ("location.y", &self.location.y),
            ("position.timestamp", &self.position.timestamp),
            ("position.entity", &self.position.entity),
            ("position.rank", &self.position.rank),
            ("laps.timestamp", &self.laps.timestamp),
            ("laps.entity", &self.laps.entity),
            ("laps.lap_number", &self.laps.lap_number),
            ("laps.lap_time", &self.laps.lap_time),
            ("intervals.timestamp", &self.intervals.timestamp),
            ("intervals.entity", &self.intervals.entity),
            ("intervals.interval", &self.intervals.interval),
            ("intervals.gap_to_leader", &self.intervals.gap_to_leader),
            ("car_data.timestamp", &self.car_data.timestamp),
            ("car_data.entity", &self.car_data.entity),
            ("car_data.speed", &self.car_data.speed),
            ("car_data.rpm", &self.car_data.rpm),
            ("car_data.gear", &self.car_data.gear),
            ("car_data.throttle", &self.car_data.throttle),
            ("car_data.brake", &self.car_data.brake),
            ("car_data.drs", &self.car_data.drs),
            ("race_control.timestamp", &self.race_control.timestamp),
            ("race_control.entity", &self.race_control.entity),
            ("race_control.flag", &self.race_control.flag),
            ("race_control.message", &self.race_control.message),
        ];

        for (key, value) in fields {
            if value.trim().is_empty() {
                return Err(SynthesisError::invalid_profile(format!("'{}' must not be empty", key)));
            }
        }

        Ok(())
    }
}
