//! Test utilities: fixture loading and synthetic sessions
//!
//! Recorded session fixtures live under `test-data/sessions/<subject_key>/`,
//! one JSON file per stream (`location.json`, `position.json`, `laps.json`,
//! `intervals.json`) in the provider's response format. Missing files are
//! simply not registered, which the synthesizer treats as an unavailable
//! stream.

#![cfg(any(test, feature = "benchmark"))]

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};

use crate::loader::{MemoryLoader, RawStream};
use crate::profile::StreamKind;
use crate::types::RawRecord;

/// Start of every synthetic session (2023-09-16T13:00:00Z).
pub const SYNTHETIC_EPOCH_MS: i64 = 1_694_869_200_000;

/// Directory holding recorded fixtures.
pub fn get_test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

/// Directory of one recorded session.
pub fn session_fixture_dir(subject_key: &str) -> PathBuf {
    get_test_data_dir().join("sessions").join(subject_key)
}

/// Keys of every recorded session, sorted.
pub fn session_fixture_keys() -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(get_test_data_dir().join("sessions")) else {
        return vec![];
    };

    let mut keys: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    keys.sort();
    keys
}

/// Loader serving every stream file of a recorded session.
pub fn load_session_fixture(subject_key: &str) -> Result<MemoryLoader> {
    let dir = session_fixture_dir(subject_key);
    if !dir.is_dir() {
        bail!("Missing session fixture: {}", dir.display());
    }

    MemoryLoader::from_session_dir(subject_key, &dir)
        .with_context(|| format!("loading session fixture {}", subject_key))
}

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

/// Location record with OpenF1 field names.
pub fn location_record(t: i64, id: u32, x: f64, y: f64) -> RawRecord {
    record(json!({"date": t, "driver_number": id, "x": x, "y": y, "z": 0}))
}

/// Position record with OpenF1 field names.
pub fn position_record(t: i64, id: u32, position: u32) -> RawRecord {
    record(json!({"date": t, "driver_number": id, "position": position}))
}

/// Lap record with OpenF1 field names.
pub fn lap_record(t: i64, id: u32, lap_number: u32, lap_duration: f64) -> RawRecord {
    record(json!({
        "date_start": t,
        "driver_number": id,
        "lap_number": lap_number,
        "lap_duration": lap_duration
    }))
}

/// Interval record with OpenF1 field names.
pub fn interval_record(t: i64, id: u32, interval: Value, gap_to_leader: Value) -> RawRecord {
    record(json!({
        "date": t,
        "driver_number": id,
        "interval": interval,
        "gap_to_leader": gap_to_leader
    }))
}

/// Generated session with cars lapping a circular track.
#[derive(Debug, Clone)]
pub struct SyntheticSession {
    pub location: Vec<RawRecord>,
    pub position: Vec<RawRecord>,
    pub laps: Vec<RawRecord>,
    pub intervals: Vec<RawRecord>,
}

impl SyntheticSession {
    /// Generate `cars` cars over `duration_ms`, sampled every `step_ms`.
    ///
    /// Each car has its own location timestamps (offset by its index), so
    /// frames mostly hold a single car, as real location feeds do. Position
    /// and interval updates come every 4 s, laps every 90 s.
    pub fn generate(cars: u32, duration_ms: i64, step_ms: i64) -> Self {
        let step_ms = step_ms.max(1);
        let lap_ms = 90_000i64;
        let radius = 1_000.0;

        let mut session =
            Self { location: Vec::new(), position: Vec::new(), laps: Vec::new(), intervals: Vec::new() };

        for car in 0..cars {
            let id = car + 1;
            let pace = 1.0 + car as f64 * 0.002;
            for tick in 0..=duration_ms / step_ms {
                let t = tick * step_ms + car as i64;
                let angle = (t as f64 / lap_ms as f64 * pace * TAU) % TAU;
                session.location.push(location_record(
                    SYNTHETIC_EPOCH_MS + t,
                    id,
                    radius * angle.cos(),
                    radius * angle.sin(),
                ));
            }

            let mut t = 0;
            while t <= duration_ms {
                session.position.push(position_record(SYNTHETIC_EPOCH_MS + t, id, id));
                let gap = car as f64 * 0.75;
                session.intervals.push(interval_record(
                    SYNTHETIC_EPOCH_MS + t,
                    id,
                    if car == 0 { Value::Null } else { json!(0.75) },
                    if car == 0 { Value::Null } else { json!(gap) },
                ));
                t += 4_000;
            }

            let mut lap = 1;
            while lap as i64 * lap_ms <= duration_ms {
                session.laps.push(lap_record(
                    SYNTHETIC_EPOCH_MS + (lap as i64 - 1) * lap_ms,
                    id,
                    lap,
                    90.0 + car as f64 * 0.18,
                ));
                lap += 1;
            }
        }

        session
    }

    /// Auxiliary streams in synthesis order.
    pub fn auxiliary(&self) -> Vec<(StreamKind, RawStream)> {
        vec![
            (StreamKind::Position, RawStream::from(self.position.clone())),
            (StreamKind::Laps, RawStream::from(self.laps.clone())),
            (StreamKind::Intervals, RawStream::from(self.intervals.clone())),
        ]
    }

    /// Loader serving this session under `subject_key`.
    pub fn into_loader(self, subject_key: &str) -> MemoryLoader {
        MemoryLoader::new()
            .with_stream(subject_key, StreamKind::Location, self.location)
            .with_stream(subject_key, StreamKind::Position, self.position)
            .with_stream(subject_key, StreamKind::Laps, self.laps)
            .with_stream(subject_key, StreamKind::Intervals, self.intervals)
    }
}
