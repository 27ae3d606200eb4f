//! Sample normalization: raw records to canonical samples.
//!
//! A record without a usable timestamp or entity id is dropped here and
//! never surfaces as an error; one bad record must not cost the rest of the
//! stream. Entity ids are canonicalized here and nowhere else.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::loader::RawStream;
use crate::profile::StreamProfile;
use crate::types::{EntityId, RawRecord, Sample, SampleStream, Timestamp};

/// Normalize one record, or `None` if it lacks a usable timestamp or entity id.
///
/// The timestamp and entity fields are consumed; every other field is kept.
pub fn normalize_record(record: &RawRecord, profile: &dyn StreamProfile) -> Option<Sample> {
    let (timestamp, entity_id) = required_keys(record, profile)?;
    let fields = record
        .iter()
        .filter(|(name, _)| !is_key_field(name, profile))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Some(Sample::new(timestamp, entity_id, fields))
}

/// Normalize a whole stream, consuming its records.
///
/// Unavailable streams normalize to an empty stream.
pub fn normalize_stream(name: &str, raw: RawStream, profile: &dyn StreamProfile) -> SampleStream {
    let records = match raw {
        RawStream::Available(records) => records,
        RawStream::Unavailable { reason } => {
            warn!(stream = name, %reason, "Stream unavailable, treating as empty");
            return SampleStream::empty(name);
        }
    };

    let total = records.len();
    let samples: Vec<Sample> =
        records.into_iter().filter_map(|record| normalize_owned(record, profile)).collect();

    let dropped = total - samples.len();
    if dropped > 0 {
        debug!(
            stream = name,
            total,
            dropped,
            timestamp_field = profile.timestamp_field(),
            entity_field = profile.entity_field(),
            "Dropped records without usable timestamp or entity id"
        );
    }
    debug!(stream = name, samples = samples.len(), "Normalized stream");

    SampleStream::new(name, samples)
}

fn normalize_owned(record: RawRecord, profile: &dyn StreamProfile) -> Option<Sample> {
    let (timestamp, entity_id) = required_keys(&record, profile)?;
    let fields: BTreeMap<_, _> =
        record.into_iter().filter(|(name, _)| !is_key_field(name, profile)).collect();

    Some(Sample::new(timestamp, entity_id, fields))
}

fn required_keys(record: &RawRecord, profile: &dyn StreamProfile) -> Option<(Timestamp, EntityId)> {
    let timestamp = record.get(profile.timestamp_field()).and_then(Timestamp::from_value)?;
    let entity_id = record.get(profile.entity_field()).and_then(EntityId::from_value)?;
    Some((timestamp, entity_id))
}

fn is_key_field(name: &str, profile: &dyn StreamProfile) -> bool {
    name == profile.timestamp_field() || name == profile.entity_field()
}
