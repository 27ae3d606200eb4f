//! Normalized samples and sample streams

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{EntityId, Timestamp};

/// Free-form record as supplied by a stream loader.
pub type RawRecord = serde_json::Map<String, Value>;

/// One normalized observation: who, when, and whatever else the record carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub entity_id: EntityId,
    pub fields: BTreeMap<String, Value>,
}

impl Sample {
    /// Create a sample.
    pub fn new(timestamp: Timestamp, entity_id: EntityId, fields: BTreeMap<String, Value>) -> Self {
        Self { timestamp, entity_id, fields }
    }

    /// Raw field lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Numeric field as `f64`, accepting numbers and numeric strings.
    pub fn f64(&self, name: &str) -> Option<f64> {
        let value = match self.fields.get(name)? {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|value| value.is_finite())
    }

    /// Non-negative integral field as `u32`.
    pub fn u32(&self, name: &str) -> Option<u32> {
        let value = self.f64(name)?;
        if value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value) {
            Some(value as u32)
        } else {
            None
        }
    }

    /// String field.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Samples of one named stream, ordered by timestamp.
///
/// Ordering is stable: samples sharing a timestamp keep the order the loader
/// supplied them in, which is what later-wins tie-breaking relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStream {
    name: String,
    samples: Vec<Sample>,
}

impl SampleStream {
    /// Build a stream, sorting samples by timestamp.
    pub fn new(name: impl Into<String>, mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|sample| sample.timestamp);
        Self { name: name.into(), samples }
    }

    /// Empty stream.
    pub fn empty(name: impl Into<String>) -> Self {
        Self { name: name.into(), samples: Vec::new() }
    }

    /// Stream name (used in logs).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Samples in timestamp order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the first and last sample.
    pub fn span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.samples.first()?.timestamp, self.samples.last()?.timestamp))
    }
}
