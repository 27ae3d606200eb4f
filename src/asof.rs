//! As-of joins: last known value at or before a target time.
//!
//! For a target `T` an entity resolves to its sample with the greatest
//! timestamp `<= T`; a sample at exactly `T` is eligible. When two samples of
//! one entity share a timestamp, the later one in stream order wins. Entities
//! with no eligible sample are absent from the result.
//!
//! [`resolve_as_of`] answers a single query by scanning. Joining a whole
//! replay goes through [`AsOfCursor`] instead: frame timestamps only move
//! forward, so one cursor walks each sorted auxiliary stream exactly once.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::profile::{SessionProfile, StreamKind};
use crate::types::{EntityId, Frame, Sample, SampleStream, Timestamp};

/// Resolve every entity's latest sample at or before `target`.
///
/// Works on samples in any order; ties go to the later slice position.
pub fn resolve_as_of(samples: &[Sample], target: Timestamp) -> BTreeMap<EntityId, &Sample> {
    let mut resolved: BTreeMap<EntityId, &Sample> = BTreeMap::new();
    for sample in samples.iter().filter(|sample| sample.timestamp <= target) {
        match resolved.get(&sample.entity_id) {
            Some(current) if current.timestamp > sample.timestamp => {}
            _ => {
                resolved.insert(sample.entity_id, sample);
            }
        }
    }
    resolved
}

/// Forward-only as-of resolver over a sorted stream.
///
/// Each [`advance_to`](Self::advance_to) consumes the samples between the
/// previous target and the new one, so a sequence of ascending targets costs
/// one pass over the stream in total. Moving the target backwards rewinds
/// the cursor and rescans from the start.
#[derive(Debug)]
pub struct AsOfCursor<'a> {
    samples: &'a [Sample],
    next: usize,
    target: Option<Timestamp>,
    latest: BTreeMap<EntityId, &'a Sample>,
}

impl<'a> AsOfCursor<'a> {
    /// Create a cursor positioned before the first sample.
    pub fn new(stream: &'a SampleStream) -> Self {
        Self { samples: stream.samples(), next: 0, target: None, latest: BTreeMap::new() }
    }

    /// Move to `target` and return the per-entity as-of view there.
    pub fn advance_to(&mut self, target: Timestamp) -> &BTreeMap<EntityId, &'a Sample> {
        if self.target.is_some_and(|previous| target < previous) {
            self.rewind();
        }

        while let Some(sample) = self.samples.get(self.next) {
            if sample.timestamp > target {
                break;
            }
            // sorted input: a later sample is never older than the one it replaces
            self.latest.insert(sample.entity_id, sample);
            self.next += 1;
        }

        self.target = Some(target);
        &self.latest
    }

    /// Current view without moving.
    pub fn latest(&self) -> &BTreeMap<EntityId, &'a Sample> {
        &self.latest
    }

    /// Current target, if the cursor has been advanced.
    pub fn target(&self) -> Option<Timestamp> {
        self.target
    }

    /// Number of samples consumed so far.
    pub fn consumed(&self) -> usize {
        self.next
    }

    fn rewind(&mut self) {
        self.next = 0;
        self.target = None;
        self.latest.clear();
    }
}

/// Auxiliary stream joined onto the replay timeline.
#[derive(Debug, Clone)]
pub struct AuxiliaryStream {
    pub kind: StreamKind,
    pub stream: SampleStream,
}

impl AuxiliaryStream {
    pub fn new(kind: StreamKind, stream: SampleStream) -> Self {
        Self { kind, stream }
    }
}

/// Merge an auxiliary stream into every frame's standings.
///
/// Frames are expected in ascending timestamp order, which keeps the join a
/// single pass; out-of-order frames still resolve correctly.
pub fn apply_auxiliary(frames: &mut [Frame], auxiliary: &AuxiliaryStream, profile: &SessionProfile) {
    if auxiliary.kind == StreamKind::Location {
        warn!(stream = auxiliary.stream.name(), "Location stream carries no standings, skipping join");
        return;
    }

    // routine race-control messages must not mask an earlier status
    let status_events;
    let stream = if auxiliary.kind == StreamKind::RaceControl {
        status_events = profile.race_control.status_events(&auxiliary.stream);
        &status_events
    } else {
        &auxiliary.stream
    };

    let mut cursor = AsOfCursor::new(stream);
    let mut resolved_entries = 0usize;

    for frame in frames.iter_mut() {
        let resolved = cursor.advance_to(frame.timestamp);
        resolved_entries += resolved.len();

        for (entity_id, sample) in resolved {
            let standing = frame.standings.entry(*entity_id).or_default();
            profile.read_standing(auxiliary.kind, sample, standing);
        }
    }

    debug!(
        stream = auxiliary.stream.name(),
        kind = %auxiliary.kind,
        frames = frames.len(),
        samples = stream.len(),
        consumed = cursor.consumed(),
        resolved_entries,
        "Applied as-of join"
    );
}
