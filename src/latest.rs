//! Latest record per entity

use std::collections::BTreeMap;
use tracing::trace;

use crate::types::{EntityId, Sample, SampleStream};

/// Most recent sample of every entity across the whole stream.
///
/// Equal timestamps resolve to the sample that comes later in stream order.
/// An empty (or unavailable) stream yields an empty map.
pub fn latest_by_entity(stream: &SampleStream) -> BTreeMap<EntityId, Sample> {
    let latest = latest_in(stream.samples());
    trace!(stream = stream.name(), entities = latest.len(), "Extracted latest records");
    latest
}

/// Same as [`latest_by_entity`] for samples in any order.
pub fn latest_in(samples: &[Sample]) -> BTreeMap<EntityId, Sample> {
    let mut latest: BTreeMap<EntityId, &Sample> = BTreeMap::new();
    for sample in samples {
        match latest.get(&sample.entity_id) {
            Some(current) if current.timestamp > sample.timestamp => {}
            _ => {
                latest.insert(sample.entity_id, sample);
            }
        }
    }

    latest.into_iter().map(|(id, sample)| (id, sample.clone())).collect()
}
