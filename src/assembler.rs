//! Frame assembly from the primary stream

use std::collections::BTreeMap;
use tracing::debug;

use crate::profile::LocationProfile;
use crate::types::{EntityPosition, Frame, Sample, Timestamp};
use crate::{Result, SynthesisError};

/// Group primary-stream samples into frames, one per distinct timestamp.
///
/// Positions keep the order they were first seen in within a timestamp.
/// Frames come back sorted by timestamp. An empty input is the
/// [`SynthesisError::EmptyPrimaryStream`] failure, since duration and
/// bounding box have no meaning without frames.
pub fn assemble_frames(
    subject_key: &str,
    samples: &[Sample],
    spatial: &LocationProfile,
) -> Result<Vec<Frame>> {
    if samples.is_empty() {
        return Err(SynthesisError::empty_primary(subject_key));
    }

    let mut frames: BTreeMap<Timestamp, Frame> = BTreeMap::new();
    for sample in samples {
        let frame =
            frames.entry(sample.timestamp).or_insert_with(|| Frame::new(sample.timestamp));
        frame.entities.push(EntityPosition {
            entity_id: sample.entity_id,
            x: sample.f64(&spatial.x),
            y: sample.f64(&spatial.y),
        });
    }

    let frames: Vec<Frame> = frames.into_values().collect();
    if let (Some(first), Some(last)) = (frames.first(), frames.last()) {
        debug!(
            subject_key,
            samples = samples.len(),
            frames = frames.len(),
            first = %first.timestamp,
            last = %last.timestamp,
            "Assembled frames"
        );
    }

    Ok(frames)
}
