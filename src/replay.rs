//! Replay synthesis: normalize, assemble, join, aggregate.
//!
//! Everything here is synchronous and pure. The same streams and profile
//! always serialize to the same bytes.

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{BoundingBox, session_duration};
use crate::asof::{AuxiliaryStream, apply_auxiliary};
use crate::assembler::assemble_frames;
use crate::loader::RawStream;
use crate::normalize::normalize_stream;
use crate::profile::{SessionProfile, StreamKind};
use crate::types::{Frame, SampleStream, Timestamp};
use crate::Result;

/// Reconstructed session timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replay {
    pub subject_key: String,
    pub duration_ms: i64,
    pub bbox: Option<BoundingBox>,
    pub frames: Vec<Frame>,
}

impl Replay {
    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.frames.first().map(|frame| frame.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.frames.last().map(|frame| frame.timestamp)
    }

    /// Average frame rate over the session, 0 when it has no duration.
    pub fn frame_rate_hz(&self) -> f64 {
        if self.duration_ms <= 0 || self.frames.len() < 2 {
            return 0.0;
        }
        (self.frames.len() - 1) as f64 * 1000.0 / self.duration_ms as f64
    }
}

/// Wire response for a replay request: the replay, or the failure message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplayResponse {
    Replay(Replay),
    Failure { subject_key: String, error: String },
}

impl ReplayResponse {
    pub fn from_result(subject_key: &str, result: Result<Replay>) -> Self {
        match result {
            Ok(replay) => ReplayResponse::Replay(replay),
            Err(error) => {
                warn!(subject_key, %error, "Replay synthesis failed");
                ReplayResponse::Failure { subject_key: subject_key.to_string(), error: error.to_string() }
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ReplayResponse::Failure { .. })
    }

    pub fn replay(&self) -> Option<&Replay> {
        match self {
            ReplayResponse::Replay(replay) => Some(replay),
            ReplayResponse::Failure { .. } => None,
        }
    }
}

/// Build a replay from raw streams.
///
/// `primary` is the location stream. Auxiliary streams that are unavailable
/// or empty simply leave their standing fields unset.
pub fn synthesize_replay(
    subject_key: &str,
    primary: RawStream,
    auxiliary: Vec<(StreamKind, RawStream)>,
    profile: &SessionProfile,
) -> Result<Replay> {
    profile.validate()?;

    let primary = normalize_stream(StreamKind::Location.name(), primary, &profile.location);
    let auxiliary: Vec<AuxiliaryStream> = auxiliary
        .into_iter()
        .map(|(kind, raw)| {
            AuxiliaryStream::new(kind, normalize_stream(kind.name(), raw, profile.fields_for(kind)))
        })
        .collect();

    synthesize_from_samples(subject_key, &primary, &auxiliary, profile)
}

/// Build a replay from already normalized streams.
pub fn synthesize_from_samples(
    subject_key: &str,
    primary: &SampleStream,
    auxiliary: &[AuxiliaryStream],
    profile: &SessionProfile,
) -> Result<Replay> {
    let mut frames = assemble_frames(subject_key, primary.samples(), &profile.location)?;
    for stream in auxiliary {
        apply_auxiliary(&mut frames, stream, profile);
    }

    let duration_ms = session_duration(&frames);
    let bbox = BoundingBox::from_frames(&frames);
    if bbox.is_none() {
        warn!(subject_key, "No complete coordinates in primary stream, bounding box unknown");
    }

    info!(
        subject_key,
        frames = frames.len(),
        duration_ms,
        auxiliary_streams = auxiliary.len(),
        "Synthesized replay"
    );

    Ok(Replay { subject_key: subject_key.to_string(), duration_ms, bbox, frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SynthesisError;
    use crate::test_utils::SyntheticSession;
    use crate::types::EntityId;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn raw(value: Value) -> RawStream {
        RawStream::from_json(value)
    }

    fn two_frame_location() -> RawStream {
        raw(json!([
            {"date": 1000, "driver_number": 1, "x": 0, "y": 0},
            {"date": 1000, "driver_number": 2, "x": 5, "y": 5},
            {"date": 2000, "driver_number": 1, "x": 1, "y": 1}
        ]))
    }

    #[test]
    fn two_frame_session_wire_shape() {
        let replay = synthesize_replay("9161", two_frame_location(), vec![], &SessionProfile::default())
            .unwrap();

        let value = serde_json::to_value(ReplayResponse::Replay(replay)).unwrap();
        assert_eq!(
            value,
            json!({
                "subject_key": "9161",
                "duration_ms": 1000,
                "bbox": {"minX": 0.0, "maxX": 5.0, "minY": 0.0, "maxY": 5.0},
                "frames": [
                    {
                        "t": 1000,
                        "positions": [
                            {"entity_id": 1, "x": 0.0, "y": 0.0},
                            {"entity_id": 2, "x": 5.0, "y": 5.0}
                        ],
                        "standings": {}
                    },
                    {
                        "t": 2000,
                        "positions": [{"entity_id": 1, "x": 1.0, "y": 1.0}],
                        "standings": {}
                    }
                ]
            })
        );
    }

    #[test]
    fn rank_is_joined_as_of_each_frame() {
        let location = raw(json!([
            {"date": 1000, "driver_number": 1, "x": 0, "y": 0},
            {"date": 2000, "driver_number": 1, "x": 1, "y": 1}
        ]));
        let position = raw(json!([
            {"date": 500, "driver_number": 1, "position": 2},
            {"date": 1500, "driver_number": 1, "position": 1}
        ]));

        let replay = synthesize_replay(
            "s",
            location,
            vec![(StreamKind::Position, position)],
            &SessionProfile::default(),
        )
        .unwrap();

        assert_eq!(replay.frames[0].rank_of(EntityId::new(1)), Some(2));
        assert_eq!(replay.frames[1].rank_of(EntityId::new(1)), Some(1));

        let value = serde_json::to_value(&replay.frames[0]).unwrap();
        assert_eq!(value["standings"], json!({"1": 2}));
    }

    #[test]
    fn empty_primary_is_a_failure_response() {
        let result = synthesize_replay("9161", raw(json!([])), vec![], &SessionProfile::default());
        assert!(matches!(result, Err(SynthesisError::EmptyPrimaryStream { .. })));

        let response = ReplayResponse::from_result("9161", result);
        assert!(response.is_failure());

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["subject_key"], json!("9161"));
        assert!(value["error"].as_str().unwrap().contains("9161"));
        assert!(value.get("frames").is_none());
    }

    #[test]
    fn unavailable_primary_is_a_failure() {
        let result = synthesize_replay(
            "s",
            RawStream::unavailable("HTTP 429"),
            vec![],
            &SessionProfile::default(),
        );
        assert!(matches!(result, Err(SynthesisError::EmptyPrimaryStream { .. })));
    }

    #[test]
    fn unavailable_auxiliary_leaves_standings_empty() {
        let replay = synthesize_replay(
            "s",
            two_frame_location(),
            vec![(StreamKind::Position, RawStream::unavailable("API fetching failed"))],
            &SessionProfile::default(),
        )
        .unwrap();

        assert_eq!(replay.frames.len(), 2);
        assert!(replay.frames.iter().all(|frame| frame.standings.is_empty()));
    }

    #[test]
    fn mixed_id_forms_are_one_entity() {
        let location = raw(json!([
            {"date": 1000, "driver_number": 7, "x": 0, "y": 0},
            {"date": 2000, "driver_number": "7", "x": 1, "y": 1}
        ]));
        let position = raw(json!([{"date": 900, "driver_number": 7.0, "position": 3}]));

        let replay = synthesize_replay(
            "s",
            location,
            vec![(StreamKind::Position, position)],
            &SessionProfile::default(),
        )
        .unwrap();

        for frame in &replay.frames {
            assert_eq!(frame.entities[0].entity_id, EntityId::new(7));
            assert_eq!(frame.rank_of(EntityId::new(7)), Some(3));
        }
    }

    #[test]
    fn invalid_profile_is_rejected() {
        let mut profile = SessionProfile::default();
        profile.location.x = String::new();
        let result = synthesize_replay("s", two_frame_location(), vec![], &profile);
        assert!(matches!(result, Err(SynthesisError::Profile { .. })));
    }

    #[test]
    fn frame_rate_over_session() {
        let replay = synthesize_replay("s", two_frame_location(), vec![], &SessionProfile::default())
            .unwrap();
        assert_eq!(replay.frame_rate_hz(), 1.0);
        assert_eq!(replay.first_timestamp(), Some(Timestamp::from_millis(1000)));
        assert_eq!(replay.last_timestamp(), Some(Timestamp::from_millis(2000)));
    }

    #[test]
    fn extreme_numeric_dates_do_not_overflow_duration() {
        let unusable = raw(json!([
            {"date": i64::MIN, "driver_number": 1, "x": 0, "y": 0},
            {"date": i64::MAX, "driver_number": 1, "x": 1, "y": 1},
            {"date": -1e300, "driver_number": 2, "x": 0, "y": 0},
            {"date": 1e300, "driver_number": 2, "x": 1, "y": 1}
        ]));
        let result = synthesize_replay("s", unusable, vec![], &SessionProfile::default());
        assert!(matches!(result, Err(SynthesisError::EmptyPrimaryStream { .. })));

        let widest = raw(json!([
            {"date": -8_000_000_000_000_000i64, "driver_number": 1, "x": 0, "y": 0},
            {"date": 8_000_000_000_000_000i64, "driver_number": 1, "x": 1, "y": 1},
            {"date": i64::MAX, "driver_number": 1, "x": 2, "y": 2}
        ]));
        let replay = synthesize_replay("s", widest, vec![], &SessionProfile::default()).unwrap();
        assert_eq!(replay.frames.len(), 2);
        assert_eq!(replay.duration_ms, 16_000_000_000_000_000);
    }

    #[test]
    fn generated_session_joins_every_frame() {
        let session = SyntheticSession::generate(5, 200_000, 270);
        let replay = synthesize_replay(
            "synthetic",
            RawStream::from(session.location.clone()),
            session.auxiliary(),
            &SessionProfile::default(),
        )
        .unwrap();

        assert_eq!(replay.frames.len(), session.location.len());

        // ranks are published from the first instant on
        for frame in &replay.frames {
            for car in 1..=5 {
                assert_eq!(frame.rank_of(EntityId::new(car)), Some(car));
            }
        }

        let bbox = replay.bbox.unwrap();
        assert!(bbox.width() > 1_900.0 && bbox.width() <= 2_000.0);
    }

    fn location_records(points: &[(i64, u32, i32, i32)]) -> RawStream {
        RawStream::Available(
            points
                .iter()
                .map(|&(t, id, x, y)| {
                    let mut record = serde_json::Map::new();
                    record.insert("date".to_string(), json!(t));
                    record.insert("driver_number".to_string(), json!(id));
                    record.insert("x".to_string(), json!(x));
                    record.insert("y".to_string(), json!(y));
                    record
                })
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn prop_frames_strictly_ascending_and_duration_consistent(
            points in prop::collection::vec((0i64..100_000, 1u32..25, -5000i32..5000, -5000i32..5000), 1..200)
        ) {
            let replay = synthesize_replay("p", location_records(&points), vec![], &SessionProfile::default())
                .unwrap();

            for pair in replay.frames.windows(2) {
                prop_assert!(pair[0].timestamp < pair[1].timestamp);
            }

            let first = replay.frames.first().unwrap().timestamp;
            let last = replay.frames.last().unwrap().timestamp;
            prop_assert_eq!(replay.duration_ms, last.millis_since(first));
            prop_assert!(replay.duration_ms >= 0);

            let bbox = replay.bbox.unwrap();
            for frame in &replay.frames {
                for (x, y) in frame.entities.iter().filter_map(|p| p.coordinates()) {
                    prop_assert!(bbox.contains(x, y));
                }
            }
        }

        #[test]
        fn prop_synthesis_is_byte_identical(
            points in prop::collection::vec((0i64..10_000, 1u32..10, -100i32..100, -100i32..100), 1..80),
            ranks in prop::collection::vec((0i64..10_000, 1u32..10, 1u32..20), 0..80)
        ) {
            let position = || RawStream::Available(
                ranks
                    .iter()
                    .map(|&(t, id, pos)| {
                        let mut record = serde_json::Map::new();
                        record.insert("date".to_string(), json!(t));
                        record.insert("driver_number".to_string(), json!(id));
                        record.insert("position".to_string(), json!(pos));
                        record
                    })
                    .collect(),
            );
            let profile = SessionProfile::default();

            let first = synthesize_replay("p", location_records(&points), vec![(StreamKind::Position, position())], &profile).unwrap();
            let second = synthesize_replay("p", location_records(&points), vec![(StreamKind::Position, position())], &profile).unwrap();

            prop_assert_eq!(
                serde_json::to_vec(&first).unwrap(),
                serde_json::to_vec(&second).unwrap()
            );
        }
    }
}
