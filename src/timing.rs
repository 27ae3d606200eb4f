//! Live timing: one row per ranked entity from the latest record of each stream.
//!
//! The position stream decides who is on the board; lap, interval and
//! race-control data only decorate those rows. An entity that appears in the
//! lap stream but was never ranked is not shown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::latest::latest_by_entity;
use crate::profile::{SessionProfile, StreamKind};
use crate::types::{EntityId, Gap, Sample, SampleStream, Standing, TimingStatus};

/// One row of the live timing board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TimingRow {
    pub rank: Option<u32>,
    pub entity_id: EntityId,
    pub status: TimingStatus,
    pub interval: Option<Gap>,
    pub gap_to_leader: Option<Gap>,
    /// Last lap duration in seconds
    pub lap_time: Option<f64>,
    pub lap_number: Option<u32>,
}

impl TimingRow {
    fn from_standing(entity_id: EntityId, standing: Standing) -> Self {
        Self {
            rank: standing.rank,
            entity_id,
            status: standing.status.unwrap_or_default(),
            interval: standing.interval,
            gap_to_leader: standing.gap_to_leader,
            lap_time: standing.lap_time,
            lap_number: standing.lap_number,
        }
    }
}

/// Compose the timing board from whole streams.
pub fn compose_live_timing(
    rank: &SampleStream,
    lap: &SampleStream,
    interval: &SampleStream,
    profile: &SessionProfile,
) -> Vec<TimingRow> {
    compose_from_latest(
        &latest_by_entity(rank),
        &latest_by_entity(lap),
        &latest_by_entity(interval),
        profile,
    )
}

/// Compose the timing board with statuses announced by race control.
///
/// A row's status comes from the entity's latest status-announcing message;
/// routine messages after it do not reset the row to `Running`.
pub fn compose_live_timing_with_race_control(
    rank: &SampleStream,
    lap: &SampleStream,
    interval: &SampleStream,
    race_control: &SampleStream,
    profile: &SessionProfile,
) -> Vec<TimingRow> {
    compose_rows(
        &latest_by_entity(rank),
        &latest_by_entity(lap),
        &latest_by_entity(interval),
        &latest_by_entity(&profile.race_control.status_events(race_control)),
        profile,
    )
}

/// Compose the timing board from already extracted latest records.
///
/// Rows are sorted by rank; rows without a readable rank go last, and equal
/// ranks are ordered by entity id.
pub fn compose_from_latest(
    rank: &BTreeMap<EntityId, Sample>,
    lap: &BTreeMap<EntityId, Sample>,
    interval: &BTreeMap<EntityId, Sample>,
    profile: &SessionProfile,
) -> Vec<TimingRow> {
    compose_rows(rank, lap, interval, &BTreeMap::new(), profile)
}

fn compose_rows(
    rank: &BTreeMap<EntityId, Sample>,
    lap: &BTreeMap<EntityId, Sample>,
    interval: &BTreeMap<EntityId, Sample>,
    status: &BTreeMap<EntityId, Sample>,
    profile: &SessionProfile,
) -> Vec<TimingRow> {
    let mut rows: Vec<TimingRow> = rank
        .iter()
        .map(|(entity_id, rank_sample)| {
            let mut standing = Standing::default();
            profile.read_standing(StreamKind::Position, rank_sample, &mut standing);
            if let Some(sample) = lap.get(entity_id) {
                profile.read_standing(StreamKind::Laps, sample, &mut standing);
            }
            if let Some(sample) = interval.get(entity_id) {
                profile.read_standing(StreamKind::Intervals, sample, &mut standing);
            }
            if let Some(sample) = status.get(entity_id) {
                profile.read_standing(StreamKind::RaceControl, sample, &mut standing);
            }
            TimingRow::from_standing(*entity_id, standing)
        })
        .collect();

    rows.sort_by_key(|row| (row.rank.is_none(), row.rank, row.entity_id));

    debug!(
        rows = rows.len(),
        unranked = rows.iter().filter(|row| row.rank.is_none()).count(),
        not_running = rows.iter().filter(|row| row.status != TimingStatus::Running).count(),
        "Composed live timing"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_stream;
    use crate::test_utils::SyntheticSession;
    use crate::types::Timestamp;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn sample(t: i64, id: u32, fields: Value) -> Sample {
        let fields = match fields {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Sample::new(Timestamp::from_millis(t), EntityId::new(id), fields)
    }

    fn stream(name: &str, samples: Vec<Sample>) -> SampleStream {
        SampleStream::new(name, samples)
    }

    #[test]
    fn entity_without_lap_or_interval_data_has_null_fields() {
        let rank = stream("position", vec![sample(1000, 7, json!({"position": 1}))]);

        let rows = compose_live_timing(
            &rank,
            &SampleStream::empty("laps"),
            &SampleStream::empty("intervals"),
            &SessionProfile::default(),
        );

        assert_eq!(
            rows,
            vec![TimingRow {
                rank: Some(1),
                entity_id: EntityId::new(7),
                status: TimingStatus::Running,
                interval: None,
                gap_to_leader: None,
                lap_time: None,
                lap_number: None,
            }]
        );

        let value = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(
            value,
            json!({
                "rank": 1,
                "entity_id": 7,
                "status": "Running",
                "interval": null,
                "gap_to_leader": null,
                "lap_time": null,
                "lap_number": null
            })
        );
    }

    #[test]
    fn rows_use_latest_record_of_each_stream() {
        let rank = stream(
            "position",
            vec![
                sample(1000, 1, json!({"position": 1})),
                sample(1000, 44, json!({"position": 2})),
                sample(5000, 1, json!({"position": 2})),
                sample(5000, 44, json!({"position": 1})),
            ],
        );
        let lap = stream(
            "laps",
            vec![
                sample(1000, 44, json!({"lap_number": 11, "lap_duration": 93.1})),
                sample(4000, 44, json!({"lap_number": 12, "lap_duration": 91.7})),
            ],
        );
        let interval = stream(
            "intervals",
            vec![sample(5000, 1, json!({"interval": 0.845, "gap_to_leader": "+0.845"}))],
        );

        let rows = compose_live_timing(&rank, &lap, &interval, &SessionProfile::default());
        let ids: Vec<u32> = rows.iter().map(|row| row.entity_id.get()).collect();
        assert_eq!(ids, vec![44, 1]);

        assert_eq!(rows[0].lap_number, Some(12));
        assert_eq!(rows[0].lap_time, Some(91.7));
        assert_eq!(rows[0].interval, None);
        assert_eq!(rows[1].interval, Some(Gap::Seconds(0.845)));
        assert_eq!(rows[1].gap_to_leader, Some(Gap::Seconds(0.845)));
    }

    #[test]
    fn only_ranked_entities_appear() {
        let rank = stream("position", vec![sample(0, 1, json!({"position": 1}))]);
        let lap = stream("laps", vec![sample(0, 99, json!({"lap_number": 3}))]);

        let rows =
            compose_live_timing(&rank, &lap, &SampleStream::empty("intervals"), &SessionProfile::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity_id, EntityId::new(1));
    }

    #[test]
    fn unreadable_ranks_sort_last_by_entity_id() {
        let rank = stream(
            "position",
            vec![
                sample(0, 30, json!({"position": "DNF"})),
                sample(0, 20, json!({})),
                sample(0, 10, json!({"position": 2})),
                sample(0, 5, json!({"position": 2})),
            ],
        );

        let rows = compose_live_timing(
            &rank,
            &SampleStream::empty("laps"),
            &SampleStream::empty("intervals"),
            &SessionProfile::default(),
        );
        let order: Vec<(Option<u32>, u32)> =
            rows.iter().map(|row| (row.rank, row.entity_id.get())).collect();
        assert_eq!(order, vec![(Some(2), 5), (Some(2), 10), (None, 20), (None, 30)]);
    }

    #[test]
    fn empty_rank_stream_gives_empty_board() {
        let lap = stream("laps", vec![sample(0, 1, json!({"lap_number": 3}))]);
        let rows =
            compose_live_timing(&SampleStream::empty("position"), &lap, &lap, &SessionProfile::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn race_control_sets_row_status() {
        let rank = stream(
            "position",
            vec![
                sample(0, 1, json!({"position": 1})),
                sample(0, 2, json!({"position": 2})),
                sample(0, 20, json!({"position": 3})),
            ],
        );
        let race_control = stream(
            "race_control",
            vec![
                sample(100, 2, json!({"flag": null, "message": "CAR 2 (SAR) RETIRED"})),
                sample(200, 2, json!({"flag": "CLEAR", "message": "TRACK CLEAR"})),
                sample(300, 20, json!({"flag": "BLACK", "message": "BLACK FLAG FOR CAR 20 (MAG)"})),
                sample(400, 1, json!({"flag": "BLACK AND WHITE", "message": "TRACK LIMITS CAR 1"})),
            ],
        );

        let rows = compose_live_timing_with_race_control(
            &rank,
            &SampleStream::empty("laps"),
            &SampleStream::empty("intervals"),
            &race_control,
            &SessionProfile::default(),
        );
        let statuses: Vec<(u32, TimingStatus)> =
            rows.iter().map(|row| (row.entity_id.get(), row.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (1, TimingStatus::Running),
                (2, TimingStatus::Retired),
                (20, TimingStatus::Disqualified)
            ]
        );

        let value = serde_json::to_value(&rows[1]).unwrap();
        assert_eq!(value["status"], json!("Retired"));
    }

    #[test]
    fn generated_grid_board() {
        let session = SyntheticSession::generate(20, 300_000, 1_000);
        let profile = SessionProfile::default();

        let rank = normalize_stream("position", session.position.into(), &profile.position);
        let laps = normalize_stream("laps", session.laps.into(), &profile.laps);
        let intervals = normalize_stream("intervals", session.intervals.into(), &profile.intervals);

        let rows = compose_live_timing(&rank, &laps, &intervals, &profile);
        assert_eq!(rows.len(), 20);
        for (index, row) in rows.iter().enumerate() {
            assert_eq!(row.rank, Some(index as u32 + 1));
            assert_eq!(row.lap_number, Some(3));
        }
        assert_eq!(rows[0].gap_to_leader, None);
        assert_eq!(rows[19].gap_to_leader, Some(Gap::Seconds(19.0 * 0.75)));
    }

    proptest! {
        #[test]
        fn prop_board_is_sorted_and_limited_to_ranked_entities(
            ranks in prop::collection::vec((0i64..1_000, 1u32..30, prop::option::of(1u32..25)), 0..80),
            laps in prop::collection::vec((0i64..1_000, 1u32..40, 1u32..70), 0..80)
        ) {
            let rank = stream(
                "position",
                ranks
                    .iter()
                    .map(|&(t, id, pos)| match pos {
                        Some(pos) => sample(t, id, json!({"position": pos})),
                        None => sample(t, id, json!({})),
                    })
                    .collect(),
            );
            let lap = stream(
                "laps",
                laps.iter().map(|&(t, id, n)| sample(t, id, json!({"lap_number": n}))).collect(),
            );

            let rows = compose_live_timing(&rank, &lap, &SampleStream::empty("intervals"), &SessionProfile::default());
            let ranked = latest_by_entity(&rank);

            prop_assert_eq!(rows.len(), ranked.len());
            for row in &rows {
                prop_assert!(ranked.contains_key(&row.entity_id));
            }
            for pair in rows.windows(2) {
                let key = |row: &TimingRow| (row.rank.is_none(), row.rank, row.entity_id);
                prop_assert!(key(&pair[0]) < key(&pair[1]));
            }
        }
    }
}
