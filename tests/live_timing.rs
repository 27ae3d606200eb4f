//! Live timing board composition.

mod common;

use common::{init_tracing, load_session};
use serde_json::json;
use trackside::{
    EntityId, Gap, MemoryLoader, RawStream, SessionProfile, SessionSynthesizer, StreamKind,
    TimingRow, TimingStatus, compose_live_timing, normalize_stream,
};

#[tokio::test]
async fn demo_board_is_ordered_by_latest_rank() {
    init_tracing();
    let loader = load_session("demo").unwrap();
    let rows = SessionSynthesizer::with_default_profile(loader).live_timing("demo").await.unwrap();

    let order: Vec<u32> = rows.iter().map(|row| row.entity_id.get()).collect();
    assert_eq!(order, vec![1, 44, 11]);

    assert_eq!(
        rows[0],
        TimingRow {
            rank: Some(1),
            entity_id: EntityId::new(1),
            status: TimingStatus::Running,
            interval: None,
            gap_to_leader: None,
            lap_time: Some(92.4),
            lap_number: Some(2),
        }
    );
    assert_eq!(rows[1].interval, Some(Gap::Seconds(0.8)));
    assert_eq!(rows[1].lap_number, Some(1));
    assert_eq!(rows[1].lap_time, None);
    assert_eq!(rows[2].gap_to_leader, Some(Gap::Seconds(1.2)));
    assert_eq!(rows[2].lap_time, Some(96.0));
    assert_eq!(rows[2].status, TimingStatus::Retired);
    assert_eq!(rows[1].status, TimingStatus::Running);
}

#[tokio::test]
async fn board_without_lap_or_interval_streams() {
    init_tracing();
    let loader = MemoryLoader::new().with_stream(
        "9161",
        StreamKind::Position,
        RawStream::from_json(json!([{"date": "2023-09-16T13:00:00Z", "driver_number": 7, "position": 1}])),
    );

    let rows = SessionSynthesizer::with_default_profile(loader).live_timing("9161").await.unwrap();
    let value = serde_json::to_value(&rows).unwrap();
    assert_eq!(
        value,
        json!([{
            "rank": 1,
            "entity_id": 7,
            "status": "Running",
            "interval": null,
            "gap_to_leader": null,
            "lap_time": null,
            "lap_number": null
        }])
    );
}

#[tokio::test]
async fn missing_rank_stream_gives_empty_board() {
    let rows = SessionSynthesizer::with_default_profile(MemoryLoader::new())
        .live_timing("9161")
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn later_rank_update_in_same_instant_wins() {
    let profile = SessionProfile::default();
    let rank = normalize_stream(
        "position",
        RawStream::from_json(json!([
            {"date": 1000, "driver_number": 4, "position": 9},
            {"date": 1000, "driver_number": "4", "position": 8}
        ])),
        &profile.position,
    );

    let rows = compose_live_timing(
        &rank,
        &normalize_stream("laps", RawStream::Available(vec![]), &profile.laps),
        &normalize_stream("intervals", RawStream::unavailable("HTTP 429"), &profile.intervals),
        &profile,
    );
    assert_eq!(rows[0].rank, Some(8));
}
