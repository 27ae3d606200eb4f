//! Replay frame types

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use super::{EntityId, Standing, Timestamp};

/// Position of one entity within a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct EntityPosition {
    pub entity_id: EntityId,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl EntityPosition {
    /// Both coordinates, if the sample carried both.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }
}

/// One instant of the reconstructed replay timeline.
///
/// Built once per distinct primary-stream timestamp. `entities` keeps the
/// order in which positions were first seen at that timestamp; `standings`
/// holds the as-of values of every auxiliary stream at `timestamp`.
///
/// Serializes to the replay wire shape, where `standings` is reduced to
/// `{"<entity_id>": rank}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    #[serde(rename = "t")]
    pub timestamp: Timestamp,

    #[serde(rename = "positions")]
    pub entities: Vec<EntityPosition>,

    #[serde(serialize_with = "serialize_ranks")]
    pub standings: BTreeMap<EntityId, Standing>,
}

impl Frame {
    /// Create an empty frame at `timestamp`.
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp, entities: Vec::new(), standings: BTreeMap::new() }
    }

    /// Resolved standing for an entity.
    pub fn standing(&self, entity_id: EntityId) -> Option<&Standing> {
        self.standings.get(&entity_id)
    }

    /// Rank of an entity at this frame.
    pub fn rank_of(&self, entity_id: EntityId) -> Option<u32> {
        self.standing(entity_id).and_then(|standing| standing.rank)
    }

    /// Position of an entity at this frame.
    pub fn position_of(&self, entity_id: EntityId) -> Option<&EntityPosition> {
        self.entities.iter().find(|position| position.entity_id == entity_id)
    }
}

fn serialize_ranks<S>(standings: &BTreeMap<EntityId, Standing>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(
        standings.iter().filter_map(|(id, standing)| standing.rank.map(|rank| (id, rank))),
    )
}
