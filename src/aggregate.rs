//! Session-wide aggregates over assembled frames

use serde::{Deserialize, Serialize};

use crate::types::Frame;

/// Axis-aligned extent of every observed position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct BoundingBox {
    #[serde(rename = "minX")]
    pub min_x: f64,
    #[serde(rename = "maxX")]
    pub max_x: f64,
    #[serde(rename = "minY")]
    pub min_y: f64,
    #[serde(rename = "maxY")]
    pub max_y: f64,
}

impl BoundingBox {
    /// Degenerate box around a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self { min_x: x, max_x: x, min_y: y, max_y: y }
    }

    /// Bounds of every position carrying both coordinates.
    ///
    /// `None` when no frame has a complete coordinate pair. Frames without
    /// entities are skipped.
    pub fn from_frames(frames: &[Frame]) -> Option<Self> {
        frames
            .iter()
            .flat_map(|frame| frame.entities.iter())
            .filter_map(|position| position.coordinates())
            .fold(None, |bounds: Option<Self>, (x, y)| match bounds {
                None => Some(Self::point(x, y)),
                Some(bounds) => Some(bounds.extend(x, y)),
            })
    }

    /// Grow the box to include `(x, y)`.
    pub fn extend(self, x: f64, y: f64) -> Self {
        Self {
            min_x: self.min_x.min(x),
            max_x: self.max_x.max(x),
            min_y: self.min_y.min(y),
            max_y: self.max_y.max(y),
        }
    }

    /// Whether `(x, y)` lies inside the box, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Milliseconds between the first and last frame; 0 with fewer than two.
pub fn session_duration(frames: &[Frame]) -> i64 {
    match (frames.first(), frames.last()) {
        (Some(first), Some(last)) => last.timestamp.millis_since(first.timestamp),
        _ => 0,
    }
}
