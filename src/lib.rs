//! Replay frames and live timing from irregular motorsport telemetry streams.
//!
//! Trackside turns the raw, independently sampled streams a timing provider
//! publishes for a session (car locations, race positions, laps, intervals)
//! into a single timeline of frames, and into a snapshot of the current
//! timing board.
//!
//! # Features
//!
//! - **Replay synthesis**: one frame per distinct location timestamp, with
//!   every auxiliary value joined as-of that instant
//! - **Live timing**: latest rank, lap and gap per ranked car
//! - **Profiles**: field names per stream, configurable through YAML
//! - **Playback**: scrubbing and paced, throttled frame streams
//!
//! # Quick Start
//!
//! ```rust
//! use trackside::{EntityId, RawStream, SessionProfile, StreamKind, synthesize_replay};
//! use serde_json::json;
//!
//! let location = RawStream::from_json(json!([
//!     {"date": 1000, "driver_number": 1, "x": 0, "y": 0},
//!     {"date": 2000, "driver_number": 1, "x": 1, "y": 1}
//! ]));
//! let position = RawStream::from_json(json!([
//!     {"date": 500, "driver_number": 1, "position": 2},
//!     {"date": 1500, "driver_number": 1, "position": 1}
//! ]));
//!
//! let replay = synthesize_replay(
//!     "9161",
//!     location,
//!     vec![(StreamKind::Position, position)],
//!     &SessionProfile::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(replay.duration_ms, 1000);
//! assert_eq!(replay.frames[0].rank_of(EntityId::new(1)), Some(2));
//! assert_eq!(replay.frames[1].rank_of(EntityId::new(1)), Some(1));
//! ```
//!
//! ## Example (session playback)
//!
//! ```rust,no_run
//! use trackside::{MemoryLoader, ReplayPlayer, SessionSynthesizer, UpdateRate};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let synthesizer = SessionSynthesizer::with_default_profile(MemoryLoader::new());
//!     let replay = Arc::new(synthesizer.try_replay("9161").await?);
//!
//!     let player = ReplayPlayer::start(replay, 4.0);
//!     let mut frames = player.subscribe(UpdateRate::Max(10));
//!     while let Some(frame) = frames.next().await {
//!         println!("{}: {} cars", frame.timestamp, frame.entities.len());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod profile;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Synthesis pipeline
pub mod aggregate;
pub mod asof;
pub mod assembler;
pub mod latest;
pub mod normalize;
pub mod replay;
pub mod timing;

// Loading and playback
pub mod loader;
pub mod playback;
pub mod session;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

pub use aggregate::{BoundingBox, session_duration};
pub use asof::{AsOfCursor, AuxiliaryStream, apply_auxiliary, resolve_as_of};
pub use assembler::assemble_frames;
pub use latest::latest_by_entity;
pub use normalize::{normalize_record, normalize_stream};
pub use profile::{SessionProfile, StreamKind, StreamProfile};
pub use replay::{Replay, ReplayResponse, synthesize_from_samples, synthesize_replay};
pub use timing::{
    TimingRow, compose_from_latest, compose_live_timing, compose_live_timing_with_race_control,
};

// Main API exports
pub use loader::{MemoryLoader, RawStream, StreamLoader};
pub use playback::{ReplayCursor, ReplayPlayer};
pub use session::SessionSynthesizer;
