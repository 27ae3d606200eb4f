//! Core types for session telemetry representation.
//!
//! ## Architecture
//!
//! - [`Timestamp`] is the millisecond key every stream is ordered and joined on
//! - [`EntityId`] is the canonical participant id, whatever form the provider used
//! - [`Sample`] / [`SampleStream`] hold normalized records of one stream
//! - [`Frame`] is one instant of the replay timeline, with [`EntityPosition`]s
//!   from the primary stream and as-of [`Standing`]s from auxiliary streams
//! - [`Gap`] models time and lapped gaps between cars
//! - [`UpdateRate`] controls playback subscription rates
//!
//! ## Usage Example
//!
//! ```rust
//! use trackside::types::{EntityId, Timestamp};
//! use serde_json::json;
//!
//! let id = EntityId::from_value(&json!("44")).unwrap();
//! assert_eq!(id, EntityId::new(44));
//!
//! let ts = Timestamp::from_value(&json!("2023-09-16T13:03:35.292000+00:00")).unwrap();
//! assert_eq!(ts.as_millis(), 1_694_869_415_292);
//! ```

mod entity;
mod frame;
mod sample;
mod standing;
mod timestamp;
mod update_rate;

// Re-export all public types
pub use entity::EntityId;
pub use frame::{EntityPosition, Frame};
pub use sample::{RawRecord, Sample, SampleStream};
pub use standing::{CarTelemetry, Gap, Standing, TimingStatus};
pub use timestamp::Timestamp;
pub use update_rate::UpdateRate;
