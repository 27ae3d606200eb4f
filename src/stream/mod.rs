//! Stream combinators for playback subscriptions

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
