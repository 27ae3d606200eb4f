//! Replay scrubbing and paced playback.
//!
//! [`ReplayCursor`] gives random access to the frame valid at any instant.
//! [`ReplayPlayer`] walks a replay in (scaled) real time on a background
//! task and publishes each frame through a watch channel, so any number of
//! subscribers can follow along at their own rate.

use futures::{Stream, StreamExt};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::replay::Replay;
use crate::stream::ThrottleExt;
use crate::types::{Frame, Timestamp, UpdateRate};

/// Slowest and fastest supported playback speed.
pub const SPEED_RANGE: (f64, f64) = (0.1, 10.0);

/// Random-access position within a replay.
#[derive(Debug, Clone)]
pub struct ReplayCursor {
    replay: Arc<Replay>,
    position: usize,
}

impl ReplayCursor {
    pub fn new(replay: Arc<Replay>) -> Self {
        Self { replay, position: 0 }
    }

    /// Last frame at or before `t`; `None` before the first frame.
    pub fn frame_at(&self, t: Timestamp) -> Option<&Frame> {
        let index = self.replay.frames.partition_point(|frame| frame.timestamp <= t);
        index.checked_sub(1).map(|index| &self.replay.frames[index])
    }

    /// Move so the next frame returned is the one valid at `t` (or the first
    /// frame, when `t` precedes the replay).
    pub fn seek(&mut self, t: Timestamp) -> Option<&Frame> {
        let index = self.replay.frames.partition_point(|frame| frame.timestamp <= t);
        self.position = index.saturating_sub(1);
        trace!(target_ms = t.as_millis(), position = self.position, "Seek");
        self.replay.frames.get(self.position)
    }

    /// Frame at the current position, advancing past it.
    pub fn next_frame(&mut self) -> Option<&Frame> {
        let frame = self.replay.frames.get(self.position)?;
        self.position += 1;
        Some(frame)
    }

    /// Frames with `start <= t < end`.
    pub fn window(&self, start: Timestamp, end: Timestamp) -> &[Frame] {
        &self.replay.frames[self.window_range(start, end)]
    }

    fn window_range(&self, start: Timestamp, end: Timestamp) -> Range<usize> {
        let frames = &self.replay.frames;
        let lo = frames.partition_point(|frame| frame.timestamp < start);
        let hi = frames.partition_point(|frame| frame.timestamp < end);
        lo..hi.max(lo)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.replay.frames.len()
    }

    pub fn replay(&self) -> &Arc<Replay> {
        &self.replay
    }
}

/// Plays a replay back on a background task.
///
/// Frames are published with the gap between consecutive frame timestamps,
/// divided by the playback speed. Dropping the player stops the task.
pub struct ReplayPlayer {
    /// Frame watch receiver
    frames: watch::Receiver<Option<Arc<Frame>>>,

    /// Effective playback speed
    speed: f64,

    /// Publishing rate of the replay at this speed
    source_hz: f64,

    /// Cancellation token for stopping the pacing task
    cancel: CancellationToken,
}

impl ReplayPlayer {
    /// Start playback from the first frame.
    ///
    /// Must be called within a tokio runtime. `speed` is clamped to
    /// [`SPEED_RANGE`]; non-finite speeds play at 1x.
    pub fn start(replay: Arc<Replay>, speed: f64) -> Self {
        let cursor = ReplayCursor::new(replay);
        Self::spawn(cursor, speed)
    }

    /// Start playback from the frame valid at `from`.
    pub fn start_from(replay: Arc<Replay>, speed: f64, from: Timestamp) -> Self {
        let mut cursor = ReplayCursor::new(replay);
        cursor.seek(from);
        Self::spawn(cursor, speed)
    }

    fn spawn(cursor: ReplayCursor, speed: f64) -> Self {
        let speed = clamp_speed(speed);
        let source_hz = cursor.replay().frame_rate_hz() * speed;

        let (frame_tx, frame_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        info!(
            subject_key = %cursor.replay().subject_key,
            frames = cursor.replay().frames.len(),
            speed,
            "Starting replay playback"
        );
        tokio::spawn(async move {
            Self::pacing_task(cursor, speed, frame_tx, cancel_task).await;
        });

        Self { frames: frame_rx, speed, source_hz, cancel }
    }

    async fn pacing_task(
        mut cursor: ReplayCursor,
        speed: f64,
        frame_tx: watch::Sender<Option<Arc<Frame>>>,
        cancel: CancellationToken,
    ) {
        let mut previous: Option<Timestamp> = None;
        let mut published = 0usize;

        while let Some(frame) = cursor.next_frame().cloned() {
            if let Some(previous) = previous {
                let delta_ms = frame.timestamp.millis_since(previous).max(0) as f64;
                let wait = Duration::from_secs_f64(delta_ms / 1000.0 / speed);

                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(published, "Playback cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(wait) => {}
                }
            } else if cancel.is_cancelled() {
                return;
            }

            previous = Some(frame.timestamp);
            if frame_tx.send(Some(Arc::new(frame))).is_err() {
                debug!(published, "All frame receivers dropped, stopping playback");
                return;
            }
            published += 1;
        }

        info!(published, "Replay playback finished");
    }

    /// Subscribe to published frames.
    ///
    /// The stream ends when playback finishes or the player is dropped. A
    /// slow subscriber sees the most recent frame, not a backlog.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Arc<Frame>> + 'static {
        let frames = WatchStream::new(self.frames.clone()).filter_map(|frame| async move { frame });

        match rate.throttle_interval(self.source_hz) {
            None => frames.boxed(),
            Some(interval) => frames.throttle(interval).boxed(),
        }
    }

    /// Most recently published frame.
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        self.frames.borrow().clone()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Frames per second published at this speed.
    pub fn source_hz(&self) -> f64 {
        self.source_hz
    }

    /// Stop playback; subscriptions end.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReplayPlayer {
    fn drop(&mut self) {
        debug!("Dropping replay player");
        self.cancel.cancel();
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() { speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1) } else { 1.0 }
}
