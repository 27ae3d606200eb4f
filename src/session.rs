//! Session orchestration over a [`StreamLoader`].
//!
//! Streams are loaded concurrently and each one is normalized on its own
//! blocking task as soon as it arrives, before the synchronous core runs. A failed auxiliary load
//! degrades to an unavailable stream; a failed primary load ends up as the
//! empty-primary failure.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::asof::AuxiliaryStream;
use crate::loader::{RawStream, StreamLoader};
use crate::normalize::normalize_stream;
use crate::profile::{SessionProfile, StreamKind};
use crate::replay::{Replay, ReplayResponse, synthesize_from_samples};
use crate::timing::{TimingRow, compose_live_timing_with_race_control};
use crate::types::SampleStream;
use crate::{Result, SynthesisError};

/// Builds replays and timing boards for sessions served by a loader.
pub struct SessionSynthesizer<L> {
    loader: Arc<L>,
    profile: Arc<SessionProfile>,
}

impl<L> Clone for SessionSynthesizer<L> {
    fn clone(&self) -> Self {
        Self { loader: Arc::clone(&self.loader), profile: Arc::clone(&self.profile) }
    }
}

impl<L: StreamLoader> SessionSynthesizer<L> {
    /// Create a synthesizer; the profile is validated up front.
    pub fn new(loader: L, profile: SessionProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { loader: Arc::new(loader), profile: Arc::new(profile) })
    }

    /// Synthesizer with the default (OpenF1) profile.
    pub fn with_default_profile(loader: L) -> Self {
        Self { loader: Arc::new(loader), profile: Arc::new(SessionProfile::default()) }
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Replay for a session in its wire form. Never fails; failures become
    /// the `{subject_key, error}` response.
    pub async fn replay(&self, subject_key: &str) -> ReplayResponse {
        ReplayResponse::from_result(subject_key, self.try_replay(subject_key).await)
    }

    /// Replay for a session.
    pub async fn try_replay(&self, subject_key: &str) -> Result<Replay> {
        let primary = self.load_normalized(subject_key, StreamKind::Location);
        let auxiliary = futures::future::try_join_all(StreamKind::AUXILIARY.into_iter().map(|kind| async move {
            let stream = self.load_normalized(subject_key, kind).await?;
            Ok::<_, SynthesisError>(AuxiliaryStream::new(kind, stream))
        }));
        let (primary, auxiliary) = futures::try_join!(primary, auxiliary)?;

        let key = subject_key.to_string();
        let profile = Arc::clone(&self.profile);
        tokio::task::spawn_blocking(move || synthesize_from_samples(&key, &primary, &auxiliary, &profile))
            .await
            .map_err(|source| SynthesisError::task(format!("synthesizing replay for {}", subject_key), source))?
    }

    /// Current timing board for a session.
    pub async fn live_timing(&self, subject_key: &str) -> Result<Vec<TimingRow>> {
        let (position, laps, intervals, race_control) = futures::try_join!(
            self.load_normalized(subject_key, StreamKind::Position),
            self.load_normalized(subject_key, StreamKind::Laps),
            self.load_normalized(subject_key, StreamKind::Intervals),
            self.load_normalized(subject_key, StreamKind::RaceControl),
        )?;

        let rows =
            compose_live_timing_with_race_control(&position, &laps, &intervals, &race_control, &self.profile);
        info!(subject_key, rows = rows.len(), "Live timing ready");
        Ok(rows)
    }

    /// Load one stream, turning a loader error into an unavailable marker.
    async fn load(&self, subject_key: &str, kind: StreamKind) -> RawStream {
        match self.loader.load(subject_key, kind).await {
            Ok(stream) => {
                debug!(subject_key, stream = %kind, records = stream.records().len(), "Loaded stream");
                stream
            }
            Err(error) => {
                warn!(subject_key, stream = %kind, %error, retryable = error.is_retryable(), "Stream load failed");
                RawStream::unavailable(error.to_string())
            }
        }
    }

    async fn load_normalized(&self, subject_key: &str, kind: StreamKind) -> Result<SampleStream> {
        let raw = self.load(subject_key, kind).await;
        self.normalize(kind, raw).await
    }

    async fn normalize(&self, kind: StreamKind, raw: RawStream) -> Result<SampleStream> {
        let profile = Arc::clone(&self.profile);
        tokio::task::spawn_blocking(move || normalize_stream(kind.name(), raw, profile.fields_for(kind)))
            .await
            .map_err(|source| SynthesisError::task(format!("normalizing {} stream", kind), source))
    }
}
