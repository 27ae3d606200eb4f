//! Stream loader trait and raw stream container

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::profile::StreamKind;
use crate::types::RawRecord;
use crate::{Result, SynthesisError};

/// Raw records of one stream as handed over by a loader.
///
/// `Unavailable` is the explicit marker a loader uses when it could not get
/// the stream; synthesis treats it as an empty stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RawStream {
    Available(Vec<RawRecord>),
    Unavailable { reason: String },
}

impl RawStream {
    /// Marker for a stream that could not be loaded.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        RawStream::Unavailable { reason: reason.into() }
    }

    /// Records of the stream (empty when unavailable).
    pub fn records(&self) -> &[RawRecord] {
        match self {
            RawStream::Available(records) => records,
            RawStream::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, RawStream::Available(_))
    }

    /// Interpret a provider response body.
    ///
    /// An array becomes an available stream (non-object entries are skipped);
    /// an object with an `error` key becomes an unavailable marker carrying
    /// that message. Anything else is unavailable.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => RawStream::Available(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(record) => Some(record),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Object(body) => match body.get("error") {
                Some(Value::String(message)) => RawStream::unavailable(message.clone()),
                Some(other) => RawStream::unavailable(other.to_string()),
                None => RawStream::unavailable("response is an object, expected a list of records"),
            },
            other => RawStream::unavailable(format!("unexpected response: {}", other)),
        }
    }
}

impl From<Vec<RawRecord>> for RawStream {
    fn from(records: Vec<RawRecord>) -> Self {
        RawStream::Available(records)
    }
}

/// Source of raw session streams.
///
/// Network access, pagination, rate-limit backoff and their configuration
/// all live behind this trait; synthesis only ever sees materialized records.
///
/// Returns:
/// - `Ok(RawStream::Available(..))` - records loaded
/// - `Ok(RawStream::Unavailable { .. })` - loader knows the stream is missing
/// - `Err(e)` - loading failed
#[async_trait::async_trait]
pub trait StreamLoader: Send + Sync + 'static {
    async fn load(&self, subject_key: &str, kind: StreamKind) -> Result<RawStream>;
}

#[async_trait::async_trait]
impl<L: StreamLoader> StreamLoader for Arc<L> {
    async fn load(&self, subject_key: &str, kind: StreamKind) -> Result<RawStream> {
        self.as_ref().load(subject_key, kind).await
    }
}

/// Loader over streams already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    streams: HashMap<(String, StreamKind), RawStream>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream for a session.
    pub fn with_stream(
        mut self,
        subject_key: impl Into<String>,
        kind: StreamKind,
        stream: impl Into<RawStream>,
    ) -> Self {
        self.insert(subject_key, kind, stream);
        self
    }

    /// Loader over a directory holding one session's saved provider responses.
    ///
    /// Each stream is read from `<dir>/<stream name>.json`; a missing file
    /// leaves that stream unregistered. Fails if `dir` is not a directory or
    /// a present file cannot be read or parsed.
    pub fn from_session_dir(subject_key: &str, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SynthesisError::file_error(
                dir.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "session directory not found"),
            ));
        }

        let mut loader = Self::new();
        for kind in StreamKind::ALL {
            let path = dir.join(format!("{}.json", kind.name()));
            if !path.is_file() {
                continue;
            }

            let text = std::fs::read_to_string(&path)
                .map_err(|source| SynthesisError::file_error(path.clone(), source))?;
            let value: Value = serde_json::from_str(&text)
                .map_err(|err| SynthesisError::parse_error(path.display().to_string(), err.to_string()))?;

            debug!(subject_key, stream = %kind, path = %path.display(), "Registered saved stream");
            loader.insert(subject_key, kind, RawStream::from_json(value));
        }
        Ok(loader)
    }

    /// Register a stream for a session.
    pub fn insert(
        &mut self,
        subject_key: impl Into<String>,
        kind: StreamKind,
        stream: impl Into<RawStream>,
    ) {
        self.streams.insert((subject_key.into(), kind), stream.into());
    }
}

#[async_trait::async_trait]
impl StreamLoader for MemoryLoader {
    async fn load(&self, subject_key: &str, kind: StreamKind) -> Result<RawStream> {
        self.streams.get(&(subject_key.to_string(), kind)).cloned().ok_or_else(|| {
            SynthesisError::stream_unavailable(
                kind.name(),
                format!("no {} stream registered for session {}", kind, subject_key),
            )
        })
    }
}
