//! Error types for replay synthesis and live timing.
//!
//! Most data problems never surface as errors: a malformed record is dropped
//! by the normalizer and a missing as-of match simply leaves a field empty.
//! The variants here cover what callers must see.
//!
//! ## Error Categories
//!
//! - **Empty primary stream**: no frames could be assembled for a session
//! - **Stream unavailable**: a loader could not supply a stream
//! - **Profile errors**: stream profiles that cannot be parsed or are incomplete
//! - **File errors**: profile or session files that cannot be read
//! - **Task errors**: a background normalization task failed
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use trackside::SynthesisError;
//!
//! let error = SynthesisError::stream_unavailable("intervals", "upstream returned 429");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for synthesis operations.
pub type Result<T, E = SynthesisError> = std::result::Result<T, E>;

/// Main error type for synthesis operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SynthesisError {
    #[error("No usable frames for session {subject_key}: primary stream is empty")]
    EmptyPrimaryStream { subject_key: String },

    #[error("Stream '{stream}' unavailable: {reason}")]
    StreamUnavailable {
        stream: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid stream profile: {reason}")]
    Profile { reason: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {context}")]
    Task {
        context: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl SynthesisError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthesisError::StreamUnavailable { .. } => true,
            SynthesisError::Task { .. } => true,
            SynthesisError::EmptyPrimaryStream { .. } => false,
            SynthesisError::Parse { .. } => false,
            SynthesisError::Profile { .. } => false,
            SynthesisError::File { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SynthesisError::EmptyPrimaryStream { .. } => vec![
                "Check the session key refers to a session with position data",
                "Verify the primary stream profile names the right timestamp and entity fields",
                "Retry once the data provider has published the session",
            ],
            SynthesisError::StreamUnavailable { .. } => vec![
                "Retry after the provider's rate-limit window",
                "Check network connectivity to the data provider",
                "Continue with the stream treated as empty",
            ],
            SynthesisError::Parse { .. } => vec![
                "Check the profile is valid YAML",
                "Compare field names against the documented profile keys",
            ],
            SynthesisError::Profile { .. } => vec![
                "Give every stream a non-empty timestamp and entity field",
                "Remove keys that override defaults with empty strings",
            ],
            SynthesisError::File { .. } => vec![
                "Check the file exists and is readable",
                "Check file permissions",
            ],
            SynthesisError::Task { .. } => vec![
                "Retry the synthesis",
                "Check the runtime is not shutting down",
            ],
        }
    }

    /// Helper constructor for the empty primary stream failure.
    pub fn empty_primary(subject_key: impl Into<String>) -> Self {
        SynthesisError::EmptyPrimaryStream { subject_key: subject_key.into() }
    }

    /// Helper constructor for unavailable streams.
    pub fn stream_unavailable(stream: impl Into<String>, reason: impl Into<String>) -> Self {
        SynthesisError::StreamUnavailable { stream: stream.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for unavailable streams with source.
    pub fn stream_unavailable_with_source(
        stream: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        SynthesisError::StreamUnavailable {
            stream: stream.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        SynthesisError::File { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        SynthesisError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for failed background tasks.
    pub fn task(context: impl Into<String>, source: tokio::task::JoinError) -> Self {
        SynthesisError::Task { context: context.into(), source }
    }

    /// Helper constructor for profile validation errors.
    pub fn invalid_profile(reason: impl Into<String>) -> Self {
        SynthesisError::Profile { reason: reason.into() }
    }
}

impl From<serde_yaml_ng::Error> for SynthesisError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        SynthesisError::Parse { context: "Stream profile YAML".to_string(), details: err.to_string() }
    }
}
