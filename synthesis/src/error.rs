//! Error types for course synthesis.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for synthesis operations.
pub type Result<T> = std::result::Result<T, SynthesisError>;

/// Failure of a single generative backend call.
///
/// The engine never surfaces these for chunk calls: a failed chunk becomes an
/// error-sentinel result instead.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend not configured (missing API key etc.).
    #[error("generative backend not configured")]
    NotConfigured,

    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The call did not finish within the per-call timeout.
    #[error("backend call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response could not be parsed as JSON.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The JSON did not have the requested shape.
    #[error("schema violation: {0}")]
    SchemaViolation(String),
}

impl BackendError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout { .. })
    }

    /// Server-requested wait before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}

/// Errors that abort a synthesis run or a content generation call.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Unusable engine configuration.
    #[error("invalid synthesis configuration: {0}")]
    InvalidConfig(String),

    /// The caller cancelled the run.
    #[error("synthesis cancelled")]
    Cancelled,

    /// Unknown content kind name.
    #[error("unknown content kind: {0}")]
    UnknownContentKind(String),

    /// Backend failure surfaced by a single-call operation.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
