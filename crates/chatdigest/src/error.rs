//! Error types for the backend, transport, and configuration seams.
//!
//! Only [`BackendError`] is ever recovered locally: the
//! [`Summarizer`](crate::summarizer::Summarizer) converts it into the
//! configured fallback text. Everything else propagates to the caller.

use std::path::PathBuf;
use std::time::Duration;

/// Failure from the generative-text backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The call did not complete within the configured deadline.
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),
    /// The request never produced an HTTP response (DNS, connect, reset).
    #[error("request failed: {0}")]
    Request(String),
    /// The backend answered with a non-success status.
    #[error("backend HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The backend answered 2xx but embedded an error object.
    #[error("backend API error: {0}")]
    Api(String),
    /// The response body could not be parsed.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The response parsed but carried no usable text.
    #[error("empty response")]
    Empty,
}

impl BackendError {
    /// Short, stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Timeout(_) => "timeout",
            BackendError::Request(_) => "request",
            BackendError::Http { .. } => "http",
            BackendError::Api(_) => "api",
            BackendError::Malformed(_) => "malformed",
            BackendError::Empty => "empty",
        }
    }

    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// 429 and 5xx responses, network failures, and timeouts are transient.
    /// 4xx responses other than 429 are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout(_) | BackendError::Request(_) => true,
            BackendError::Http { status, .. } => *status == 429 || *status >= 500,
            BackendError::Api(_) | BackendError::Malformed(_) | BackendError::Empty => false,
        }
    }
}

/// Failure delivering a reply through the chat transport.
///
/// Surfaced to the dispatcher, which logs it. Never retried by the core.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(String),
    #[error("transport API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("malformed transport response: {0}")]
    Malformed(String),
}

/// Failure loading or validating [`DigestConfig`](crate::config::DigestConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
