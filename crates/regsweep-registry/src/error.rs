//! Error types for registry operations.

use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to connect to the registry.
    #[error("failed to connect to registry at {url}: {source}")]
    ConnectionFailed {
        /// Request URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Request URL.
        url: String,
    },

    /// Registry rate-limited the request (429).
    #[error("registry rate-limited request to {url}")]
    RateLimited {
        /// Request URL.
        url: String,
    },

    /// Registry-side failure (5xx or 408).
    #[error("registry error for {resource}: {status} - {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Affected resource (e.g., "app:v1").
        resource: String,
        /// Error body, if any.
        message: String,
    },

    /// Credentials missing or rejected (401/403).
    #[error("authentication failed for {resource}")]
    Unauthorized {
        /// Affected resource.
        resource: String,
    },

    /// Resource not found (404). Tolerated by callers: a vanished
    /// repository or tag is skipped, a vanished digest counts as deleted.
    #[error("not found: {resource}")]
    NotFound {
        /// Affected resource.
        resource: String,
    },

    /// Manifest media type the client does not understand.
    #[error("unsupported manifest media type: {media_type}")]
    UnsupportedMediaType {
        /// The media type returned by the registry.
        media_type: String,
    },

    /// Manifest response without a `Docker-Content-Digest` header.
    #[error("manifest response for {resource} carries no content digest")]
    MissingDigestHeader {
        /// Affected resource.
        resource: String,
    },

    /// No creation timestamp derivable for a tag.
    #[error("no creation timestamp found for {resource}")]
    MissingCreated {
        /// Affected resource.
        resource: String,
    },

    /// Creation timestamp that does not parse as RFC 3339.
    #[error("invalid creation timestamp: {value}")]
    InvalidTimestamp {
        /// The offending value.
        value: String,
    },

    /// Any other non-success HTTP response.
    #[error("unexpected registry response: {status} - {message}")]
    Http {
        /// HTTP status code (0 when no response was received).
        status: u16,
        /// Error body or transport message.
        message: String,
    },

    /// JSON decoding failure.
    #[error("JSON error: {source}")]
    Json {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid registry URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },
}

impl RegistryError {
    /// Classifies a reqwest transport failure for the given URL.
    #[must_use]
    pub fn from_request(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_connect() {
            Self::ConnectionFailed {
                url: url.to_string(),
                source: err,
            }
        } else {
            Self::Http {
                status: 0,
                message: err.to_string(),
            }
        }
    }

    /// Returns true if retrying the request may succeed (transient
    /// transport failures, timeouts, rate limits, server-side errors).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::RateLimited { .. }
                | Self::Server { .. }
        )
    }

    /// Returns true for a 404 response.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json { source: err }
    }
}
