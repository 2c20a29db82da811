//! Errors for the Selector client.

use thiserror::Error;

/// Errors that can occur when calling the Subscription Selector service.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection error (network failure, DNS resolution, etc.).
    #[error("connection error: {0}")]
    Connection(String),

    /// HTTP error with a non-200 status. The selector's own error taxonomy
    /// (§6) is always carried in a 200 body, so a non-200 here means
    /// something outside the selector's contract failed (a proxy, TLS
    /// termination, etc).
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// One of the selector's own error codes (§6): `bad_request`,
    /// `not_found`, `access_denied`, `multiple_subscriptions`,
    /// `internal_error`.
    #[error("selector error [{code}]: {message}")]
    Selector { code: String, message: String },

    /// Response deserialization error.
    #[error("failed to deserialize response: {0}")]
    Deserialization(String),

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Returns `true` if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Selector { code, .. } => code == "internal_error",
            Self::Deserialization(_) | Self::Configuration(_) => false,
        }
    }

    /// The selector error code, if this is a [`Error::Selector`].
    #[must_use]
    pub fn selector_code(&self) -> Option<&str> {
        match self {
            Self::Selector { code, .. } => Some(code),
            _ => None,
        }
    }
}
