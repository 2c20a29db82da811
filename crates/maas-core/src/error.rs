//! The five-way error taxonomy shared by every crate in the workspace
//! (§7, "Kinds"). Each crate defines its own `thiserror` enum for its own
//! failure modes but every variant maps onto one of these kinds via
//! [`MaasError::kind`], so the controller's retry/terminal decision is a
//! single match on [`ErrorKind`].

use thiserror::Error;

/// The taxonomy named in §7: not a type, a classification every concrete
/// error maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User input breaks an invariant. Surfaced on the owning object's
    /// status; not retried until the user edits the object.
    Validation,
    /// A referenced object is absent and that absence was expected
    /// (triggers cleanup and quiet continuation).
    NotFoundExpected,
    /// A referenced object is absent and that absence was unexpected
    /// (retried).
    NotFoundUnexpected,
    /// API timeouts, optimistic-concurrency conflicts, RBAC blips.
    /// Retried with exponential backoff.
    Transient,
    /// A handler explicitly rejects the operation. Terminal: no retry.
    Unsupported,
    /// Unrecoverable programmer error. Logged; that reconcile terminates;
    /// the queue proceeds.
    Fatal,
}

impl ErrorKind {
    /// Whether the work queue should requeue a key that failed with this
    /// kind of error (§5, §7).
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::NotFoundUnexpected)
    }
}

/// A generic error carrying a [`ErrorKind`] and a user-safe message.
///
/// Used at crate boundaries where a caller only needs the kind to decide
/// whether to retry, without depending on every downstream crate's
/// specific error enum.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct MaasError {
    pub kind: ErrorKind,
    pub message: String,
}

impl MaasError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}
