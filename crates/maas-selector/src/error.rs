//! Selector error taxonomy (§4.6, §7): every variant maps directly to one
//! of the wire `error` codes in §6 — there is no retry/terminal split here
//! since the Selector runs as a stateless request handler, not a
//! reconcile loop.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("{0}")]
    BadRequest(String),

    #[error("subscription {0:?} not found")]
    SubscriptionNotFound(String),

    #[error("no subscription owned by the caller")]
    NoSubscription,

    #[error("caller does not own subscription {0:?}")]
    AccessDenied(String),

    #[error("multiple candidate subscriptions: {0:?}")]
    MultipleSubscriptions(Vec<String>),

    #[error("{0}")]
    Internal(String),
}

impl SelectorError {
    /// The wire `error` code from §6's response shape.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::SubscriptionNotFound(_) | Self::NoSubscription => "not_found",
            Self::AccessDenied(_) => "access_denied",
            Self::MultipleSubscriptions(_) => "multiple_subscriptions",
            Self::Internal(_) => "internal_error",
        }
    }
}
