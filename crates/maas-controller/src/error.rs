use thiserror::Error;

use maas_backend::BackendError;
use maas_core::ErrorKind;
use maas_policy::PolicyError;
use maas_store::StoreError;

/// Composes every upstream error into one taxonomy so the queue's
/// retry/terminal decision (§4.3 step 4, §7) is a single match on
/// [`ErrorKind`].
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("unrecoverable controller error: {0}")]
    Fatal(String),
}

impl ControllerError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => match e {
                StoreError::NotFound(_) => ErrorKind::NotFoundUnexpected,
                StoreError::AlreadyExists(_) | StoreError::Conflict(_) | StoreError::Transient(_) => {
                    ErrorKind::Transient
                }
                StoreError::Unsupported(_) => ErrorKind::Unsupported,
            },
            Self::Backend(e) => e.kind(),
            Self::Policy(e) => e.kind(),
            Self::Fatal(_) => ErrorKind::Fatal,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
