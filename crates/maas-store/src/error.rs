use thiserror::Error;

use maas_core::{ErrorKind, MaasError};

/// Errors from the cluster API contract (§7 `NotFound`/`Transient` kinds).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("optimistic concurrency conflict updating {0}: retry with the latest version")]
    Conflict(String),

    #[error("cluster API call failed: {0}")]
    Transient(String),

    #[error("operation not supported by this store backend: {0}")]
    Unsupported(String),
}

impl From<StoreError> for MaasError {
    fn from(err: StoreError) -> Self {
        let kind = match err {
            StoreError::NotFound(_) => ErrorKind::NotFoundUnexpected,
            StoreError::AlreadyExists(_) | StoreError::Conflict(_) | StoreError::Transient(_) => {
                ErrorKind::Transient
            }
            StoreError::Unsupported(_) => ErrorKind::Unsupported,
        };
        MaasError::new(kind, err.to_string())
    }
}
