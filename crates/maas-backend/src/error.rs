use thiserror::Error;

use maas_core::{ErrorKind, MaasError};

/// Failure modes of route resolution and backend handling (§4.1, §4.2, §7).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no route matches model {model} (backend {backend})")]
    RouteNotFound { model: String, backend: String },

    #[error("unknown backend kind: {0}")]
    UnknownKind(String),

    /// `ExternalModel::status()` returns this until real logic is
    /// supplied; the Model Controller must map it to
    /// `phase=Failed, reason=Unsupported` and never retry (§4.2, §4.3
    /// step 4).
    #[error("backend handler does not implement this operation: {0}")]
    Unsupported(String),

    #[error("cluster API call failed: {0}")]
    Transient(String),
}

impl BackendError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RouteNotFound { .. } => ErrorKind::NotFoundUnexpected,
            Self::UnknownKind(_) => ErrorKind::Fatal,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Transient(_) => ErrorKind::Transient,
        }
    }
}

impl From<BackendError> for MaasError {
    fn from(err: BackendError) -> Self {
        MaasError::new(err.kind(), err.to_string())
    }
}

impl From<maas_store::StoreError> for BackendError {
    fn from(err: maas_store::StoreError) -> Self {
        Self::Transient(err.to_string())
    }
}
