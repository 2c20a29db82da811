use thiserror::Error;

use maas_core::{ErrorKind, MaasError};

/// Failure modes of the auth/rate-limit policy builders (§7).
///
/// `ModelNotFound` is this codebase's single definition of what the spec's
/// two duplicated `ErrModelNotFound` declarations resolve to (§9, open
/// question): route resolution failing for a referenced Model is not an
/// error, it means "delete the emitted policy and continue" (§4.4 step 1,
/// §4.5 failure semantics).
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("model {0} has no resolvable route; emitted policy should be removed")]
    ModelNotFound(String),

    #[error("unsafe value interpolated into a CEL predicate: {0:?} contains '\"' or '\\\\'")]
    UnsafeSubject(String),

    #[error("cluster API call failed while building policy: {0}")]
    Transient(String),
}

impl PolicyError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotFound(_) => ErrorKind::NotFoundExpected,
            Self::UnsafeSubject(_) => ErrorKind::Validation,
            Self::Transient(_) => ErrorKind::Transient,
        }
    }
}

impl From<PolicyError> for MaasError {
    fn from(err: PolicyError) -> Self {
        MaasError::new(err.kind(), err.to_string())
    }
}

/// CEL-safety check (invariant 7): neither `"` nor `\` may appear in a
/// value interpolated into an emitted predicate. Checked up front so a
/// single bad subject aborts the whole reconciliation before any upsert
/// (§4.4 step 2, scenario 6).
pub fn check_cel_safe(value: &str) -> Result<(), PolicyError> {
    if value.contains('"') || value.contains('\\') {
        Err(PolicyError::UnsafeSubject(value.to_owned()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_quote_and_backslash() {
        assert!(check_cel_safe("foo\"bar").is_err());
        assert!(check_cel_safe("foo\\bar").is_err());
        assert!(check_cel_safe("foo-bar").is_ok());
    }
}
