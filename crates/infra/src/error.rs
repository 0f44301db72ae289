use thiserror::Error;

use envios_auth::{AuthzError, PasswordError, TokenValidationError};
use envios_core::DomainError;

use crate::export::ExportError;
use crate::store::StoreError;

/// Error returned by the application services.
///
/// Domain errors pass through untouched; infrastructure failures keep their
/// typed source so the HTTP layer can answer 500 and still log the chain.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store failure: {0}")]
    Store(#[source] StoreError),

    #[error("export failure: {0}")]
    Export(#[from] ExportError),

    #[error("credential storage failed: {0}")]
    Password(#[from] PasswordError),

    #[error("token signing failed: {0}")]
    Token(#[from] TokenValidationError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => ServiceError::Domain(DomainError::not_found(what)),
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        ServiceError::Domain(value.into())
    }
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn store_outcomes_split_into_domain_and_infrastructure() {
        let err = ServiceError::from(StoreError::NotFound("shipment".into()));
        assert!(matches!(err.domain(), Some(DomainError::NotFound(_))));

        let err = ServiceError::from(StoreError::Conflict("stale".into()));
        assert!(matches!(err.domain(), Some(DomainError::Conflict(_))));

        let err = ServiceError::from(StoreError::Backend("connection reset".into()));
        assert!(err.domain().is_none());
        let source = err.source().expect("store source kept");
        assert_eq!(source.to_string(), "backend failure: connection reset");
    }

    #[test]
    fn password_and_token_failures_keep_their_source() {
        let err = ServiceError::from(PasswordError::Hash("bad salt".into()));
        assert!(matches!(err, ServiceError::Password(_)));
        assert!(err.source().is_some());

        let err = ServiceError::from(TokenValidationError::Malformed("key".into()));
        assert!(matches!(err, ServiceError::Token(_)));
        assert!(err.source().is_some());
    }
}
