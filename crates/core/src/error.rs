//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// lifecycle rules, access, conflicts). Infrastructure concerns belong elsewhere.
/// Every variant is terminal for the request that triggered it; only
/// [`DomainError::Conflict`] is ever retried, and only by the shipment service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field failed validation (malformed or out-of-enum input).
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// A requested resource was not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Missing, expired or otherwise invalid credentials.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid identity, insufficient role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The lifecycle state machine does not allow this move.
    #[error("invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// The requested transition needs fields that were not supplied.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    /// A concurrent update won the race (stale state precondition).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Offending field, for errors that carry one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Require a non-blank string, returning it trimmed.
pub fn require_non_empty(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
