use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use envios_core::UserId;

use crate::{Principal, Role};

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims the service expects once a token has
/// been decoded/verified by whatever transport/security layer is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Login name at issuance.
    pub username: String,

    /// Display name at issuance (used to attribute history entries).
    pub name: String,

    /// The single role granted to the subject.
    pub role: Role,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn for_principal(principal: &Principal, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            sub: principal.user_id,
            username: principal.username.clone(),
            name: principal.display_name.clone(),
            role: principal.role,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.sub, self.username.clone(), self.name.clone(), self.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// happens in [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
