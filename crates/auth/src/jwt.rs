//! HS256 bearer-token codec.
//!
//! Signature checks are delegated to `jsonwebtoken`; the time window is checked
//! by [`validate_claims`] so that expiry uses the caller's clock.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Signs claims into a bearer token.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenValidationError>;
}

pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry lives in `expires_at`, not the registered `exp` claim.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

pub struct Hs256TokenIssuer {
    key: EncodingKey,
}

impl Hs256TokenIssuer {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            key: EncodingKey::from_secret(&secret),
        }
    }
}

impl TokenIssuer for Hs256TokenIssuer {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenValidationError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Principal, Role};
    use chrono::Duration;
    use envios_core::UserId;

    fn claims(now: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        let p = Principal::new(UserId::new(), "agente1", "Agente Uno", Role::Agente);
        JwtClaims::for_principal(&p, now, ttl)
    }

    #[test]
    fn issued_tokens_validate_with_same_secret() {
        let now = Utc::now();
        let issuer = Hs256TokenIssuer::new(b"secret".to_vec());
        let validator = Hs256JwtValidator::new(b"secret".to_vec());

        let c = claims(now, Duration::minutes(30));
        let token = issuer.issue(&c).unwrap();
        assert_eq!(validator.validate(&token, now).unwrap(), c);
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let now = Utc::now();
        let token = Hs256TokenIssuer::new(b"one".to_vec())
            .issue(&claims(now, Duration::minutes(30)))
            .unwrap();
        let err = Hs256JwtValidator::new(b"two".to_vec())
            .validate(&token, now)
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn expiry_uses_callers_clock() {
        let now = Utc::now();
        let issuer = Hs256TokenIssuer::new(b"secret".to_vec());
        let token = issuer.issue(&claims(now, Duration::minutes(1))).unwrap();

        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let err = validator.validate(&token, now + Duration::minutes(2)).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = Hs256JwtValidator::new(b"secret".to_vec())
            .validate("not.a.token", Utc::now())
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }
}
