//! User accounts.
//!
//! Accounts are created by an admin and are only ever mutated by
//! deactivation. They are never hard-deleted, so every `usuario_id` recorded
//! in a shipment history stays resolvable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envios_core::{require_non_empty, DomainError, DomainResult, Entity, UserId};

use crate::{Principal, Role};

pub const MIN_PASSWORD_LEN: usize = 4;

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(rename = "nombre")]
    pub display_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
    pub password_hash: String,
    #[serde(rename = "activo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.username.clone(), self.display_name.clone(), self.role)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Input for creating a user (plain-text password, not yet hashed).
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(rename = "nombre")]
    pub display_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
}

impl NewUser {
    /// Validate and normalize the input. Usernames are trimmed and may not
    /// contain whitespace.
    pub fn validated(self) -> DomainResult<Self> {
        let username = require_non_empty("username", &self.username)?;
        if username.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("username", "must not contain spaces"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        let display_name = require_non_empty("nombre", &self.display_name)?;

        Ok(Self {
            username,
            password: self.password,
            display_name,
            role: self.role,
        })
    }

    /// Build the stored record from a validated input and an already-computed hash.
    pub fn into_user(self, password_hash: String, created_at: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            username: self.username,
            display_name: self.display_name,
            role: self.role,
            password_hash,
            active: true,
            created_at,
        }
    }
}
