use serde::{Deserialize, Serialize};

use envios_core::UserId;

use crate::Role;

/// A fully resolved principal for authorization decisions.
///
/// This is the only identity the services consume: the `(user_id, name,
/// role)` triple resolved from a verified token. Construction is decoupled
/// from storage and transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            display_name: display_name.into(),
            role,
        }
    }
}
