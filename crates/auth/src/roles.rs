use core::str::FromStr;

use serde::{Deserialize, Serialize};

use envios_core::DomainError;

/// Role identifier used for RBAC.
///
/// The role set is closed: every account holds exactly one of these.
/// Wire names follow the public API (`admin`, `agente`, `repartidor`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control, user management, all exports.
    Admin,
    /// Create/edit/export shipments, no user management.
    Agente,
    /// Courier: reads shipments, advances delivery state, reports failures.
    Repartidor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Agente, Role::Repartidor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agente => "agente",
            Role::Repartidor => "repartidor",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| {
                DomainError::validation("rol", "must be one of: admin, agente, repartidor")
            })
    }
}
