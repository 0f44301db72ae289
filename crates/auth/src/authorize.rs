use thiserror::Error;

use envios_core::DomainError;

use crate::{Operation, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: '{operation}' requires one of [{}], principal has '{role}'", join_roles(.accepted))]
    Forbidden {
        operation: Operation,
        role: Role,
        accepted: Vec<Role>,
    },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::forbidden(value.to_string())
    }
}

/// Authorize a principal for an operation.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check against the static role table)
pub fn authorize(principal: &Principal, operation: Operation) -> Result<(), AuthzError> {
    let accepted = operation.accepted_roles();
    if accepted.contains(&principal.role) {
        return Ok(());
    }

    tracing::debug!(
        user_id = %principal.user_id,
        role = %principal.role,
        operation = %operation,
        "authorization denied"
    );

    Err(AuthzError::Forbidden {
        operation,
        role: principal.role,
        accepted: accepted.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use envios_core::UserId;

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(), "someone", "Someone", role)
    }

    #[test]
    fn admin_is_permitted_everywhere() {
        let admin = principal(Role::Admin);
        for op in [
            Operation::CreateShipment,
            Operation::DeleteShipment,
            Operation::ChangeShipmentState,
            Operation::ExportShipments,
            Operation::ListAllMessages,
            Operation::CreateUser,
            Operation::DeactivateUser,
        ] {
            assert!(authorize(&admin, op).is_ok(), "admin denied {op}");
        }
    }

    #[test]
    fn agent_cannot_manage_users() {
        let err = authorize(&principal(Role::Agente), Operation::CreateUser).unwrap_err();
        let AuthzError::Forbidden { accepted, role, .. } = &err;
        assert_eq!(accepted, &vec![Role::Admin]);
        assert_eq!(*role, Role::Agente);
        assert!(err.to_string().contains("[admin]"));
    }

    #[test]
    fn courier_denial_names_accepted_roles() {
        let err = authorize(&principal(Role::Repartidor), Operation::CreateShipment).unwrap_err();
        assert!(err.to_string().contains("admin, agente"));

        let domain: DomainError = err.into();
        assert!(matches!(domain, DomainError::Forbidden(_)));
    }

    #[test]
    fn reads_are_open_to_every_role() {
        for role in Role::ALL {
            assert!(authorize(&principal(role), Operation::ReadShipments).is_ok());
            assert!(authorize(&principal(role), Operation::ReadShipmentMessages).is_ok());
        }
    }
}
