use envios_auth::Principal;

/// Authenticated identity for a request: the token's subject, re-read from
/// the account store.
///
/// Inserted by the auth middleware; every protected handler extracts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
