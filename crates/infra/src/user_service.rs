//! Accounts and sessions.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use envios_auth::{
    authorize, hash_password, verify_password, JwtClaims, NewUser, Operation, Principal, Role, TokenIssuer, User,
};
use envios_core::{DomainError, UserId};

use crate::error::ServiceError;
use crate::store::{StoreError, UserStore};

const BAD_CREDENTIALS: &str = "invalid username or password";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    issuer: Arc<dyn TokenIssuer>,
    token_ttl: chrono::Duration,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, issuer: Arc<dyn TokenIssuer>, token_ttl: chrono::Duration) -> Self {
        Self {
            users,
            issuer,
            token_ttl,
        }
    }

    /// Exchange credentials for a bearer token. Unknown users, wrong passwords
    /// and deactivated accounts are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        let user = match self.users.find_by_username(username.trim()).await? {
            Some(user) if user.active && verify_password(password, &user.password_hash) => user,
            _ => {
                warn!(username = %username.trim(), "login rejected");
                return Err(DomainError::unauthenticated(BAD_CREDENTIALS).into());
            }
        };

        let claims = JwtClaims::for_principal(&user.principal(), Utc::now(), self.token_ttl);
        let token = self.issuer.issue(&claims)?;

        info!(user_id = %user.id, username = %user.username, "login succeeded");
        Ok(Session { token, user })
    }

    /// Current account behind a verified principal.
    pub async fn me(&self, principal: &Principal) -> Result<User, ServiceError> {
        match self.users.get(principal.user_id).await? {
            Some(user) if user.active => Ok(user),
            _ => Err(DomainError::unauthenticated("account is not active").into()),
        }
    }

    /// Re-check a token's principal against the account store. Unknown and
    /// deactivated accounts are rejected; role and name come from the stored
    /// account, not from the token.
    pub async fn resolve(&self, claimed: &Principal) -> Result<Principal, ServiceError> {
        Ok(self.me(claimed).await?.principal())
    }

    pub async fn create(&self, input: NewUser, actor: &Principal) -> Result<User, ServiceError> {
        authorize(actor, Operation::CreateUser)?;
        let user = self.insert_new(input).await?;
        info!(user_id = %user.id, username = %user.username, rol = %user.role, actor = %actor.username, "user created");
        Ok(user)
    }

    pub async fn list_active(&self, actor: &Principal) -> Result<Vec<User>, ServiceError> {
        authorize(actor, Operation::ListUsers)?;
        Ok(self.users.list_active().await?)
    }

    /// Soft delete. Admins cannot deactivate themselves.
    pub async fn deactivate(&self, id: UserId, actor: &Principal) -> Result<(), ServiceError> {
        authorize(actor, Operation::DeactivateUser)?;

        if id == actor.user_id {
            return Err(DomainError::validation("id", "cannot deactivate your own account").into());
        }
        if !self.users.deactivate(id).await? {
            return Err(DomainError::not_found(format!("user {id}")).into());
        }
        info!(user_id = %id, actor = %actor.username, "user deactivated");
        Ok(())
    }

    /// Create the configured admin account unless that username exists.
    /// Returns whether an account was created.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<bool, ServiceError> {
        if self.users.find_by_username(username.trim()).await?.is_some() {
            return Ok(false);
        }

        let input = NewUser {
            username: username.to_string(),
            password: password.to_string(),
            display_name: "Administrador".to_string(),
            role: Role::Admin,
        };
        let user = self.insert_new(input).await?;
        info!(user_id = %user.id, username = %user.username, "bootstrap admin created");
        Ok(true)
    }

    async fn insert_new(&self, input: NewUser) -> Result<User, ServiceError> {
        let input = input.validated()?;
        let hash = hash_password(&input.password)?;
        let user = input.into_user(hash, Utc::now());

        match self.users.insert(&user).await {
            Ok(()) => Ok(user),
            Err(StoreError::Duplicate(_)) => {
                Err(DomainError::validation("username", format!("'{}' is already taken", user.username)).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envios_auth::{Hs256JwtValidator, Hs256TokenIssuer, JwtValidator};

    use crate::store::InMemoryUserStore;

    const SECRET: &[u8] = b"test-secret";

    fn service() -> UserService {
        UserService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(Hs256TokenIssuer::new(SECRET.to_vec())),
            chrono::Duration::minutes(60),
        )
    }

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "secreto".to_string(),
            display_name: format!("Nombre {username}"),
            role,
        }
    }

    async fn admin(svc: &UserService) -> Principal {
        svc.bootstrap_admin("admin", "admin123").await.unwrap();
        svc.login("admin", "admin123").await.unwrap().user.principal()
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent_and_login_issues_valid_token() {
        let svc = service();
        assert!(svc.bootstrap_admin("admin", "admin123").await.unwrap());
        assert!(!svc.bootstrap_admin("admin", "other").await.unwrap());

        let session = svc.login("admin", "admin123").await.unwrap();
        assert_eq!(session.user.role, Role::Admin);

        let claims = Hs256JwtValidator::new(SECRET.to_vec())
            .validate(&session.token, Utc::now())
            .unwrap();
        assert_eq!(claims.sub, session.user.id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthenticated() {
        let svc = service();
        svc.bootstrap_admin("admin", "admin123").await.unwrap();

        for (user, pass) in [("admin", "nope"), ("ghost", "admin123")] {
            let err = svc.login(user, pass).await.unwrap_err();
            assert!(matches!(err, ServiceError::Domain(DomainError::Unauthenticated(_))));
        }
    }

    #[tokio::test]
    async fn only_admin_manages_users() {
        let svc = service();
        let admin = admin(&svc).await;

        let agent = svc.create(new_user("agente1", Role::Agente), &admin).await.unwrap();
        let err = svc
            .create(new_user("otro", Role::Repartidor), &agent.principal())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));

        let err = svc.list_active(&agent.principal()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));
        assert_eq!(svc.list_active(&admin).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() {
        let svc = service();
        let admin = admin(&svc).await;
        svc.create(new_user("ana", Role::Agente), &admin).await.unwrap();

        let err = svc.create(new_user("ana", Role::Repartidor), &admin).await.unwrap_err();
        assert_eq!(err.domain().and_then(|e| e.field()), Some("username"));
    }

    #[tokio::test]
    async fn deactivation_blocks_login_and_me_but_not_self() {
        let svc = service();
        let admin = admin(&svc).await;
        let courier = svc.create(new_user("juan", Role::Repartidor), &admin).await.unwrap();

        let err = svc.deactivate(admin.user_id, &admin).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation { .. })));

        svc.deactivate(courier.id, &admin).await.unwrap();
        assert!(svc.login("juan", "secreto").await.is_err());
        assert!(svc.me(&courier.principal()).await.is_err());
        assert_eq!(svc.list_active(&admin).await.unwrap().len(), 1);

        let err = svc.deactivate(UserId::new(), &admin).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn resolve_follows_the_stored_account() {
        let svc = service();
        let admin = admin(&svc).await;
        let agent = svc.create(new_user("ana", Role::Agente), &admin).await.unwrap();

        let mut claimed = agent.principal();
        claimed.role = Role::Admin;
        claimed.display_name = "Otra".to_string();
        let resolved = svc.resolve(&claimed).await.unwrap();
        assert_eq!(resolved, agent.principal());

        svc.deactivate(agent.id, &admin).await.unwrap();
        let err = svc.resolve(&agent.principal()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Unauthenticated(_))));

        let stranger = Principal::new(UserId::new(), "ghost", "Ghost", Role::Admin);
        assert!(svc.resolve(&stranger).await.is_err());
    }
}
