//! `envios-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows the
//! three roles, which operation each role may perform, how bearer tokens are
//! encoded, and how passwords are hashed. Nothing here performs IO.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{authorize, AuthzError};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, Hs256TokenIssuer, JwtValidator, TokenIssuer};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::Operation;
pub use principal::Principal;
pub use roles::Role;
pub use user::{NewUser, User};
