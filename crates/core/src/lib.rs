//! `envios-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers and the error taxonomy shared by every layer.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{require_non_empty, DomainError, DomainResult};
pub use id::{MessageId, ShipmentId, UserId};
