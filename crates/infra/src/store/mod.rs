//! Persistence seam for shipments, users and the outbound message log.
//!
//! Services only ever see these traits; the in-memory implementations back
//! tests and local development, the Postgres ones back deployments.

use async_trait::async_trait;
use thiserror::Error;

use envios_auth::User;
use envios_core::{ShipmentId, UserId};
use envios_shipments::{
    HistoryEntry, OutboundMessage, Pagination, Shipment, ShipmentFilter, ShipmentState, ShipmentUpdate,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryMessageStore, InMemoryShipmentStore, InMemoryUserStore};
pub use postgres::PostgresStore;

/// Store operation error.
///
/// These are infrastructure outcomes as opposed to domain errors; the
/// service layer translates them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write found the record in a different state than expected.
    #[error("precondition failed: {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Shipment persistence.
///
/// `apply_transition` is the only way to change `estado`/`historial_estados`
/// and must be atomic: it sets the state and appends the entry only if the
/// stored state still equals `expected`.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    async fn insert(&self, shipment: &Shipment) -> Result<(), StoreError>;

    async fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError>;

    /// Set state + push history entry where state = `expected`.
    ///
    /// Fails with [`StoreError::Conflict`] when the precondition does not hold
    /// and [`StoreError::NotFound`] when the record is gone.
    async fn apply_transition(
        &self,
        id: ShipmentId,
        expected: ShipmentState,
        entry: &HistoryEntry,
    ) -> Result<Shipment, StoreError>;

    /// Merge a validated field update; lifecycle fields are never touched.
    async fn update_fields(&self, id: ShipmentId, update: &ShipmentUpdate) -> Result<Shipment, StoreError>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: ShipmentId) -> Result<bool, StoreError>;

    /// Matching shipments, newest first. `None` pagination returns every match.
    async fn list(
        &self,
        filter: &ShipmentFilter,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Shipment>, StoreError>;

    async fn count(&self, filter: &ShipmentFilter) -> Result<u64, StoreError>;

    /// Most recently created shipment carrying `ticket`.
    async fn find_latest_by_ticket(&self, ticket: &str) -> Result<Option<Shipment>, StoreError>;
}

/// User account persistence. Users are never hard-deleted.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the username is taken.
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn list_active(&self) -> Result<Vec<User>, StoreError>;

    /// Returns whether the user existed.
    async fn deactivate(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Append-only outbound message log.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: &OutboundMessage) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_all(&self, pagination: Pagination) -> Result<Vec<OutboundMessage>, StoreError>;

    /// Newest first.
    async fn list_for_shipment(&self, shipment_id: ShipmentId) -> Result<Vec<OutboundMessage>, StoreError>;
}
