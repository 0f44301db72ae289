use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use envios_auth::User;
use envios_core::{Entity, ShipmentId, UserId};
use envios_shipments::{
    HistoryEntry, OutboundMessage, Pagination, Shipment, ShipmentFilter, ShipmentState, ShipmentUpdate,
};

use super::{MessageStore, ShipmentStore, StoreError, UserStore};

/// Entity-keyed map behind a single lock.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug)]
struct Table<T: Entity> {
    rows: RwLock<HashMap<T::Id, T>>,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Entity> Table<T> {
    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<T::Id, T>>, StoreError> {
        self.rows
            .read()
            .map_err(|_| StoreError::Backend("in-memory lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<T::Id, T>>, StoreError> {
        self.rows
            .write()
            .map_err(|_| StoreError::Backend("in-memory lock poisoned".to_string()))
    }
}

fn page<T>(rows: Vec<T>, pagination: Option<Pagination>) -> Vec<T> {
    match pagination {
        Some(p) => rows
            .into_iter()
            .skip(p.skip as usize)
            .take(p.limit as usize)
            .collect(),
        None => rows,
    }
}

/// In-memory shipment store. The conditional transition runs under one write lock.
#[derive(Debug, Default)]
pub struct InMemoryShipmentStore {
    table: Table<Shipment>,
}

impl InMemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    async fn insert(&self, shipment: &Shipment) -> Result<(), StoreError> {
        let mut rows = self.table.write()?;
        if rows.contains_key(&shipment.id) {
            return Err(StoreError::Duplicate(format!("shipment {}", shipment.id)));
        }
        rows.insert(shipment.id, shipment.clone());
        Ok(())
    }

    async fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        Ok(self.table.read()?.get(&id).cloned())
    }

    async fn apply_transition(
        &self,
        id: ShipmentId,
        expected: ShipmentState,
        entry: &HistoryEntry,
    ) -> Result<Shipment, StoreError> {
        let mut rows = self.table.write()?;
        let shipment = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("shipment {id}")))?;

        if shipment.state != expected {
            return Err(StoreError::Conflict(format!(
                "shipment {id} is '{}', expected '{expected}'",
                shipment.state
            )));
        }

        shipment.record_transition(entry.clone());
        Ok(shipment.clone())
    }

    async fn update_fields(&self, id: ShipmentId, update: &ShipmentUpdate) -> Result<Shipment, StoreError> {
        let mut rows = self.table.write()?;
        let shipment = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("shipment {id}")))?;
        shipment.apply_update(update);
        Ok(shipment.clone())
    }

    async fn delete(&self, id: ShipmentId) -> Result<bool, StoreError> {
        Ok(self.table.write()?.remove(&id).is_some())
    }

    async fn list(
        &self,
        filter: &ShipmentFilter,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Shipment>, StoreError> {
        let mut matching: Vec<Shipment> = self
            .table
            .read()?
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();

        // UUIDv7 ids break ties between identical timestamps in creation order.
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(page(matching, pagination))
    }

    async fn count(&self, filter: &ShipmentFilter) -> Result<u64, StoreError> {
        Ok(self.table.read()?.values().filter(|s| filter.matches(s)).count() as u64)
    }

    async fn find_latest_by_ticket(&self, ticket: &str) -> Result<Option<Shipment>, StoreError> {
        Ok(self
            .table
            .read()?
            .values()
            .filter(|s| s.ticket == ticket)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
            })
            .cloned())
    }
}

/// In-memory user store.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: Table<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut rows = self.table.write()?;
        if rows.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username '{}'", user.username)));
        }
        rows.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.table.read()?.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .table
            .read()?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .table
            .read()?
            .values()
            .filter(|u| u.active)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn deactivate(&self, id: UserId) -> Result<bool, StoreError> {
        let mut rows = self.table.write()?;
        match rows.get_mut(&id) {
            Some(user) => {
                user.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory outbound message log.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    table: Table<OutboundMessage>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(mut messages: Vec<OutboundMessage>) -> Vec<OutboundMessage> {
        messages.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        messages
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: &OutboundMessage) -> Result<(), StoreError> {
        self.table.write()?.insert(message.id, message.clone());
        Ok(())
    }

    async fn list_all(&self, pagination: Pagination) -> Result<Vec<OutboundMessage>, StoreError> {
        let all = self.table.read()?.values().cloned().collect();
        Ok(page(Self::newest_first(all), Some(pagination)))
    }

    async fn list_for_shipment(&self, shipment_id: ShipmentId) -> Result<Vec<OutboundMessage>, StoreError> {
        let matching = self
            .table
            .read()?
            .values()
            .filter(|m| m.shipment_id == shipment_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(matching))
    }
}
