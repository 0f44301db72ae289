//! Typed record identifiers.
//!
//! Every record kind gets its own UUIDv7-backed id type, so a shipment id can
//! never be handed to something that expects a user id. The kinds only differ
//! in how a malformed id is reported back to the caller.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::DomainError;

/// A record kind that owns an identifier type.
pub trait IdKind {
    /// Request field a malformed id is reported against.
    const FIELD: &'static str;
    /// Name used in error messages ("shipment", "user", ...).
    const LABEL: &'static str;
}

#[derive(Debug)]
pub enum ShipmentKind {}

#[derive(Debug)]
pub enum UserKind {}

#[derive(Debug)]
pub enum MessageKind {}

impl IdKind for ShipmentKind {
    const FIELD: &'static str = "id";
    const LABEL: &'static str = "shipment";
}

impl IdKind for UserKind {
    const FIELD: &'static str = "usuario_id";
    const LABEL: &'static str = "user";
}

impl IdKind for MessageKind {
    const FIELD: &'static str = "mensaje_id";
    const LABEL: &'static str = "message";
}

/// Identifier of a shipment ("envío"). Immutable for the lifetime of the record.
pub type ShipmentId = Id<ShipmentKind>;

/// Identifier of an account. Accounts are only ever deactivated, so history
/// entries can always resolve it.
pub type UserId = Id<UserKind>;

/// Identifier of an outbound-message log record.
pub type MessageId = Id<MessageKind>;

/// UUID tagged with the kind of record it names. Serializes as the bare UUID.
pub struct Id<K> {
    uuid: Uuid,
    kind: PhantomData<fn() -> K>,
}

impl<K> Id<K> {
    /// Fresh time-ordered (v7) identifier.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: PhantomData,
        }
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.uuid
    }
}

// Manual impls: derives would demand the same traits from the marker type.
impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Id<K> {}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<K> Eq for Id<K> {}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<K: IdKind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", K::LABEL, self.uuid)
    }
}

impl<K> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl<K: IdKind> FromStr for Id<K> {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self::from_uuid)
            .map_err(|_| DomainError::validation(K::FIELD, format!("'{s}' is not a valid {} id", K::LABEL)))
    }
}

impl<K> Serialize for Id<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.uuid.serialize(serializer)
    }
}

impl<'de, K> Deserialize<'de> for Id<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_name_their_field_and_kind() {
        let err = "not-a-uuid".parse::<ShipmentId>().unwrap_err();
        assert_eq!(err.field(), Some("id"));
        assert!(err.to_string().contains("shipment"));

        let err = "42".parse::<UserId>().unwrap_err();
        assert_eq!(err.field(), Some("usuario_id"));
    }

    #[test]
    fn wire_form_is_the_bare_uuid() {
        let id = UserId::new();
        let parsed: UserId = format!(" {id} ").parse().unwrap();
        assert_eq!(parsed, id);

        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
        assert_eq!(serde_json::from_value::<UserId>(json).unwrap(), id);
        assert_eq!(format!("{id:?}"), format!("user:{id}"));
    }
}
