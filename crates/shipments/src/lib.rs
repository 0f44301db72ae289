//! Shipment lifecycle domain module.
//!
//! This crate contains the business rules for shipments ("envíos"),
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage): the fixed catalogs, the lifecycle states and their legal
//! transitions, the shipment record with its append-only history, delivery
//! photos, and the customer notification texts.

pub mod catalog;
pub mod notification;
pub mod photo;
pub mod query;
pub mod shipment;
pub mod state;
pub mod transition;

pub use catalog::{Department, Reason};
pub use notification::{render_message, OutboundMessage};
pub use photo::{PhotoUpload, MAX_PHOTO_BYTES};
pub use query::{Pagination, ShipmentFilter};
pub use shipment::{
    HistoryEntry, NewShipment, Shipment, ShipmentPatch, ShipmentUpdate, TrackingStep, TrackingView,
};
pub use state::ShipmentState;
pub use transition::{validate_transition, TransitionDetails, TransitionFields};
