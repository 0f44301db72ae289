//! Shipment lifecycle orchestration.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! authorize → load (if needed) → validate → one store write → post-commit hook
//! ```
//!
//! A rejection at any step before the write leaves the store untouched. The
//! state change is a single conditional write ("set state + push entry where
//! state = expected"); losing a race re-reads and re-validates, so the loser
//! either retries against the fresh state or fails with the transition error
//! that fresh state implies.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use envios_auth::{authorize, Operation, Principal};
use envios_core::{DomainError, ShipmentId};
use envios_shipments::{
    validate_transition, HistoryEntry, NewShipment, Pagination, PhotoUpload, Shipment, ShipmentFilter,
    ShipmentPatch, ShipmentState, TrackingView, TransitionFields,
};

use crate::error::ServiceError;
use crate::export::{listing_filename, render_workbook, single_filename, ExportFile};
use crate::notifier::NotificationDispatcher;
use crate::store::{ShipmentStore, StoreError};

/// Upper bound on conditional-write attempts for one state change.
pub const MAX_TRANSITION_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct ShipmentService {
    shipments: Arc<dyn ShipmentStore>,
    notifier: NotificationDispatcher,
}

impl ShipmentService {
    pub fn new(shipments: Arc<dyn ShipmentStore>, notifier: NotificationDispatcher) -> Self {
        Self { shipments, notifier }
    }

    pub fn notifier(&self) -> &NotificationDispatcher {
        &self.notifier
    }

    async fn load(&self, id: ShipmentId) -> Result<Shipment, ServiceError> {
        self.shipments
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shipment {id}")).into())
    }

    pub async fn create(&self, draft: NewShipment, actor: &Principal) -> Result<Shipment, ServiceError> {
        authorize(actor, Operation::CreateShipment)?;

        let shipment = Shipment::create(ShipmentId::new(), draft, actor, Utc::now())?;
        self.shipments.insert(&shipment).await?;

        info!(
            shipment_id = %shipment.id,
            ticket = %shipment.ticket,
            actor = %actor.username,
            "shipment created"
        );
        Ok(shipment)
    }

    /// Move a shipment to `requested`, recording who did it and the
    /// target-specific details. Notifies the customer after commit.
    pub async fn change_state(
        &self,
        id: ShipmentId,
        requested: ShipmentState,
        fields: TransitionFields,
        actor: &Principal,
    ) -> Result<Shipment, ServiceError> {
        authorize(actor, Operation::ChangeShipmentState)?;

        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self.load(id).await?;
            let details = validate_transition(current.state, requested, &fields)?;
            let entry = HistoryEntry::new(requested, details, actor, Utc::now());

            match self.shipments.apply_transition(id, current.state, &entry).await {
                Ok(updated) => {
                    info!(
                        shipment_id = %id,
                        from = %current.state,
                        to = %requested,
                        actor = %actor.username,
                        attempt,
                        "shipment state changed"
                    );
                    self.notifier.after_transition(&updated).await;
                    return Ok(updated);
                }
                Err(StoreError::Conflict(reason)) => {
                    warn!(shipment_id = %id, attempt, %reason, "concurrent state change; re-reading");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict(format!(
            "shipment {id} kept changing; gave up after {MAX_TRANSITION_ATTEMPTS} attempts"
        ))
        .into())
    }

    /// Correct non-lifecycle fields.
    pub async fn update(
        &self,
        id: ShipmentId,
        patch: ShipmentPatch,
        actor: &Principal,
    ) -> Result<Shipment, ServiceError> {
        authorize(actor, Operation::UpdateShipment)?;

        let update = patch.validated()?;
        if update.is_empty() {
            return self.load(id).await;
        }

        let updated = self.shipments.update_fields(id, &update).await?;
        info!(shipment_id = %id, actor = %actor.username, "shipment fields updated");
        Ok(updated)
    }

    /// Hard delete. History and record go together; logged messages stay.
    pub async fn delete(&self, id: ShipmentId, actor: &Principal) -> Result<(), ServiceError> {
        authorize(actor, Operation::DeleteShipment)?;

        if !self.shipments.delete(id).await? {
            return Err(DomainError::not_found(format!("shipment {id}")).into());
        }
        info!(shipment_id = %id, actor = %actor.username, "shipment deleted");
        Ok(())
    }

    pub async fn get(&self, id: ShipmentId, actor: &Principal) -> Result<Shipment, ServiceError> {
        authorize(actor, Operation::ReadShipments)?;
        self.load(id).await
    }

    pub async fn list(
        &self,
        filter: &ShipmentFilter,
        pagination: Pagination,
        actor: &Principal,
    ) -> Result<Vec<Shipment>, ServiceError> {
        authorize(actor, Operation::ReadShipments)?;
        Ok(self.shipments.list(filter, Some(pagination)).await?)
    }

    pub async fn count(&self, filter: &ShipmentFilter, actor: &Principal) -> Result<u64, ServiceError> {
        authorize(actor, Operation::ReadShipments)?;
        Ok(self.shipments.count(filter).await?)
    }

    /// Every matching shipment as a workbook. An empty selection is `NotFound`.
    pub async fn export(&self, filter: &ShipmentFilter, actor: &Principal) -> Result<ExportFile, ServiceError> {
        authorize(actor, Operation::ExportShipments)?;

        let shipments = self.shipments.list(filter, None).await?;
        if shipments.is_empty() {
            return Err(DomainError::not_found("shipments to export").into());
        }

        Ok(ExportFile {
            filename: listing_filename(Utc::now()),
            bytes: render_workbook(&shipments)?,
        })
    }

    pub async fn export_one(&self, id: ShipmentId, actor: &Principal) -> Result<ExportFile, ServiceError> {
        authorize(actor, Operation::ExportShipments)?;

        let shipment = self.load(id).await?;
        Ok(ExportFile {
            filename: single_filename(&shipment.ticket, Utc::now()),
            bytes: render_workbook(std::slice::from_ref(&shipment))?,
        })
    }

    /// Public lookup by ticket; no principal required.
    /// Turn an uploaded delivery photo into the reference a later state
    /// change carries as `imagen_url`. The shipment itself is not modified.
    pub async fn photo_reference(
        &self,
        id: ShipmentId,
        photo: PhotoUpload,
        actor: &Principal,
    ) -> Result<String, ServiceError> {
        authorize(actor, Operation::UploadShipmentPhoto)?;
        self.load(id).await?;

        info!(
            shipment_id = %id,
            actor = %actor.username,
            content_type = photo.content_type(),
            size = photo.size_bytes(),
            "delivery photo attached"
        );
        Ok(photo.data_url())
    }

    pub async fn track(&self, ticket: &str) -> Result<TrackingView, ServiceError> {
        let ticket = ticket.trim();
        self.shipments
            .find_latest_by_ticket(ticket)
            .await?
            .map(|s| s.tracking_view())
            .ok_or_else(|| DomainError::not_found(format!("ticket {ticket}")).into())
    }
}
