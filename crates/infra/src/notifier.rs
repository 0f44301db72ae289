//! Post-commit customer notification and the outbound message log.
//!
//! Nothing is actually sent: a notifying transition produces one log record
//! with `enviado = false`, which the admin message views read back.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use envios_auth::{authorize, Operation, Principal};
use envios_core::ShipmentId;
use envios_shipments::{OutboundMessage, Pagination, Shipment};

use crate::error::ServiceError;
use crate::store::{MessageStore, StoreError};

#[derive(Clone)]
pub struct NotificationDispatcher {
    messages: Arc<dyn MessageStore>,
    tracking_base_url: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(messages: Arc<dyn MessageStore>, tracking_base_url: Option<String>) -> Self {
        Self {
            messages,
            tracking_base_url,
        }
    }

    /// Log the message for `shipment`'s current state, if that state notifies.
    pub async fn dispatch(&self, shipment: &Shipment) -> Result<Option<OutboundMessage>, StoreError> {
        let Some(message) = OutboundMessage::for_shipment(shipment, self.tracking_base_url.as_deref(), Utc::now())
        else {
            return Ok(None);
        };

        self.messages.insert(&message).await?;
        info!(
            shipment_id = %message.shipment_id,
            ticket = %message.ticket,
            telefono = %message.phone,
            estado = %message.resulting_state,
            "customer notification logged"
        );
        Ok(Some(message))
    }

    /// Hook run after a transition has committed. Failures are logged and
    /// never reach the caller.
    pub async fn after_transition(&self, shipment: &Shipment) {
        if let Err(e) = self.dispatch(shipment).await {
            warn!(shipment_id = %shipment.id, error = %e, "notification dispatch failed");
        }
    }

    /// Whole outbound log, newest first.
    pub async fn list_all(
        &self,
        pagination: Pagination,
        actor: &Principal,
    ) -> Result<Vec<OutboundMessage>, ServiceError> {
        authorize(actor, Operation::ListAllMessages)?;
        Ok(self.messages.list_all(pagination).await?)
    }

    /// Messages logged for one shipment, newest first.
    pub async fn list_for_shipment(
        &self,
        shipment_id: ShipmentId,
        actor: &Principal,
    ) -> Result<Vec<OutboundMessage>, ServiceError> {
        authorize(actor, Operation::ReadShipmentMessages)?;
        Ok(self.messages.list_for_shipment(shipment_id).await?)
    }
}
