//! Customer notification texts and the outbound message log record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envios_core::{Entity, MessageId, ShipmentId};

use crate::{Shipment, ShipmentState};

/// Compose the customer message for a shipment that just entered `state`.
///
/// Only `Asignado a courier` and `Entregado` notify; every other state
/// returns `None`.
pub fn render_message(
    state: ShipmentState,
    shipment: &Shipment,
    tracking_base_url: Option<&str>,
) -> Option<String> {
    let mut text = match state {
        ShipmentState::AsignadoACourier => format!(
            "Hola {}, tu envío {} fue asignado a un courier y está en camino.",
            shipment.contact_name, shipment.ticket
        ),
        ShipmentState::Entregado => {
            let recipient = shipment
                .last_entry()
                .filter(|e| e.state == ShipmentState::Entregado)
                .and_then(|e| e.recipient_name.as_deref())
                .unwrap_or("el destinatario");
            format!(
                "Hola {}, tu envío {} fue entregado. Recibido por: {}.",
                shipment.contact_name, shipment.ticket, recipient
            )
        }
        ShipmentState::Ingresada | ShipmentState::NoEntregado => return None,
    };

    if let Some(base) = tracking_base_url {
        text.push_str(&format!(
            " Seguí tu envío en {}/tracking/{}",
            base.trim_end_matches('/'),
            shipment.ticket
        ));
    }
    Some(text)
}

/// One logged notification. Nothing is sent; `delivered` stays `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: MessageId,
    #[serde(rename = "envio_id")]
    pub shipment_id: ShipmentId,
    pub ticket: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "mensaje")]
    pub message_text: String,
    #[serde(rename = "estado")]
    pub resulting_state: ShipmentState,
    #[serde(rename = "fecha")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "enviado")]
    pub delivered: bool,
}

impl OutboundMessage {
    /// Render and build the log record for `shipment`'s current state, if
    /// that state notifies.
    pub fn for_shipment(
        shipment: &Shipment,
        tracking_base_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let message_text = render_message(shipment.state, shipment, tracking_base_url)?;
        Some(Self {
            id: MessageId::new(),
            shipment_id: shipment.id,
            ticket: shipment.ticket.clone(),
            phone: shipment.phone.clone(),
            message_text,
            resulting_state: shipment.state,
            timestamp: now,
            delivered: false,
        })
    }
}

impl Entity for OutboundMessage {
    type Id = MessageId;

    fn id(&self) -> MessageId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::tests::{agent, draft};
    use crate::{HistoryEntry, TransitionDetails};

    fn shipment() -> Shipment {
        Shipment::create(ShipmentId::new(), draft("Maldonado"), &agent(), Utc::now()).unwrap()
    }

    #[test]
    fn only_assigned_and_delivered_notify() {
        let s = shipment();
        assert!(render_message(ShipmentState::Ingresada, &s, None).is_none());
        assert!(render_message(ShipmentState::NoEntregado, &s, None).is_none());

        let text = render_message(ShipmentState::AsignadoACourier, &s, None).unwrap();
        assert!(text.contains("Juan Test"));
        assert!(text.contains("TEST-001"));
        assert!(text.contains("courier"));
    }

    #[test]
    fn delivered_text_names_the_recipient() {
        let actor = agent();
        let mut s = shipment();
        s.record_transition(HistoryEntry::new(
            ShipmentState::AsignadoACourier,
            TransitionDetails::default(),
            &actor,
            Utc::now(),
        ));
        s.record_transition(HistoryEntry::new(
            ShipmentState::Entregado,
            TransitionDetails {
                recipient_name: Some("Ana Pérez".to_string()),
                recipient_id_document: Some("1.234.567-8".to_string()),
                ..Default::default()
            },
            &actor,
            Utc::now(),
        ));

        let msg = OutboundMessage::for_shipment(&s, None, Utc::now()).unwrap();
        assert!(msg.message_text.contains("Ana Pérez"));
        assert_eq!(msg.resulting_state, ShipmentState::Entregado);
        assert!(!msg.delivered);
        assert_eq!(msg.phone, "099123456");
    }

    #[test]
    fn tracking_link_is_appended_when_configured() {
        let s = shipment();
        let text =
            render_message(ShipmentState::AsignadoACourier, &s, Some("https://envios.example.uy/")).unwrap();
        assert!(text.ends_with("https://envios.example.uy/tracking/TEST-001"));
    }

    #[test]
    fn wire_names_are_spanish() {
        let mut s = shipment();
        s.state = ShipmentState::AsignadoACourier;
        let msg = OutboundMessage::for_shipment(&s, None, Utc::now()).unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["enviado"], false);
        assert_eq!(json["estado"], "Asignado a courier");
        assert_eq!(json["envio_id"], s.id.to_string());
    }
}
