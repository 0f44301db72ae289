use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envios_auth::Principal;
use envios_core::{require_non_empty, DomainResult, Entity, ShipmentId, UserId};

use crate::{Department, Reason, ShipmentState, TransitionDetails};

/// One immutable line of the audit trail ("historial").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "estado")]
    pub state: ShipmentState,
    #[serde(rename = "fecha")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "usuario_id")]
    pub actor_user_id: UserId,
    #[serde(rename = "usuario_nombre")]
    pub actor_display_name: String,
    #[serde(rename = "receptor_nombre", default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(rename = "receptor_cedula", default, skip_serializing_if = "Option::is_none")]
    pub recipient_id_document: Option<String>,
    #[serde(rename = "imagen_url", default, skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
    #[serde(rename = "comentario", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl HistoryEntry {
    pub fn new(
        state: ShipmentState,
        details: TransitionDetails,
        actor: &Principal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            state,
            timestamp,
            actor_user_id: actor.user_id,
            actor_display_name: actor.display_name.clone(),
            recipient_name: details.recipient_name,
            recipient_id_document: details.recipient_id_document,
            photo_reference: details.photo_reference,
            comment: details.comment,
        }
    }
}

/// Shipment record ("envío").
///
/// # Invariants
/// - `history` is never empty and only grows.
/// - `state` equals the state of the last history entry.
/// - `department` and `reason` are members of their fixed catalogs (by type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub ticket: String,
    #[serde(rename = "calle")]
    pub street: String,
    #[serde(rename = "numero")]
    pub house_number: String,
    #[serde(rename = "apto", default)]
    pub apartment: Option<String>,
    #[serde(rename = "esquina", default)]
    pub cross_street: Option<String>,
    #[serde(rename = "motivo")]
    pub reason: Reason,
    #[serde(rename = "departamento")]
    pub department: Department,
    #[serde(rename = "comentarios", default)]
    pub comments: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "contacto")]
    pub contact_name: String,
    #[serde(rename = "fecha_carga")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "estado")]
    pub state: ShipmentState,
    #[serde(rename = "historial_estados")]
    pub history: Vec<HistoryEntry>,
    #[serde(rename = "creado_por_id")]
    pub created_by_id: UserId,
    #[serde(rename = "creado_por_nombre")]
    pub created_by_name: String,
}

impl Shipment {
    /// Build a fresh record in `Ingresada`, seeding the history with one
    /// entry attributed to `actor`.
    pub fn create(id: ShipmentId, draft: NewShipment, actor: &Principal, now: DateTime<Utc>) -> DomainResult<Self> {
        let draft = draft.validated()?;
        let seed = HistoryEntry::new(ShipmentState::Ingresada, TransitionDetails::default(), actor, now);

        Ok(Self {
            id,
            ticket: draft.ticket,
            street: draft.street,
            house_number: draft.house_number,
            apartment: draft.apartment,
            cross_street: draft.cross_street,
            reason: draft.reason,
            department: draft.department,
            comments: draft.comments,
            phone: draft.phone,
            contact_name: draft.contact_name,
            created_at: now,
            state: ShipmentState::Ingresada,
            history: vec![seed],
            created_by_id: actor.user_id,
            created_by_name: actor.display_name.clone(),
        })
    }

    /// Set the new state and append its entry in one step.
    ///
    /// Callers must have validated the transition; stores call this inside
    /// their atomic section.
    pub fn record_transition(&mut self, entry: HistoryEntry) {
        self.state = entry.state;
        self.history.push(entry);
    }

    /// Apply a validated field correction. Lifecycle fields are untouchable.
    pub fn apply_update(&mut self, update: &ShipmentUpdate) {
        if let Some(v) = &update.ticket {
            self.ticket = v.clone();
        }
        if let Some(v) = &update.street {
            self.street = v.clone();
        }
        if let Some(v) = &update.house_number {
            self.house_number = v.clone();
        }
        if let Some(v) = &update.apartment {
            self.apartment = v.clone();
        }
        if let Some(v) = &update.cross_street {
            self.cross_street = v.clone();
        }
        if let Some(v) = update.reason {
            self.reason = v;
        }
        if let Some(v) = update.department {
            self.department = v;
        }
        if let Some(v) = &update.comments {
            self.comments = v.clone();
        }
        if let Some(v) = &update.phone {
            self.phone = v.clone();
        }
        if let Some(v) = &update.contact_name {
            self.contact_name = v.clone();
        }
    }

    /// Most recent history entry (always present).
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// `state` agrees with the history tail and the history is non-empty.
    pub fn is_consistent(&self) -> bool {
        self.last_entry().is_some_and(|e| e.state == self.state)
    }

    /// Public view for the tracking page: no phone, no actor ids, no ID documents.
    pub fn tracking_view(&self) -> TrackingView {
        TrackingView {
            ticket: self.ticket.clone(),
            department: self.department,
            state: self.state,
            created_at: self.created_at,
            history: self
                .history
                .iter()
                .map(|e| TrackingStep {
                    state: e.state,
                    timestamp: e.timestamp,
                    recipient_name: e.recipient_name.clone(),
                    photo_reference: e.photo_reference.clone(),
                })
                .collect(),
        }
    }
}

impl Entity for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> ShipmentId {
        self.id
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Raw creation input. Catalog fields arrive as text and are parsed here so
/// that out-of-range values surface as field-level validation errors.
#[derive(Debug, Clone, Deserialize)]
pub struct NewShipment {
    pub ticket: String,
    #[serde(rename = "calle")]
    pub street: String,
    #[serde(rename = "numero")]
    pub house_number: String,
    #[serde(rename = "apto", default)]
    pub apartment: Option<String>,
    #[serde(rename = "esquina", default)]
    pub cross_street: Option<String>,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "departamento")]
    pub department: String,
    #[serde(rename = "comentarios", default)]
    pub comments: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "contacto")]
    pub contact_name: String,
}

struct ValidShipment {
    ticket: String,
    street: String,
    house_number: String,
    apartment: Option<String>,
    cross_street: Option<String>,
    reason: Reason,
    department: Department,
    comments: Option<String>,
    phone: String,
    contact_name: String,
}

impl NewShipment {
    fn validated(self) -> DomainResult<ValidShipment> {
        Ok(ValidShipment {
            department: self.department.parse()?,
            reason: self.reason.parse()?,
            ticket: require_non_empty("ticket", &self.ticket)?,
            street: require_non_empty("calle", &self.street)?,
            house_number: require_non_empty("numero", &self.house_number)?,
            phone: require_non_empty("telefono", &self.phone)?,
            contact_name: require_non_empty("contacto", &self.contact_name)?,
            apartment: optional_text(self.apartment),
            cross_street: optional_text(self.cross_street),
            comments: optional_text(self.comments),
        })
    }
}

/// Raw partial update of non-lifecycle fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentPatch {
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(rename = "calle", default)]
    pub street: Option<String>,
    #[serde(rename = "numero", default)]
    pub house_number: Option<String>,
    #[serde(rename = "apto", default)]
    pub apartment: Option<String>,
    #[serde(rename = "esquina", default)]
    pub cross_street: Option<String>,
    #[serde(rename = "motivo", default)]
    pub reason: Option<String>,
    #[serde(rename = "departamento", default)]
    pub department: Option<String>,
    #[serde(rename = "comentarios", default)]
    pub comments: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "contacto", default)]
    pub contact_name: Option<String>,
}

/// Validated partial update. Serializes to the document keys it changes, so
/// document stores can merge it directly.
///
/// Optional text fields are `Some(None)` when the patch blanked them, which
/// clears the stored value (serialized as `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShipmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    #[serde(rename = "calle", skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(rename = "numero", skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(rename = "apto", skip_serializing_if = "Option::is_none")]
    pub apartment: Option<Option<String>>,
    #[serde(rename = "esquina", skip_serializing_if = "Option::is_none")]
    pub cross_street: Option<Option<String>>,
    #[serde(rename = "motivo", skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    #[serde(rename = "departamento", skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    #[serde(rename = "comentarios", skip_serializing_if = "Option::is_none")]
    pub comments: Option<Option<String>>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "contacto", skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
}

impl ShipmentPatch {
    pub fn validated(self) -> DomainResult<ShipmentUpdate> {
        fn required(field: &str, value: Option<String>) -> DomainResult<Option<String>> {
            value.map(|v| require_non_empty(field, &v)).transpose()
        }

        Ok(ShipmentUpdate {
            ticket: required("ticket", self.ticket)?,
            street: required("calle", self.street)?,
            house_number: required("numero", self.house_number)?,
            phone: required("telefono", self.phone)?,
            contact_name: required("contacto", self.contact_name)?,
            apartment: self.apartment.map(|v| optional_text(Some(v))),
            cross_street: self.cross_street.map(|v| optional_text(Some(v))),
            comments: self.comments.map(|v| optional_text(Some(v))),
            reason: self.reason.map(|r| r.parse()).transpose()?,
            department: self.department.map(|d| d.parse()).transpose()?,
        })
    }
}

impl ShipmentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ShipmentUpdate::default()
    }
}

/// Public tracking projection of a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingView {
    pub ticket: String,
    #[serde(rename = "departamento")]
    pub department: Department,
    #[serde(rename = "estado")]
    pub state: ShipmentState,
    #[serde(rename = "fecha_carga")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "historial_estados")]
    pub history: Vec<TrackingStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingStep {
    #[serde(rename = "estado")]
    pub state: ShipmentState,
    #[serde(rename = "fecha")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "receptor_nombre", skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(rename = "imagen_url", skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use envios_auth::Role;
    use envios_core::DomainError;

    pub(crate) fn agent() -> Principal {
        Principal::new(UserId::new(), "agente1", "Agente Uno", Role::Agente)
    }

    pub(crate) fn draft(department: &str) -> NewShipment {
        NewShipment {
            ticket: "TEST-001".to_string(),
            street: "Av. 18 de Julio".to_string(),
            house_number: "1234".to_string(),
            apartment: Some("101".to_string()),
            cross_street: Some("Ejido".to_string()),
            reason: "Entrega".to_string(),
            department: department.to_string(),
            comments: None,
            phone: "099123456".to_string(),
            contact_name: "Juan Test".to_string(),
        }
    }

    #[test]
    fn create_seeds_single_ingresada_entry() {
        let actor = agent();
        let now = Utc::now();
        let s = Shipment::create(ShipmentId::new(), draft("Montevideo"), &actor, now).unwrap();

        assert_eq!(s.state, ShipmentState::Ingresada);
        assert_eq!(s.history.len(), 1);
        assert_eq!(s.history[0].state, ShipmentState::Ingresada);
        assert_eq!(s.history[0].actor_user_id, actor.user_id);
        assert_eq!(s.created_by_name, "Agente Uno");
        assert!(s.is_consistent());
    }

    #[test]
    fn create_rejects_unknown_department_and_blank_fields() {
        let err = Shipment::create(ShipmentId::new(), draft("Nonexistent"), &agent(), Utc::now()).unwrap_err();
        assert_eq!(err.field(), Some("departamento"));

        let mut d = draft("Salto");
        d.reason = "Envío".to_string();
        let err = Shipment::create(ShipmentId::new(), d, &agent(), Utc::now()).unwrap_err();
        assert_eq!(err.field(), Some("motivo"));

        let mut d = draft("Salto");
        d.phone = " ".to_string();
        let err = Shipment::create(ShipmentId::new(), d, &agent(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "telefono"));
    }

    #[test]
    fn record_transition_keeps_state_and_tail_in_sync() {
        let actor = agent();
        let mut s = Shipment::create(ShipmentId::new(), draft("Rocha"), &actor, Utc::now()).unwrap();
        s.record_transition(HistoryEntry::new(
            ShipmentState::AsignadoACourier,
            TransitionDetails::default(),
            &actor,
            Utc::now(),
        ));
        assert_eq!(s.state, ShipmentState::AsignadoACourier);
        assert_eq!(s.history.len(), 2);
        assert!(s.is_consistent());
    }

    #[test]
    fn patch_validates_catalogs_and_leaves_lifecycle_alone() {
        let actor = agent();
        let mut s = Shipment::create(ShipmentId::new(), draft("Rocha"), &actor, Utc::now()).unwrap();
        let before_history = s.history.clone();

        let update = ShipmentPatch {
            street: Some(" Bulevar Artigas ".to_string()),
            department: Some("San José".to_string()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        s.apply_update(&update);

        assert_eq!(s.street, "Bulevar Artigas");
        assert_eq!(s.department, Department::SanJose);
        assert_eq!(s.history, before_history);
        assert_eq!(s.state, ShipmentState::Ingresada);

        let err = ShipmentPatch {
            department: Some("Nowhere".to_string()),
            ..Default::default()
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.field(), Some("departamento"));
    }

    #[test]
    fn update_serializes_only_changed_keys() {
        let update = ShipmentPatch {
            contact_name: Some("Maria".to_string()),
            reason: Some("Retiro".to_string()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"contacto": "Maria", "motivo": "Retiro"}));
    }

    #[test]
    fn blank_optional_text_clears_like_on_create() {
        let mut s = Shipment::create(ShipmentId::new(), draft("Canelones"), &agent(), Utc::now()).unwrap();
        assert_eq!(s.apartment.as_deref(), Some("101"));

        let update = ShipmentPatch {
            apartment: Some("   ".to_string()),
            cross_street: Some(" Rivera ".to_string()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(update.apartment, Some(None));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"apto": null, "esquina": "Rivera"})
        );

        s.apply_update(&update);
        assert_eq!(s.apartment, None);
        assert_eq!(s.cross_street.as_deref(), Some("Rivera"));
        assert_eq!(s.comments, None);

        let mut d = draft("Canelones");
        d.apartment = Some("  ".to_string());
        let created = Shipment::create(ShipmentId::new(), d, &agent(), Utc::now()).unwrap();
        assert_eq!(created.apartment, s.apartment);
    }

    #[test]
    fn history_entry_omits_absent_optionals_on_the_wire() {
        let entry = HistoryEntry::new(ShipmentState::Ingresada, TransitionDetails::default(), &agent(), Utc::now());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("comentario").is_none());
        assert!(json.get("imagen_url").is_none());
        assert_eq!(json["estado"], "Ingresada");
    }

    #[test]
    fn tracking_view_hides_private_fields() {
        let s = Shipment::create(ShipmentId::new(), draft("Flores"), &agent(), Utc::now()).unwrap();
        let json = serde_json::to_value(s.tracking_view()).unwrap();
        assert!(json.get("telefono").is_none());
        assert!(json["historial_estados"][0].get("usuario_id").is_none());
        assert_eq!(json["departamento"], "Flores");
    }
}
