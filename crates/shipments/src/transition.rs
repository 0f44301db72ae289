//! Transition validator: the legal transition graph and the per-target
//! required-field policy.
//!
//! Everything here is a pure function of `(current, requested, fields)`; the
//! store is never consulted, so a rejection can never leave a partial effect.

use serde::{Deserialize, Serialize};

use envios_core::{DomainError, DomainResult};

use crate::ShipmentState;

/// Fields a caller may supply alongside a requested transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionFields {
    #[serde(rename = "receptor_nombre", default)]
    pub recipient_name: Option<String>,
    #[serde(rename = "receptor_cedula", default)]
    pub recipient_id_document: Option<String>,
    #[serde(rename = "comentario", default)]
    pub comment: Option<String>,
    #[serde(rename = "imagen_url", default)]
    pub photo_reference: Option<String>,
}

/// The accepted subset of [`TransitionFields`] that goes into the history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionDetails {
    pub recipient_name: Option<String>,
    pub recipient_id_document: Option<String>,
    pub comment: Option<String>,
    pub photo_reference: Option<String>,
}

/// States reachable in one step from `from`.
pub fn allowed_targets(from: ShipmentState) -> &'static [ShipmentState] {
    match from {
        ShipmentState::Ingresada => &[ShipmentState::AsignadoACourier],
        ShipmentState::AsignadoACourier => &[ShipmentState::Entregado, ShipmentState::NoEntregado],
        ShipmentState::Entregado => &[],
        ShipmentState::NoEntregado => &[ShipmentState::AsignadoACourier],
    }
}

pub fn is_legal(from: ShipmentState, to: ShipmentState) -> bool {
    allowed_targets(from).contains(&to)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a requested transition and return the details to record.
///
/// - Illegal moves fail with [`DomainError::InvalidTransition`].
/// - `→ Entregado` requires a non-blank recipient name and ID document.
/// - `→ No entregado` carries comment and photo verbatim when provided.
/// - Fields irrelevant to the target state are dropped.
pub fn validate_transition(
    current: ShipmentState,
    requested: ShipmentState,
    fields: &TransitionFields,
) -> DomainResult<TransitionDetails> {
    if !is_legal(current, requested) {
        return Err(DomainError::invalid_transition(current.as_str(), requested.as_str()));
    }

    match requested {
        ShipmentState::Entregado => {
            let recipient_name = non_blank(&fields.recipient_name);
            let recipient_id_document = non_blank(&fields.recipient_id_document);

            let mut missing = Vec::new();
            if recipient_name.is_none() {
                missing.push("receptor_nombre".to_string());
            }
            if recipient_id_document.is_none() {
                missing.push("receptor_cedula".to_string());
            }
            if !missing.is_empty() {
                return Err(DomainError::MissingRequiredFields(missing));
            }

            Ok(TransitionDetails {
                recipient_name,
                recipient_id_document,
                photo_reference: non_blank(&fields.photo_reference),
                comment: None,
            })
        }
        ShipmentState::NoEntregado => Ok(TransitionDetails {
            comment: fields.comment.clone().filter(|c| !c.trim().is_empty()),
            photo_reference: fields.photo_reference.clone().filter(|p| !p.trim().is_empty()),
            ..TransitionDetails::default()
        }),
        ShipmentState::AsignadoACourier | ShipmentState::Ingresada => Ok(TransitionDetails::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn recipient(name: &str, doc: &str) -> TransitionFields {
        TransitionFields {
            recipient_name: Some(name.to_string()),
            recipient_id_document: Some(doc.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn ingresada_cannot_jump_to_entregado() {
        let err = validate_transition(
            ShipmentState::Ingresada,
            ShipmentState::Entregado,
            &recipient("X", "Y"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_transition("Ingresada", "Entregado")
        );
    }

    #[test]
    fn delivered_requires_recipient_fields() {
        let err = validate_transition(
            ShipmentState::AsignadoACourier,
            ShipmentState::Entregado,
            &TransitionFields::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingRequiredFields(vec![
                "receptor_nombre".to_string(),
                "receptor_cedula".to_string()
            ])
        );

        let err = validate_transition(
            ShipmentState::AsignadoACourier,
            ShipmentState::Entregado,
            &recipient("Ana", "   "),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::MissingRequiredFields(vec!["receptor_cedula".to_string()]));
    }

    #[test]
    fn delivered_carries_recipient() {
        let details = validate_transition(
            ShipmentState::AsignadoACourier,
            ShipmentState::Entregado,
            &recipient("X", "Y"),
        )
        .unwrap();
        assert_eq!(details.recipient_name.as_deref(), Some("X"));
        assert_eq!(details.recipient_id_document.as_deref(), Some("Y"));
        assert_eq!(details.comment, None);
    }

    #[test]
    fn not_delivered_keeps_comment_verbatim_and_drops_recipient() {
        let fields = TransitionFields {
            comment: Some("  No había nadie en el domicilio. ".to_string()),
            photo_reference: Some("data:image/png;base64,AAAA".to_string()),
            recipient_name: Some("ignored".to_string()),
            recipient_id_document: None,
        };
        let details =
            validate_transition(ShipmentState::AsignadoACourier, ShipmentState::NoEntregado, &fields).unwrap();
        assert_eq!(details.comment.as_deref(), Some("  No había nadie en el domicilio. "));
        assert_eq!(details.photo_reference.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(details.recipient_name, None);
    }

    #[test]
    fn not_delivered_without_comment_is_accepted() {
        let details = validate_transition(
            ShipmentState::AsignadoACourier,
            ShipmentState::NoEntregado,
            &TransitionFields::default(),
        )
        .unwrap();
        assert_eq!(details, TransitionDetails::default());
    }

    #[test]
    fn retry_loop_is_legal() {
        assert!(is_legal(ShipmentState::NoEntregado, ShipmentState::AsignadoACourier));
        assert!(!is_legal(ShipmentState::NoEntregado, ShipmentState::Entregado));
        assert!(allowed_targets(ShipmentState::Entregado).is_empty());
    }

    fn any_state() -> impl Strategy<Value = ShipmentState> {
        prop::sample::select(ShipmentState::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn illegal_pairs_always_fail_with_invalid_transition(from in any_state(), to in any_state()) {
            let result = validate_transition(from, to, &recipient("X", "Y"));
            if is_legal(from, to) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(
                    result.unwrap_err(),
                    DomainError::invalid_transition(from.as_str(), to.as_str())
                );
            }
        }

        #[test]
        fn nothing_leaves_entregado(to in any_state()) {
            prop_assert!(validate_transition(ShipmentState::Entregado, to, &recipient("X", "Y")).is_err());
        }
    }
}
