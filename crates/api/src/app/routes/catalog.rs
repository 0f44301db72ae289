//! Fixed value lists for form dropdowns and filters.

use axum::Json;
use serde_json::{json, Value};

use envios_shipments::{Department, Reason, ShipmentState};

pub async fn departments() -> Json<Value> {
    Json(json!({ "departamentos": Department::ALL.iter().map(Department::as_str).collect::<Vec<_>>() }))
}

pub async fn reasons() -> Json<Value> {
    Json(json!({ "motivos": Reason::ALL.iter().map(Reason::as_str).collect::<Vec<_>>() }))
}

pub async fn states() -> Json<Value> {
    Json(json!({ "estados": ShipmentState::ALL.iter().map(ShipmentState::as_str).collect::<Vec<_>>() }))
}
