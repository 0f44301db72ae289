use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "API de Gestión de Envíos - Uruguay" }))
}
