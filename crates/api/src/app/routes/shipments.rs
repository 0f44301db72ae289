use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Extension, Multipart, Path, Query,
    },
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use envios_core::{DomainError, ShipmentId};
use envios_infra::export::CONTENT_TYPE;
use envios_infra::ExportFile;
use envios_shipments::{NewShipment, PhotoUpload, Shipment, ShipmentPatch};

use crate::app::dto::{ChangeStateRequest, ShipmentQuery};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

fn attachment(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

pub async fn create_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewShipment>, JsonRejection>,
) -> ApiResult<Json<Shipment>> {
    let Json(body) = body?;
    Ok(Json(services.shipments.create(body, principal.principal()).await?))
}

pub async fn list_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ShipmentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Shipment>>> {
    let Query(query) = query?;
    let shipments = services
        .shipments
        .list(&query.filter()?, query.pagination(), principal.principal())
        .await?;
    Ok(Json(shipments))
}

pub async fn count_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ShipmentQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let count = services
        .shipments
        .count(&query.filter()?, principal.principal())
        .await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn get_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Shipment>> {
    let id: ShipmentId = id.parse()?;
    Ok(Json(services.shipments.get(id, principal.principal()).await?))
}

pub async fn update_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ShipmentPatch>, JsonRejection>,
) -> ApiResult<Json<Shipment>> {
    let id: ShipmentId = id.parse()?;
    let Json(body) = body?;
    Ok(Json(services.shipments.update(id, body, principal.principal()).await?))
}

pub async fn change_state(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ChangeStateRequest>, JsonRejection>,
) -> ApiResult<Json<Shipment>> {
    let id: ShipmentId = id.parse()?;
    let Json(body) = body?;
    let target = body.target()?;
    let updated = services
        .shipments
        .change_state(id, target, body.fields, principal.principal())
        .await?;
    Ok(Json(updated))
}

pub async fn delete_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: ShipmentId = id.parse()?;
    services.shipments.delete(id, principal.principal()).await?;
    Ok(Json(json!({ "message": "Envío eliminado exitosamente" })))
}

pub async fn export_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ShipmentQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let file = services
        .shipments
        .export(&query.filter()?, principal.principal())
        .await?;
    Ok(attachment(file))
}

pub async fn export_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ShipmentId = id.parse()?;
    let file = services.shipments.export_one(id, principal.principal()).await?;
    Ok(attachment(file))
}

/// Multipart upload with the image in the `file` part.
pub async fn upload_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let id: ShipmentId = id.parse()?;
    let photo = read_photo(multipart?).await?;
    let url = services
        .shipments
        .photo_reference(id, photo, principal.principal())
        .await?;
    Ok(Json(json!({ "imagen_url": url })))
}

async fn read_photo(mut multipart: Multipart) -> Result<PhotoUpload, DomainError> {
    let unreadable = |e: axum::extract::multipart::MultipartError| DomainError::validation("file", e.body_text());

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(unreadable)?;
        return PhotoUpload::new(&content_type, bytes.to_vec());
    }
    Err(DomainError::validation("file", "missing 'file' part"))
}
