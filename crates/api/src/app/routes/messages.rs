use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    Json,
};

use envios_core::ShipmentId;
use envios_shipments::OutboundMessage;

use crate::app::dto::PageQuery;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn list_all(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<OutboundMessage>>> {
    let Query(query) = query?;
    let messages = services
        .shipments
        .notifier()
        .list_all(query.pagination(), principal.principal())
        .await?;
    Ok(Json(messages))
}

pub async fn list_for_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(envio_id): Path<String>,
) -> ApiResult<Json<Vec<OutboundMessage>>> {
    let id: ShipmentId = envio_id.parse()?;
    let messages = services
        .shipments
        .notifier()
        .list_for_shipment(id, principal.principal())
        .await?;
    Ok(Json(messages))
}
