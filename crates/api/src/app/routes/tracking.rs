use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    Json,
};

use envios_shipments::TrackingView;

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Public shipment tracking by ticket.
pub async fn track(
    Extension(services): Extension<Arc<AppServices>>,
    Path(ticket): Path<String>,
) -> ApiResult<Json<TrackingView>> {
    Ok(Json(services.shipments.track(&ticket).await?))
}
