use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use envios_auth::NewUser;
use envios_core::UserId;

use crate::app::dto::UserView;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<Json<UserView>> {
    let Json(body) = body?;
    let user = services.users.create(body, principal.principal()).await?;
    Ok(Json(UserView::from(user)))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult<Json<Vec<UserView>>> {
    let users = services.users.list_active(principal.principal()).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    services.users.deactivate(id, principal.principal()).await?;
    Ok(Json(json!({ "message": "Usuario desactivado" })))
}
