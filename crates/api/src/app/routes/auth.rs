use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};

use crate::app::dto::{LoginRequest, LoginResponse, UserView};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(body) = body?;
    let session = services.users.login(&body.username, &body.password).await?;

    Ok(Json(LoginResponse {
        access_token: session.token,
        token_type: "bearer",
        user: session.user.into(),
    }))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult<Json<UserView>> {
    let user = services.users.me(principal.principal()).await?;
    Ok(Json(user.into()))
}
