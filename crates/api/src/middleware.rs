use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use envios_auth::JwtValidator;
use envios_infra::UserService;

use crate::app::errors::{json_error, service_error_to_response};
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub users: UserService,
}

/// Require a valid bearer token for a live account and attach the
/// [`PrincipalContext`].
///
/// Missing, malformed, expired or wrongly signed tokens all answer 401, and
/// so do tokens of accounts that were deactivated or no longer exist.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).ok_or_else(|| {
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "missing bearer token")
    })?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        debug!(error = %e, "token rejected");
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
    })?;

    let principal = state.users.resolve(&claims.principal()).await.map_err(|e| {
        debug!(user_id = %claims.sub, error = %e, "token holder rejected");
        service_error_to_response(e)
    })?;

    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();

    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_bearer(&headers("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer(&headers("bearer abc ")), Some("abc"));
        assert_eq!(extract_bearer(&headers("Basic abc")), None);
        assert_eq!(extract_bearer(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
