//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store backend selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and query parsing
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use envios_auth::Hs256JwtValidator;
use envios_infra::{AppConfig, ServiceError};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router around already-built services.
pub fn router(services: Arc<AppServices>, config: &AppConfig) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes().to_vec()));
    let auth_state = middleware::AuthState {
        jwt,
        users: services.users.clone(),
    };

    // Protected routes: require a valid bearer token of an active account.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = routes::public_router().merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(config))
                .layer(Extension(services)),
        )
}

/// Browser access for the configured origins. Credentials are never
/// allowed: the API authenticates with bearer headers, not cookies.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build services for `config` and the router on top of them (public
/// entrypoint used by `main.rs` and the black-box tests).
pub async fn build_app(config: &AppConfig) -> Result<(Router, Arc<AppServices>), ServiceError> {
    let services = services::build_services(config).await?;
    Ok((router(services.clone(), config), services))
}
