use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use envios_shipments::MAX_PHOTO_BYTES;

pub mod auth;
pub mod catalog;
pub mod messages;
pub mod shipments;
pub mod system;
pub mod tracking;
pub mod users;

/// Endpoints that need no token.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .route("/departamentos", get(catalog::departments))
        .route("/motivos", get(catalog::reasons))
        .route("/estados", get(catalog::states))
        .route("/tracking/:ticket", get(tracking::track))
}

/// Endpoints behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/:id", delete(users::deactivate_user))
        .route("/envios", post(shipments::create_shipment).get(shipments::list_shipments))
        .route("/envios/count", get(shipments::count_shipments))
        .route("/envios/export/excel", get(shipments::export_shipments))
        .route(
            "/envios/:id",
            get(shipments::get_shipment)
                .put(shipments::update_shipment)
                .delete(shipments::delete_shipment),
        )
        .route("/envios/:id/estado", patch(shipments::change_state))
        .route("/envios/:id/excel", get(shipments::export_shipment))
        .route(
            "/envios/:id/upload-image",
            // Room for the multipart framing around a maximum-size image.
            post(shipments::upload_image).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + 64 * 1024)),
        )
        .route("/messages", get(messages::list_all))
        .route("/messages/:envio_id", get(messages::list_for_shipment))
}
