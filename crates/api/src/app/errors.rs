use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use envios_core::DomainError;
use envios_infra::ServiceError;

/// Handler error: anything a service can fail with, rendered as JSON.
#[derive(Debug)]
pub struct ApiError(ServiceError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self(ServiceError::Domain(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self(ServiceError::Domain(DomainError::validation("body", value.body_text())))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self(ServiceError::Domain(DomainError::validation("query", value.body_text())))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(value: MultipartRejection) -> Self {
        Self(ServiceError::Domain(DomainError::validation("file", value.body_text())))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        service_error_to_response(self.0)
    }
}

pub fn service_error_to_response(err: ServiceError) -> Response {
    let code = match err {
        ServiceError::Domain(e) => return domain_error_to_response(e),
        ServiceError::Store(_) => "store_error",
        ServiceError::Export(_) => "export_error",
        ServiceError::Password(_) | ServiceError::Token(_) => "internal_error",
    };
    tracing::error!(error = %err, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::Validation { field, message } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": message,
                "field": field,
            })),
        )
            .into_response(),
        DomainError::InvalidTransition { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_transition", message)
        }
        DomainError::MissingRequiredFields(fields) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "missing_required_fields",
                "message": message,
                "fields": fields,
            })),
        )
            .into_response(),
        DomainError::Unauthenticated(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthenticated", msg),
        DomainError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
