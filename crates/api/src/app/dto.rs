use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use envios_auth::{Role, User};
use envios_core::{DomainError, DomainResult, UserId};
use envios_shipments::{Pagination, ShipmentFilter, ShipmentState, TransitionFields};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStateRequest {
    pub nuevo_estado: String,
    #[serde(flatten)]
    pub fields: TransitionFields,
}

impl ChangeStateRequest {
    pub fn target(&self) -> DomainResult<ShipmentState> {
        self.nuevo_estado.trim().parse()
    }
}

/// Listing/export query string. Everything arrives as text and is parsed
/// here so bad values become field errors.
#[derive(Debug, Default, Deserialize)]
pub struct ShipmentQuery {
    pub departamento: Option<String>,
    pub motivo: Option<String>,
    pub estado: Option<String>,
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accepts a plain `YYYY-MM-DD` or a full RFC 3339 timestamp (its UTC day).
fn parse_day(field: &str, raw: &str) -> DomainResult<NaiveDate> {
    if let Ok(day) = raw.parse::<NaiveDate>() {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| DomainError::validation(field, "expected YYYY-MM-DD"))
}

impl ShipmentQuery {
    pub fn filter(&self) -> DomainResult<ShipmentFilter> {
        Ok(ShipmentFilter {
            department: blank_to_none(&self.departamento).map(str::parse).transpose()?,
            reason: blank_to_none(&self.motivo).map(str::parse).transpose()?,
            state: blank_to_none(&self.estado).map(str::parse).transpose()?,
            created_from: blank_to_none(&self.fecha_desde)
                .map(|v| parse_day("fecha_desde", v))
                .transpose()?,
            created_to: blank_to_none(&self.fecha_hasta)
                .map(|v| parse_day("fecha_hasta", v))
                .transpose()?,
        })
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.skip)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.skip)
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// Public view of an account (never includes the password hash).
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub nombre: String,
    pub rol: Role,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            nombre: user.display_name,
            rol: user.role,
            activo: user.active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserView,
}
