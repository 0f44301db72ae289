//! Postgres-backed stores.
//!
//! Shipments and messages are kept as JSONB documents next to the handful of
//! columns that listings filter and sort on. Users are plain columns.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |
//!
//! A conditional transition that matches no row is disambiguated with a
//! follow-up existence check into `Conflict` or `NotFound`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use envios_auth::{Role, User};
use envios_core::{ShipmentId, UserId};
use envios_shipments::{
    HistoryEntry, OutboundMessage, Pagination, Shipment, ShipmentFilter, ShipmentState, ShipmentUpdate,
};

use super::{MessageStore, ShipmentStore, StoreError, UserStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS envios (
        id UUID PRIMARY KEY,
        ticket TEXT NOT NULL,
        estado TEXT NOT NULL,
        departamento TEXT NOT NULL,
        motivo TEXT NOT NULL,
        fecha_carga TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS envios_fecha_carga_idx ON envios (fecha_carga DESC)",
    "CREATE INDEX IF NOT EXISTS envios_ticket_idx ON envios (ticket)",
    r#"
    CREATE TABLE IF NOT EXISTS usuarios (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        nombre TEXT NOT NULL,
        rol TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        activo BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS mensajes (
        id UUID PRIMARY KEY,
        envio_id UUID NOT NULL,
        fecha TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS mensajes_envio_idx ON mensajes (envio_id, fecha DESC)",
];

/// One pool, all three stores.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; clone freely.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn shipment_exists(&self, id: ShipmentId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM envios WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("shipment_exists", e))?;
        Ok(row.is_some())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn to_json<T: serde::Serialize>(operation: &str, value: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::Backend(format!("failed to encode document in {operation}: {e}")))
}

fn from_doc<T: DeserializeOwned>(operation: &str, row: &PgRow) -> Result<T, StoreError> {
    let doc: JsonValue = row
        .try_get("doc")
        .map_err(|e| map_sqlx_error(operation, e))?;
    serde_json::from_value(doc)
        .map_err(|e| StoreError::Backend(format!("failed to decode document in {operation}: {e}")))
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let get_err = |e| map_sqlx_error("user_from_row", e);
    let role: String = row.try_get("rol").map_err(get_err)?;
    let role: Role = role
        .parse()
        .map_err(|e| StoreError::Backend(format!("stored role is invalid: {e}")))?;

    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(get_err)?),
        username: row.try_get("username").map_err(get_err)?,
        display_name: row.try_get("nombre").map_err(get_err)?,
        role,
        password_hash: row.try_get("password_hash").map_err(get_err)?,
        active: row.try_get("activo").map_err(get_err)?,
        created_at: row.try_get("created_at").map_err(get_err)?,
    })
}

/// Bind parameters shared by `list` and `count`: $1..$5.
struct FilterParams {
    department: Option<&'static str>,
    reason: Option<&'static str>,
    state: Option<&'static str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl From<&ShipmentFilter> for FilterParams {
    fn from(filter: &ShipmentFilter) -> Self {
        let (from, to) = filter.created_bounds();
        Self {
            department: filter.department.map(|d| d.as_str()),
            reason: filter.reason.map(|r| r.as_str()),
            state: filter.state.map(|s| s.as_str()),
            from,
            to,
        }
    }
}

const FILTER_CLAUSE: &str = r#"
    ($1::text IS NULL OR departamento = $1)
    AND ($2::text IS NULL OR motivo = $2)
    AND ($3::text IS NULL OR estado = $3)
    AND ($4::timestamptz IS NULL OR fecha_carga >= $4)
    AND ($5::timestamptz IS NULL OR fecha_carga <= $5)
"#;

#[async_trait]
impl ShipmentStore for PostgresStore {
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id), err)]
    async fn insert(&self, shipment: &Shipment) -> Result<(), StoreError> {
        let doc = to_json("insert_shipment", shipment)?;
        sqlx::query(
            r#"
            INSERT INTO envios (id, ticket, estado, departamento, motivo, fecha_carga, doc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(shipment.id.as_uuid())
        .bind(&shipment.ticket)
        .bind(shipment.state.as_str())
        .bind(shipment.department.as_str())
        .bind(shipment.reason.as_str())
        .bind(shipment.created_at)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_shipment", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(shipment_id = %id), err)]
    async fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        let row = sqlx::query("SELECT doc FROM envios WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_shipment", e))?;
        row.as_ref().map(|r| from_doc("get_shipment", r)).transpose()
    }

    /// One statement: the WHERE clause carries the state precondition, the
    /// SET clause updates the column and appends to the document's history.
    #[instrument(skip(self, entry), fields(shipment_id = %id, expected = %expected, target = %entry.state), err)]
    async fn apply_transition(
        &self,
        id: ShipmentId,
        expected: ShipmentState,
        entry: &HistoryEntry,
    ) -> Result<Shipment, StoreError> {
        let entry_doc = to_json("apply_transition", entry)?;
        let row = sqlx::query(
            r#"
            UPDATE envios
            SET estado = $3,
                doc = jsonb_set(
                    doc || jsonb_build_object('estado', $3::text),
                    '{historial_estados}',
                    (doc -> 'historial_estados') || jsonb_build_array($4::jsonb)
                )
            WHERE id = $1 AND estado = $2
            RETURNING doc
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(entry.state.as_str())
        .bind(entry_doc)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("apply_transition", e))?;

        match row {
            Some(row) => from_doc("apply_transition", &row),
            None if self.shipment_exists(id).await? => Err(StoreError::Conflict(format!(
                "shipment {id} is no longer '{expected}'"
            ))),
            None => Err(StoreError::NotFound(format!("shipment {id}"))),
        }
    }

    #[instrument(skip(self, update), fields(shipment_id = %id), err)]
    async fn update_fields(&self, id: ShipmentId, update: &ShipmentUpdate) -> Result<Shipment, StoreError> {
        let patch = to_json("update_fields", update)?;
        let row = sqlx::query(
            r#"
            UPDATE envios
            SET doc = doc || $2::jsonb,
                ticket = COALESCE($3, ticket),
                departamento = COALESCE($4, departamento),
                motivo = COALESCE($5, motivo)
            WHERE id = $1
            RETURNING doc
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch)
        .bind(update.ticket.as_deref())
        .bind(update.department.map(|d| d.as_str()))
        .bind(update.reason.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_fields", e))?;

        match row {
            Some(row) => from_doc("update_fields", &row),
            None => Err(StoreError::NotFound(format!("shipment {id}"))),
        }
    }

    #[instrument(skip(self), fields(shipment_id = %id), err)]
    async fn delete(&self, id: ShipmentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM envios WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_shipment", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(
        &self,
        filter: &ShipmentFilter,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Shipment>, StoreError> {
        let params = FilterParams::from(filter);
        let sql = format!(
            "SELECT doc FROM envios WHERE {FILTER_CLAUSE} ORDER BY fecha_carga DESC, id DESC LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query(&sql)
            .bind(params.department)
            .bind(params.reason)
            .bind(params.state)
            .bind(params.from)
            .bind(params.to)
            .bind(pagination.map(|p| i64::from(p.limit)))
            .bind(pagination.map(|p| i64::from(p.skip)).unwrap_or(0))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_shipments", e))?;

        rows.iter().map(|r| from_doc("list_shipments", r)).collect()
    }

    #[instrument(skip(self), err)]
    async fn count(&self, filter: &ShipmentFilter) -> Result<u64, StoreError> {
        let params = FilterParams::from(filter);
        let sql = format!("SELECT COUNT(*) AS total FROM envios WHERE {FILTER_CLAUSE}");
        let row = sqlx::query(&sql)
            .bind(params.department)
            .bind(params.reason)
            .bind(params.state)
            .bind(params.from)
            .bind(params.to)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_shipments", e))?;
        let total: i64 = row.try_get("total").map_err(|e| map_sqlx_error("count_shipments", e))?;
        Ok(total.max(0) as u64)
    }

    #[instrument(skip(self), err)]
    async fn find_latest_by_ticket(&self, ticket: &str) -> Result<Option<Shipment>, StoreError> {
        let row = sqlx::query(
            "SELECT doc FROM envios WHERE ticket = $1 ORDER BY fecha_carga DESC, id DESC LIMIT 1",
        )
        .bind(ticket)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_latest_by_ticket", e))?;
        row.as_ref().map(|r| from_doc("find_latest_by_ticket", r)).transpose()
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO usuarios (id, username, nombre, rol, password_hash, activo, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert_user", e) {
            StoreError::Duplicate(_) => StoreError::Duplicate(format!("username '{}'", user.username)),
            other => other,
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM usuarios WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM usuarios WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_username", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_active(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT * FROM usuarios WHERE activo ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_active_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn deactivate(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE usuarios SET activo = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("deactivate_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MessageStore for PostgresStore {
    #[instrument(skip(self, message), fields(shipment_id = %message.shipment_id), err)]
    async fn insert(&self, message: &OutboundMessage) -> Result<(), StoreError> {
        let doc = to_json("insert_message", message)?;
        sqlx::query("INSERT INTO mensajes (id, envio_id, fecha, doc) VALUES ($1, $2, $3, $4)")
            .bind(message.id.as_uuid())
            .bind(message.shipment_id.as_uuid())
            .bind(message.timestamp)
            .bind(doc)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_message", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self, pagination: Pagination) -> Result<Vec<OutboundMessage>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM mensajes ORDER BY fecha DESC, id DESC LIMIT $1 OFFSET $2")
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.skip))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_messages", e))?;
        rows.iter().map(|r| from_doc("list_messages", r)).collect()
    }

    #[instrument(skip(self), fields(shipment_id = %shipment_id), err)]
    async fn list_for_shipment(&self, shipment_id: ShipmentId) -> Result<Vec<OutboundMessage>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM mensajes WHERE envio_id = $1 ORDER BY fecha DESC, id DESC")
            .bind(shipment_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_shipment_messages", e))?;
        rows.iter().map(|r| from_doc("list_shipment_messages", r)).collect()
    }
}
