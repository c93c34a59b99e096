//! Postgres-backed durable store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (any code) | `Query` |
//! | PoolClosed / PoolTimedOut / Io / Tls | `Unavailable` |
//! | ColumnDecode / Decode / ColumnNotFound | `Decode` |
//! | Other | `Query` |
//!
//! ## Thread Safety
//!
//! `PostgresDurableStore` is `Send + Sync`; the SQLx pool hands out
//! connections per call, so concurrent handlers append independently. Single
//! row inserts are atomic on their own and nothing here opens a transaction.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::{instrument, Span};

use fibcalc_core::Index;

use super::r#trait::{DurableStore, StoreError};

/// Postgres-backed append-only store of submitted indices.
///
/// Rows are ordered by a `BIGSERIAL` id, which gives `list_all` the insertion
/// order without relying on timestamps.
#[derive(Debug, Clone)]
pub struct PostgresDurableStore {
    pool: PgPool,
}

impl PostgresDurableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a fresh pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the table if it does not exist yet.
    ///
    /// Schema evolution is handled outside this crate; this only bootstraps
    /// an empty database.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submitted_indices (
                id           BIGSERIAL PRIMARY KEY,
                number       INTEGER NOT NULL CHECK (number >= 0),
                submitted_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;

        Ok(())
    }

    /// Load every row with its submission timestamp, oldest first.
    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    pub async fn list_rows(&self) -> Result<Vec<SubmittedRow>, StoreError> {
        let span = Span::current();

        let rows = sqlx::query(
            r#"
            SELECT id, number, submitted_at
            FROM submitted_indices
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_rows", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let decoded = SubmittedRow::from_row(&row)
                .map_err(|e| StoreError::Decode(format!("failed to decode row: {e}")))?;
            out.push(decoded);
        }

        span.record("row_count", out.len());
        Ok(out)
    }
}

/// One persisted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRow {
    pub id: i64,
    pub number: i32,
    pub submitted_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for SubmittedRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(SubmittedRow {
            id: row.try_get("id")?,
            number: row.try_get("number")?,
            submitted_at: row.try_get("submitted_at")?,
        })
    }
}

impl TryFrom<SubmittedRow> for Index {
    type Error = StoreError;

    fn try_from(row: SubmittedRow) -> Result<Self, Self::Error> {
        u32::try_from(row.number)
            .map(Index::from_stored)
            .map_err(|_| StoreError::Decode(format!("row {} holds negative number {}", row.id, row.number)))
    }
}

#[async_trait::async_trait]
impl DurableStore for PostgresDurableStore {
    #[instrument(skip(self), fields(index = %index), err)]
    async fn append(&self, index: Index) -> Result<(), StoreError> {
        let number = i32::try_from(index.value())
            .map_err(|_| StoreError::Query(format!("index {index} does not fit in INTEGER")))?;

        sqlx::query("INSERT INTO submitted_indices (number) VALUES ($1)")
            .bind(number)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("append", e))?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Index>, StoreError> {
        self.list_rows()
            .await?
            .into_iter()
            .map(Index::try_from)
            .collect()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Query(format!(
            "database error in {operation}: {} (code {})",
            db_err.message(),
            db_err.code().as_deref().unwrap_or("none")
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => {
            StoreError::Decode(format!("decode error in {operation}: {e}"))
        }
        other => StoreError::Query(format!("sqlx error in {operation}: {other}")),
    }
}
