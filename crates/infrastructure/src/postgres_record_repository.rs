use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use congress_application::{PaginationWindow, Predicate, RecordRepository, ResolvedSortKey};
use congress_core::{AppError, AppResult};
use congress_domain::{EntityKind, Record};

mod predicate;

use predicate::{push_order_by, push_predicate};

/// PostgreSQL-backed store for congress records of every entity kind.
///
/// All kinds share the `records` table; declared fields live in the JSONB
/// `data` column while `id`, `created_at` and `updated_at` are columns.
#[derive(Clone)]
pub struct PostgresRecordRepository {
    pool: PgPool,
}

impl PostgresRecordRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: String,
    entity: String,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for Record {
    type Error = AppError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let entity = EntityKind::from_str(row.entity.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode entity '{}' of record '{}': {error}",
                row.entity, row.id
            ))
        })?;

        Record::new(row.id, entity, row.data, row.created_at, row.updated_at)
    }
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, kind: EntityKind, predicate: &Predicate) {
    builder.push(" WHERE records.entity = ");
    builder.push_bind(kind.as_str());
    builder.push(" AND ");
    push_predicate(builder, predicate);
}

#[async_trait]
impl RecordRepository for PostgresRecordRepository {
    async fn count_records(&self, kind: EntityKind, predicate: &Predicate) -> AppResult<u64> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM records");
        push_scope(&mut builder, kind, predicate);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count {kind} records: {error}"))
            })?;

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid {kind} record count: {error}")))
    }

    async fn fetch_records(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[ResolvedSortKey],
        window: PaginationWindow,
    ) -> AppResult<Vec<Record>> {
        let limit = i64::try_from(window.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(window.offset()).unwrap_or(i64::MAX);

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT records.id, records.entity, records.data, records.created_at, records.updated_at FROM records",
        );
        push_scope(&mut builder, kind, predicate);
        push_order_by(&mut builder, sort);
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        debug!(resource = %kind, sql = builder.sql(), "fetching records");

        let rows = builder
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to query {kind} records: {error}"))
            })?;

        rows.into_iter().map(Record::try_from).collect()
    }

    async fn find_record(&self, kind: EntityKind, record_id: &str) -> AppResult<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT id, entity, data, created_at, updated_at
            FROM records
            WHERE entity = $1 AND id = $2
            "#,
        )
        .bind(kind.as_str())
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find {kind} record '{record_id}': {error}"
            ))
        })?;

        row.map(Record::try_from).transpose()
    }

    async fn insert_record(&self, record: Record) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO records (entity, id, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.entity().as_str())
        .bind(record.record_id().as_str())
        .bind(record.data())
        .bind(record.created_at())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "{} record '{}' already exists",
                    record.entity(),
                    record.record_id()
                ));
            }

            AppError::Internal(format!("failed to insert record: {error}"))
        })?;

        Ok(())
    }

    async fn update_record(&self, record: Record) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE records
            SET data = $3, updated_at = $4
            WHERE entity = $1 AND id = $2
            "#,
        )
        .bind(record.entity().as_str())
        .bind(record.record_id().as_str())
        .bind(record.data())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update record: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} record '{}' does not exist",
                record.entity(),
                record.record_id()
            )));
        }

        Ok(())
    }

    async fn delete_record(&self, kind: EntityKind, record_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM records WHERE entity = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to delete {kind} record '{record_id}': {error}"
                ))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
