//! PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{AccountStore, LogStore};
use crate::error::{AppError, Result};
use crate::models::log_record::{LogRecord, Metadata, NewLogRecord};
use crate::models::user::{AuthToken, User};
use crate::services::log_filter::LogFilter;

const RECORD_COLUMNS: &str =
    r#"id, level, message, resource_id, "timestamp", trace_id, span_id, "commit", metadata"#;

#[derive(FromRow)]
struct LogRecordRow {
    id: Uuid,
    level: String,
    message: String,
    resource_id: String,
    timestamp: DateTime<Utc>,
    trace_id: String,
    span_id: String,
    commit: String,
    metadata: Json<Metadata>,
}

impl From<LogRecordRow> for LogRecord {
    fn from(row: LogRecordRow) -> Self {
        Self {
            id: row.id,
            level: row.level,
            message: row.message,
            resource_id: row.resource_id,
            timestamp: row.timestamp,
            trace_id: row.trace_id,
            span_id: row.span_id,
            commit: row.commit,
            metadata: row.metadata.0,
        }
    }
}

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LogStore for PgStore {
    async fn insert(&self, record: NewLogRecord) -> Result<LogRecord> {
        let row = sqlx::query_as::<_, LogRecordRow>(&format!(
            r#"
            INSERT INTO log_records
                (id, level, message, resource_id, "timestamp", trace_id, span_id, "commit", metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&record.level)
        .bind(&record.message)
        .bind(&record.resource_id)
        .bind(record.timestamp)
        .bind(&record.trace_id)
        .bind(&record.span_id)
        .bind(&record.commit)
        .bind(Json(&record.metadata))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<LogRecord>> {
        let row = sqlx::query_as::<_, LogRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM log_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update(&self, id: Uuid, record: NewLogRecord) -> Result<Option<LogRecord>> {
        let row = sqlx::query_as::<_, LogRecordRow>(&format!(
            r#"
            UPDATE log_records
            SET level = $2, message = $3, resource_id = $4, "timestamp" = $5,
                trace_id = $6, span_id = $7, "commit" = $8, metadata = $9
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&record.level)
        .bind(&record.message)
        .bind(&record.resource_id)
        .bind(record.timestamp)
        .bind(&record.trace_id)
        .bind(&record.span_id)
        .bind(&record.commit)
        .bind(Json(&record.metadata))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM log_records WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RECORD_COLUMNS} FROM log_records"
        ));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY seq");

        let rows = qb
            .build_query_as::<LogRecordRow>()
            .fetch_all(&self.db)
            .await?;

        let residual = filter.residual();
        let records = rows.into_iter().map(LogRecord::from);
        if residual.is_empty() {
            return Ok(records.collect());
        }
        Ok(records.filter(|r| residual.matches(r)).collect())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, is_active, is_admin, created_at";

#[async_trait]
impl AccountStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, password_hash, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("Username already exists".to_string());
                }
            }
            AppError::from(e)
        })
    }

    async fn get_or_create_token(&self, user_id: Uuid, candidate_key: &str) -> Result<AuthToken> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING key, user_id, created_at
            "#,
        )
        .bind(candidate_key)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(token)
    }

    async fn find_user_by_token(&self, key: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.password_hash, u.is_active, u.is_admin, u.created_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = $1 AND u.is_active = true
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }
}
