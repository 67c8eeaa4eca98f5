//! PostgreSQL audit store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use faultline_core::{
    AuditId, ErrorKind, ErrorOrigin, ErrorRecord, NewErrorRecord, Severity,
};

use crate::config::DatabaseConfig;
use crate::error::{AuditError, AuditResult};

use super::{AuditStore, ErrorFilter};

const RECORD_COLUMNS: &str = "id, error_type, severity, source, error_code, error_message, \
     stack_trace, endpoint, http_method, http_status, user_agent, ip_address, \
     context_data, environment, user_id, session_id, request_id, created_at, \
     resolved, resolved_at, resolved_by";

/// PostgreSQL-backed audit store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to PostgreSQL and create a new store.
    ///
    /// The required table and indexes are created if they don't exist.
    pub async fn new(config: &DatabaseConfig) -> AuditResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;

        Ok(store)
    }

    /// Create a store from an existing connection pool.
    pub async fn from_pool(pool: PgPool) -> AuditResult<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Ensure the table and its indexes exist.
    ///
    /// The index set mirrors the supported query patterns: one composite
    /// index per filterable column paired with `created_at`, plus a bare
    /// descending `created_at` index for reverse-chronological paging.
    async fn ensure_schema(&self) -> AuditResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS error_audits (
                id TEXT PRIMARY KEY,
                error_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                source TEXT NOT NULL,
                error_code TEXT NOT NULL,
                error_message TEXT NOT NULL,
                stack_trace TEXT,
                endpoint TEXT,
                http_method TEXT,
                http_status INTEGER,
                user_agent TEXT,
                ip_address TEXT,
                context_data JSONB NOT NULL DEFAULT '{}'::jsonb,
                environment TEXT NOT NULL DEFAULT 'production',
                user_id TEXT,
                session_id TEXT,
                request_id TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                resolved BOOLEAN NOT NULL DEFAULT FALSE,
                resolved_at TIMESTAMPTZ,
                resolved_by TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_error_audits_type_created
             ON error_audits (error_type, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_error_audits_severity_created
             ON error_audits (severity, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_error_audits_user_created
             ON error_audits (user_id, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_error_audits_endpoint_created
             ON error_audits (endpoint, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_error_audits_resolved_created
             ON error_audits (resolved, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_error_audits_created_at
             ON error_audits (created_at DESC)",
        ];

        for statement in indexes {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Parse a row into an [`ErrorRecord`].
    fn row_to_record(row: &sqlx::postgres::PgRow) -> AuditResult<ErrorRecord> {
        let error_type: String = row.get("error_type");
        let severity: String = row.get("severity");
        let source: String = row.get("source");
        let context_data: serde_json::Value = row.get("context_data");

        let context_data = match context_data {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        Ok(ErrorRecord {
            id: AuditId::new(row.get::<String, _>("id")),
            error_type: error_type
                .parse::<ErrorKind>()
                .map_err(|e| AuditError::serialisation(e.to_string()))?,
            severity: severity
                .parse::<Severity>()
                .map_err(|e| AuditError::serialisation(e.to_string()))?,
            source: source
                .parse::<ErrorOrigin>()
                .map_err(|e| AuditError::serialisation(e.to_string()))?,
            error_code: row.get("error_code"),
            error_message: row.get("error_message"),
            stack_trace: row.get("stack_trace"),
            endpoint: row.get("endpoint"),
            http_method: row.get("http_method"),
            http_status: row.get("http_status"),
            user_agent: row.get("user_agent"),
            ip_address: row.get("ip_address"),
            context_data,
            environment: row.get("environment"),
            user_id: row.get("user_id"),
            session_id: row.get("session_id"),
            request_id: row.get("request_id"),
            created_at: row.get("created_at"),
            resolved: row.get("resolved"),
            resolved_at: row.get("resolved_at"),
            resolved_by: row.get("resolved_by"),
        })
    }

    async fn insert_record(
        executor: impl sqlx::PgExecutor<'_>,
        record: &ErrorRecord,
    ) -> AuditResult<()> {
        sqlx::query(
            r#"
            INSERT INTO error_audits (
                id, error_type, severity, source, error_code, error_message,
                stack_trace, endpoint, http_method, http_status, user_agent,
                ip_address, context_data, environment, user_id, session_id,
                request_id, created_at, resolved, resolved_at, resolved_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.error_type.as_str())
        .bind(record.severity.as_str())
        .bind(record.source.as_str())
        .bind(&record.error_code)
        .bind(&record.error_message)
        .bind(&record.stack_trace)
        .bind(&record.endpoint)
        .bind(&record.http_method)
        .bind(record.http_status)
        .bind(&record.user_agent)
        .bind(&record.ip_address)
        .bind(serde_json::Value::Object(record.context_data.clone()))
        .bind(&record.environment)
        .bind(&record.user_id)
        .bind(&record.session_id)
        .bind(&record.request_id)
        .bind(record.created_at)
        .bind(record.resolved)
        .bind(record.resolved_at)
        .bind(&record.resolved_by)
        .execute(executor)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    async fn insert(&self, record: NewErrorRecord) -> AuditResult<ErrorRecord> {
        record.validate()?;
        let record = record.into_record();

        Self::insert_record(&self.pool, &record).await?;

        Ok(record)
    }

    async fn insert_batch(&self, batch: Vec<NewErrorRecord>) -> AuditResult<Vec<AuditId>> {
        for record in &batch {
            record.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(batch.len());

        for record in batch {
            let record = record.into_record();
            Self::insert_record(&mut *tx, &record).await?;
            ids.push(record.id);
        }

        tx.commit().await?;

        Ok(ids)
    }

    async fn get(&self, id: &AuditId) -> AuditResult<Option<ErrorRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM error_audits WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_record(&r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &ErrorFilter) -> AuditResult<Vec<ErrorRecord>> {
        let mut query = format!("SELECT {RECORD_COLUMNS} FROM error_audits WHERE 1=1");

        // All parameters are bound as text; typed columns take an explicit
        // cast in the predicate.
        let mut params: Vec<String> = Vec::new();

        if let Some(error_type) = filter.error_type {
            params.push(error_type.as_str().to_owned());
            query.push_str(&format!(" AND error_type = ${}", params.len()));
        }

        if let Some(severity) = filter.severity {
            params.push(severity.as_str().to_owned());
            query.push_str(&format!(" AND severity = ${}", params.len()));
        }

        if let Some(ref user_id) = filter.user_id {
            params.push(user_id.clone());
            query.push_str(&format!(" AND user_id = ${}", params.len()));
        }

        if let Some(ref endpoint) = filter.endpoint {
            params.push(endpoint.clone());
            query.push_str(&format!(" AND endpoint = ${}", params.len()));
        }

        if let Some(resolved) = filter.resolved {
            params.push(resolved.to_string());
            query.push_str(&format!(" AND resolved = ${}::boolean", params.len()));
        }

        if let Some(start_time) = filter.start_time {
            params.push(start_time.to_rfc3339());
            query.push_str(&format!(" AND created_at >= ${}::timestamptz", params.len()));
        }

        if let Some(end_time) = filter.end_time {
            params.push(end_time.to_rfc3339());
            query.push_str(&format!(" AND created_at < ${}::timestamptz", params.len()));
        }

        query.push_str(" ORDER BY created_at DESC");

        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = filter.offset {
            query.push_str(&format!(" OFFSET {offset}"));
        }

        let mut sqlx_query = sqlx::query(&query);
        for param in &params {
            sqlx_query = sqlx_query.bind(param);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn resolve(&self, id: &AuditId, resolved_by: &str) -> AuditResult<ErrorRecord> {
        // The predicate makes the stamp write-once: a second resolve matches
        // no row and the later SELECT returns the original stamps.
        sqlx::query(
            r#"
            UPDATE error_audits
            SET resolved = TRUE, resolved_at = NOW(), resolved_by = $2
            WHERE id = $1 AND resolved = FALSE
            "#,
        )
        .bind(id.as_str())
        .bind(resolved_by)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM error_audits WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Self::row_to_record(&r),
            None => Err(AuditError::RecordNotFound(id.to_string())),
        }
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AuditResult<u64> {
        let result = sqlx::query("DELETE FROM error_audits WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::{ErrorKind, ErrorOrigin, Severity};

    fn get_database_url() -> Option<String> {
        std::env::var("DATABASE_URL").ok()
    }

    async fn connect() -> PostgresStore {
        let url = get_database_url().expect("DATABASE_URL not set");
        let config = DatabaseConfig {
            url,
            ..DatabaseConfig::default()
        };
        PostgresStore::new(&config).await.expect("failed to connect")
    }

    fn test_record(message: &str) -> NewErrorRecord {
        NewErrorRecord::new(
            ErrorKind::ApiError,
            Severity::High,
            ErrorOrigin::Backend,
            "API_CALL_FAILED",
            message,
        )
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set DATABASE_URL)"]
    async fn insert_and_get() {
        let store = connect().await;

        let record = store
            .insert(test_record("pg boom").with_endpoint("/bookings"))
            .await
            .expect("insert failed");

        let retrieved = store
            .get(&record.id)
            .await
            .expect("get failed")
            .expect("record not found");

        assert_eq!(retrieved.error_message, "pg boom");
        assert_eq!(retrieved.error_type, ErrorKind::ApiError);
        assert!(!retrieved.resolved);

        store
            .purge_before(retrieved.created_at + chrono::Duration::seconds(1))
            .await
            .expect("cleanup failed");
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set DATABASE_URL)"]
    async fn resolve_is_idempotent() {
        let store = connect().await;

        let record = store.insert(test_record("pg resolve")).await.expect("insert failed");

        let resolved = store
            .resolve(&record.id, "ops@example.com")
            .await
            .expect("resolve failed");
        let first_stamp = resolved.resolved_at.expect("resolved_at not set");

        let again = store
            .resolve(&record.id, "someone-else")
            .await
            .expect("second resolve failed");
        assert_eq!(again.resolved_at, Some(first_stamp));
        assert_eq!(again.resolved_by.as_deref(), Some("ops@example.com"));

        store
            .purge_before(record.created_at + chrono::Duration::seconds(1))
            .await
            .expect("cleanup failed");
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set DATABASE_URL)"]
    async fn list_with_filters() {
        let store = connect().await;

        let record = store
            .insert(test_record("pg filtered").with_user("pg-test-user"))
            .await
            .expect("insert failed");

        let by_user = store
            .list(
                &ErrorFilter::new()
                    .with_user("pg-test-user")
                    .with_error_type(ErrorKind::ApiError),
            )
            .await
            .expect("list failed");
        assert!(by_user.iter().any(|r| r.id == record.id));

        store
            .purge_before(record.created_at + chrono::Duration::seconds(1))
            .await
            .expect("cleanup failed");
    }
}
