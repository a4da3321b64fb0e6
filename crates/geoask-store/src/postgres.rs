// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only SQL execution against a PostgreSQL analytics database.

use std::time::Duration;

use async_trait::async_trait;
use geoask_config::model::ExecutorConfig;
use geoask_core::{GeoaskError, QueryRows, SqlExecutor};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row};
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs generated statements through a small connection pool.
///
/// Every session starts with `default_transaction_read_only` on and a
/// server-side `statement_timeout`, so writes fail with a database error
/// and long scans are cancelled by the server.
pub struct PostgresExecutor {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresExecutor {
    /// Connects using `executor.url`.
    pub async fn connect(config: &ExecutorConfig) -> Result<Self, GeoaskError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| GeoaskError::Config("executor.url is not set".into()))?;
        let query_timeout = Duration::from_secs(config.query_timeout_secs);

        let options = url
            .parse::<PgConnectOptions>()
            .map_err(|e| GeoaskError::Config(format!("invalid executor.url: {e}")))?
            .options([
                ("default_transaction_read_only", "on".to_string()),
                (
                    "statement_timeout",
                    query_timeout.as_millis().to_string(),
                ),
            ]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| GeoaskError::Storage {
                source: Box::new(e),
            })?;

        info!(
            max_connections = config.max_connections,
            "analytics database connected read-only"
        );
        Ok(Self {
            pool,
            query_timeout,
        })
    }
}

#[async_trait]
impl SqlExecutor for PostgresExecutor {
    async fn run(&self, sql: &str) -> Result<QueryRows, GeoaskError> {
        // Client-side guard in case the server ignores statement_timeout.
        let fetched = tokio::time::timeout(
            self.query_timeout + Duration::from_secs(1),
            sqlx::query(sqlx::AssertSqlSafe(sql)).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| GeoaskError::Execution {
            message: format!("statement timed out after {:?}", self.query_timeout),
        })?;

        let rows = fetched.map_err(execution_err)?;
        let result = query_rows(&rows);
        debug!(
            rows = result.len(),
            columns = result.columns.len(),
            "statement executed"
        );
        Ok(result)
    }
}

/// SQL errors reported by the server go back to the model; anything else
/// (pool, I/O, protocol) is a storage failure.
fn execution_err(e: sqlx::Error) -> GeoaskError {
    match e {
        sqlx::Error::Database(db) => GeoaskError::Execution {
            message: db.message().to_string(),
        },
        other => GeoaskError::Storage {
            source: Box::new(other),
        },
    }
}

fn query_rows(rows: &[PgRow]) -> QueryRows {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| (0..row.columns().len()).map(|i| to_json(row, i)).collect())
        .collect();
    QueryRows { columns, rows }
}

/// Decodes a column by trying the common types in turn; anything else
/// (geometry, arrays, numeric) becomes `null`.
fn to_json(row: &PgRow, index: usize) -> serde_json::Value {
    use serde_json::Value;

    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index) {
        return v
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return v
            .map(|dt| Value::String(dt.to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
        return v
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null);
    }
    Value::Null
}
