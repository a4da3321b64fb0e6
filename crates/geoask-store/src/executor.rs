// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only SQL execution against an SQLite analytics database.

use async_trait::async_trait;
use geoask_core::{GeoaskError, QueryRows, SqlExecutor};
use rusqlite::OpenFlags;
use rusqlite::types::ValueRef;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::database::storage_err;

/// Runs generated statements on a database opened read-only.
///
/// Write statements fail with the database's read-only error, which is
/// reported as [`GeoaskError::Execution`] like any other SQL error.
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    pub async fn open(path: &str) -> Result<Self, GeoaskError> {
        if !std::path::Path::new(path).exists() {
            return Err(GeoaskError::Config(format!(
                "analytics database not found: {path}"
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .await
        .map_err(|e| GeoaskError::Storage {
            source: Box::new(e),
        })?;
        info!(path, "analytics database opened read-only");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn run(&self, sql: &str) -> Result<QueryRows, GeoaskError> {
        let sql = sql.to_string();
        let result = self
            .conn
            .call(move |conn| Ok::<_, rusqlite::Error>(query_rows(conn, &sql)))
            .await
            .map_err(storage_err)?;

        match result {
            Ok(rows) => {
                debug!(rows = rows.len(), columns = rows.columns.len(), "statement executed");
                Ok(rows)
            }
            Err(e) => Err(GeoaskError::Execution {
                message: e.to_string(),
            }),
        }
    }
}

fn query_rows(conn: &rusqlite::Connection, sql: &str) -> Result<QueryRows, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(to_json(row.get_ref(i)?));
        }
        rows.push(values);
    }
    Ok(QueryRows { columns, rows })
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<{} bytes>", b.len())),
    }
}
