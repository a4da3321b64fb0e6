// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup for the training database.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.

use std::path::Path;

use geoask_core::GeoaskError;
use tokio_rusqlite::Connection;
use tracing::info;

use crate::migrations::run_migrations;

/// Converts tokio-rusqlite errors into [`GeoaskError::Storage`].
pub(crate) fn storage_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> GeoaskError {
    GeoaskError::Storage {
        source: Box::new(e),
    }
}

/// Opens (creating if needed) the training database, enables WAL mode, and
/// runs pending migrations.
pub async fn open_training_db(path: &str) -> Result<Connection, GeoaskError> {
    if path != ":memory:"
        && let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| GeoaskError::Storage {
                source: Box::new(e),
            })?;
    }

    let conn = Connection::open(path)
        .await
        .map_err(|e| GeoaskError::Storage {
            source: Box::new(e),
        })?;

    let migrated = conn
        .call(|conn| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok::<_, rusqlite::Error>(run_migrations(conn))
        })
        .await
        .map_err(storage_err)?;
    migrated?;

    info!(path, "training database ready");
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/training.db");
        let path = path.to_str().unwrap();
        open_training_db(path).await.unwrap();
        assert!(std::path::Path::new(path).exists());
    }

    #[tokio::test]
    async fn reopen_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training.db");
        let path = path.to_str().unwrap();
        let conn = open_training_db(path).await.unwrap();
        drop(conn);
        open_training_db(path).await.unwrap();
    }
}
