// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Training data management commands.

use std::path::{Path, PathBuf};

use geoask_core::{GeoaskError, RetrievalStore};
use tracing::info;

/// What `geoask train` adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainInput {
    Ddl(PathBuf),
    Documentation(PathBuf),
    Pair { question: String, sql: String },
}

/// Adds training data and returns the new record ids.
pub async fn train(store: &dyn RetrievalStore, input: TrainInput) -> Result<Vec<String>, GeoaskError> {
    match input {
        TrainInput::Ddl(path) => {
            let text = read_file(&path).await?;
            let mut ids = Vec::new();
            for statement in split_statements(&text) {
                ids.push(store.add_ddl(&statement).await?);
            }
            if ids.is_empty() {
                return Err(GeoaskError::Config(format!(
                    "no statements found in {}",
                    path.display()
                )));
            }
            info!(count = ids.len(), path = %path.display(), "added DDL");
            Ok(ids)
        }
        TrainInput::Documentation(path) => {
            let text = read_file(&path).await?;
            let text = text.trim();
            if text.is_empty() {
                return Err(GeoaskError::Config(format!("{} is empty", path.display())));
            }
            Ok(vec![store.add_documentation(text).await?])
        }
        TrainInput::Pair { question, sql } => {
            Ok(vec![store.add_pair(question.trim(), sql.trim()).await?])
        }
    }
}

/// Removes a training record; `false` when the id is unknown.
pub async fn remove(store: &dyn RetrievalStore, id: &str) -> Result<bool, GeoaskError> {
    let removed = store.remove_pair(id).await?;
    if removed {
        info!(id, "removed training record");
    }
    Ok(removed)
}

async fn read_file(path: &Path) -> Result<String, GeoaskError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        GeoaskError::Config(format!("failed to read {}: {e}", path.display()))
    })
}

/// Splits a SQL script into `;`-terminated statements, dropping blanks.
fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s};"))
        .collect()
}
