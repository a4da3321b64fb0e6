// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed training data store with FTS5 for BM25 retrieval.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use geoask_config::model::PromptConfig;
use geoask_core::{GeoaskError, QuestionSql, RetrievalStore, TrainingKind, TrainingRecord};
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::database::storage_err;

/// Maximum number of records returned by each related-context lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalLimits {
    pub examples: usize,
    pub ddl: usize,
    pub documentation: usize,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            examples: 10,
            ddl: 10,
            documentation: 10,
        }
    }
}

impl From<&PromptConfig> for RetrievalLimits {
    fn from(config: &PromptConfig) -> Self {
        Self {
            examples: config.max_examples,
            ddl: config.max_ddl,
            documentation: config.max_documentation,
        }
    }
}

/// Persistent store for training data in SQLite.
///
/// `find_similar` matches the normalized question exactly. Related
/// lookups rank by BM25 over question and content, falling back to the
/// most recent records when the keyword search finds nothing.
pub struct SqliteRetrievalStore {
    conn: Connection,
    limits: RetrievalLimits,
}

impl SqliteRetrievalStore {
    /// Wraps a connection that already has migrations applied
    /// (see [`crate::open_training_db`]).
    pub fn new(conn: Connection, limits: RetrievalLimits) -> Self {
        Self { conn, limits }
    }

    async fn insert(
        &self,
        kind: TrainingKind,
        question: Option<&str>,
        content: &str,
    ) -> Result<String, GeoaskError> {
        let id = format!("{}-{}", uuid::Uuid::new_v4(), id_suffix(kind));
        let kind_str = kind.to_string();
        let question = question.map(str::to_string);
        let question_norm = question.as_deref().map(normalize_question);
        let content = content.to_string();
        let created_at = Utc::now().to_rfc3339();

        let row_id = id.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO training_data (id, kind, question, question_norm, content, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![row_id, kind_str, question, question_norm, content, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)?;

        info!(id = id.as_str(), kind = %kind, "training record stored");
        Ok(id)
    }

    /// Keyword search within one kind, newest first when nothing matches.
    async fn related(
        &self,
        kind: TrainingKind,
        question: &str,
        limit: usize,
    ) -> Result<Vec<(Option<String>, String)>, GeoaskError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let kind_str = kind.to_string();
        let fts_query = fts_query(question);
        let limit = limit as i64;

        let rows = self
            .conn
            .call(move |conn| {
                let mut rows: Vec<(Option<String>, String)> = Vec::new();
                if let Some(ref query) = fts_query {
                    let mut stmt = conn.prepare(
                        "SELECT t.question, t.content FROM training_fts
                         JOIN training_data t ON t.rowid = training_fts.rowid
                         WHERE training_fts MATCH ?1 AND t.kind = ?2
                         ORDER BY bm25(training_fts) LIMIT ?3",
                    )?;
                    rows = stmt
                        .query_map(params![query, kind_str, limit], |row| {
                            Ok((row.get(0)?, row.get(1)?))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                }
                if rows.is_empty() {
                    let mut stmt = conn.prepare(
                        "SELECT question, content FROM training_data
                         WHERE kind = ?1
                         ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                    )?;
                    rows = stmt
                        .query_map(params![kind_str, limit], |row| {
                            Ok((row.get(0)?, row.get(1)?))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                }
                Ok(rows)
            })
            .await
            .map_err(storage_err)?;

        debug!(kind = %kind, found = rows.len(), "related records");
        Ok(rows)
    }
}

#[async_trait]
impl RetrievalStore for SqliteRetrievalStore {
    async fn find_similar(&self, question: &str) -> Result<Vec<QuestionSql>, GeoaskError> {
        let norm = normalize_question(question);
        if norm.is_empty() {
            return Ok(Vec::new());
        }
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT question, content FROM training_data
                     WHERE kind = 'sql' AND question_norm = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )?;
                let pairs = stmt
                    .query_map(params![norm], |row| {
                        Ok(QuestionSql {
                            question: row.get(0)?,
                            sql: row.get(1)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(pairs)
            })
            .await
            .map_err(storage_err)
    }

    async fn related_examples(&self, question: &str) -> Result<Vec<QuestionSql>, GeoaskError> {
        let rows = self
            .related(TrainingKind::Sql, question, self.limits.examples)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(question, sql)| QuestionSql {
                question,
                sql: Some(sql),
            })
            .collect())
    }

    async fn related_ddl(&self, question: &str) -> Result<Vec<String>, GeoaskError> {
        let rows = self
            .related(TrainingKind::Ddl, question, self.limits.ddl)
            .await?;
        Ok(rows.into_iter().map(|(_, content)| content).collect())
    }

    async fn related_documentation(&self, question: &str) -> Result<Vec<String>, GeoaskError> {
        let rows = self
            .related(TrainingKind::Documentation, question, self.limits.documentation)
            .await?;
        Ok(rows.into_iter().map(|(_, content)| content).collect())
    }

    async fn add_pair(&self, question: &str, sql: &str) -> Result<String, GeoaskError> {
        self.insert(TrainingKind::Sql, Some(question), sql).await
    }

    async fn add_ddl(&self, ddl: &str) -> Result<String, GeoaskError> {
        self.insert(TrainingKind::Ddl, None, ddl).await
    }

    async fn add_documentation(&self, documentation: &str) -> Result<String, GeoaskError> {
        self.insert(TrainingKind::Documentation, None, documentation)
            .await
    }

    async fn list_training_data(&self) -> Result<Vec<TrainingRecord>, GeoaskError> {
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, kind, question, content, created_at FROM training_data
                     ORDER BY created_at ASC, rowid ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(storage_err)?;

        rows.into_iter()
            .map(|(id, kind, question, content, created_at)| {
                let kind = TrainingKind::from_str(&kind).map_err(|e| {
                    GeoaskError::Internal(format!("unknown training kind {kind:?}: {e}"))
                })?;
                Ok(TrainingRecord {
                    id,
                    kind,
                    question,
                    content,
                    created_at,
                })
            })
            .collect()
    }

    async fn remove_pair(&self, id: &str) -> Result<bool, GeoaskError> {
        let id = id.to_string();
        let removed = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM training_data WHERE id = ?1", params![id])?;
                Ok(n)
            })
            .await
            .map_err(storage_err)?;
        Ok(removed > 0)
    }
}

fn id_suffix(kind: TrainingKind) -> &'static str {
    match kind {
        TrainingKind::Sql => "sql",
        TrainingKind::Ddl => "ddl",
        TrainingKind::Documentation => "doc",
    }
}

/// Lowercases and collapses whitespace.
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds an FTS5 query that ORs every word of `text` as a quoted term.
///
/// Quoting keeps FTS5 operators and punctuation in user input from being
/// parsed as query syntax. Returns `None` when `text` has no words.
fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| w.chars().count() > 1)
        .map(|w| format!("\"{}\"", w.to_lowercase()))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}
