// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory retrieval store for testing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use geoask_core::{GeoaskError, QuestionSql, RetrievalStore, TrainingKind, TrainingRecord};
use tokio::sync::Mutex;

/// A retrieval store that keeps records in a `Vec`.
///
/// `find_similar` matches questions case- and whitespace-insensitively.
/// Related lookups return every record of the requested kind in insertion
/// order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<Vec<TrainingRecord>>>,
    add_pair_calls: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `add_pair` calls so far, including seeding.
    pub fn add_pair_count(&self) -> usize {
        self.add_pair_calls.load(Ordering::SeqCst)
    }

    /// Stored question/SQL pairs in insertion order.
    pub async fn pairs(&self) -> Vec<(String, String)> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.kind == TrainingKind::Sql)
            .map(|r| (r.question.clone().unwrap_or_default(), r.content.clone()))
            .collect()
    }

    async fn push(&self, kind: TrainingKind, question: Option<&str>, content: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("mem-{n}");
        self.records.lock().await.push(TrainingRecord {
            id: id.clone(),
            kind,
            question: question.map(str::to_string),
            content: content.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        id
    }

    async fn of_kind(&self, kind: TrainingKind) -> Vec<TrainingRecord> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

fn normalize(question: &str) -> String {
    question
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl RetrievalStore for InMemoryStore {
    async fn find_similar(&self, question: &str) -> Result<Vec<QuestionSql>, GeoaskError> {
        let wanted = normalize(question);
        Ok(self
            .of_kind(TrainingKind::Sql)
            .await
            .into_iter()
            .filter(|r| r.question.as_deref().map(normalize).as_deref() == Some(wanted.as_str()))
            .map(|r| QuestionSql {
                question: r.question,
                sql: Some(r.content),
            })
            .collect())
    }

    async fn related_examples(&self, _question: &str) -> Result<Vec<QuestionSql>, GeoaskError> {
        Ok(self
            .of_kind(TrainingKind::Sql)
            .await
            .into_iter()
            .map(|r| QuestionSql {
                question: r.question,
                sql: Some(r.content),
            })
            .collect())
    }

    async fn related_ddl(&self, _question: &str) -> Result<Vec<String>, GeoaskError> {
        Ok(self
            .of_kind(TrainingKind::Ddl)
            .await
            .into_iter()
            .map(|r| r.content)
            .collect())
    }

    async fn related_documentation(&self, _question: &str) -> Result<Vec<String>, GeoaskError> {
        Ok(self
            .of_kind(TrainingKind::Documentation)
            .await
            .into_iter()
            .map(|r| r.content)
            .collect())
    }

    async fn add_pair(&self, question: &str, sql: &str) -> Result<String, GeoaskError> {
        self.add_pair_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.push(TrainingKind::Sql, Some(question), sql).await)
    }

    async fn add_ddl(&self, ddl: &str) -> Result<String, GeoaskError> {
        Ok(self.push(TrainingKind::Ddl, None, ddl).await)
    }

    async fn add_documentation(&self, documentation: &str) -> Result<String, GeoaskError> {
        Ok(self
            .push(TrainingKind::Documentation, None, documentation)
            .await)
    }

    async fn list_training_data(&self) -> Result<Vec<TrainingRecord>, GeoaskError> {
        Ok(self.records.lock().await.clone())
    }

    async fn remove_pair(&self, id: &str) -> Result<bool, GeoaskError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
