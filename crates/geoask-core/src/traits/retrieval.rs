// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval store trait for training data (question/SQL pairs, DDL, documentation).

use async_trait::async_trait;

use crate::error::GeoaskError;
use crate::types::{QuestionSql, TrainingRecord};

/// Storage of prior question/SQL pairs, schema DDL, and documentation.
///
/// The orchestrator treats implementations as opaque similarity storage.
/// An empty result is a normal "no match" signal, not an error.
#[async_trait]
pub trait RetrievalStore: Send + Sync {
    /// Stored pairs close enough to `question` to be reused verbatim.
    async fn find_similar(&self, question: &str) -> Result<Vec<QuestionSql>, GeoaskError>;

    /// Related pairs used as few-shot examples in the prompt.
    async fn related_examples(&self, question: &str) -> Result<Vec<QuestionSql>, GeoaskError>;

    /// Schema DDL relevant to `question`, highest priority first.
    async fn related_ddl(&self, question: &str) -> Result<Vec<String>, GeoaskError>;

    /// Documentation relevant to `question`, highest priority first.
    async fn related_documentation(&self, question: &str) -> Result<Vec<String>, GeoaskError>;

    /// Persists a question/SQL pair and returns its identifier.
    async fn add_pair(&self, question: &str, sql: &str) -> Result<String, GeoaskError>;

    /// Persists a DDL snippet and returns its identifier.
    async fn add_ddl(&self, ddl: &str) -> Result<String, GeoaskError>;

    /// Persists a documentation snippet and returns its identifier.
    async fn add_documentation(&self, documentation: &str) -> Result<String, GeoaskError>;

    /// Lists every stored record.
    async fn list_training_data(&self) -> Result<Vec<TrainingRecord>, GeoaskError>;

    /// Removes the record with `id`. Returns false when nothing matched.
    async fn remove_pair(&self, id: &str) -> Result<bool, GeoaskError>;
}
