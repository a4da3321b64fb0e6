// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the prompt, backend, and orchestration layers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The speaker of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry of the transcript sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A prior question/SQL pair as returned by a retrieval store.
///
/// Either side may be missing in stored data; such entries are skipped
/// when building a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSql {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
}

impl QuestionSql {
    pub fn new(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            sql: Some(sql.into()),
        }
    }

    /// Returns both fields when the entry is well formed.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (&self.question, &self.sql) {
            (Some(q), Some(s)) => Some((q.as_str(), s.as_str())),
            _ => None,
        }
    }
}

/// Everything the prompt builder needs for one request.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// The user's natural-language question.
    pub question: String,
    /// Prior question/SQL examples, most relevant first.
    pub prior_examples: Vec<QuestionSql>,
    /// Schema DDL snippets, highest priority first.
    pub ddl_snippets: Vec<String>,
    /// Documentation snippets, highest priority first.
    pub doc_snippets: Vec<String>,
    /// Token budget applied independently to the DDL and documentation sections.
    pub max_tokens: usize,
    /// Error message from a previously rejected statement, for self-correction.
    pub error_feedback: Option<String>,
}

/// Generation settings passed to a completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Sampling temperature; ignored when `deterministic` is set.
    pub temperature: f32,
    /// Nucleus sampling cutoff; ignored when `deterministic` is set.
    pub top_p: f32,
    /// Upper bound on generated tokens.
    pub max_new_tokens: usize,
    /// Greedy decoding when true.
    pub deterministic: bool,
}

impl CompletionOptions {
    /// Greedy decoding with a large budget, used for SQL generation.
    pub fn sql() -> Self {
        Self {
            temperature: 0.2,
            top_p: 1.0,
            max_new_tokens: 3000,
            deterministic: true,
        }
    }

    /// Sampled decoding with a short budget, used for conversational turns.
    pub fn conversational() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.9,
            max_new_tokens: 512,
            deterministic: false,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::sql()
    }
}

/// Where a returned statement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum SqlOrigin {
    /// Reused from the retrieval store without calling the backend.
    Cache,
    /// Produced by the completion backend for this request.
    Generated,
}

/// The output of the question-to-SQL pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSql {
    /// Model output before sanitization (the stored SQL for cache hits).
    pub raw_text: String,
    /// Extracted and repaired SQL.
    pub sanitized: String,
    /// The question the SQL answers.
    pub source_question: String,
    pub origin: SqlOrigin,
}

/// Tabular result of running a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Caller-reported result of running generated SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionFeedback {
    Success { row_count: usize },
    Failure { message: String },
}

/// Kind of a stored training record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrainingKind {
    Sql,
    Ddl,
    Documentation,
}

/// One row of training data as listed by a retrieval store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub id: String,
    pub kind: TrainingKind,
    pub question: Option<String>,
    pub content: String,
    pub created_at: String,
}
