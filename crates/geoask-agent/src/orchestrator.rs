// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question answering loop.
//!
//! For each question the orchestrator:
//! - Reuses a stored SQL answer when the store already knows the question
//! - Otherwise gathers examples, schema and documentation, builds the prompt,
//!   calls the backend under a timeout and sanitizes the reply
//! - Runs the SQL when an executor is configured, retrying with the database
//!   error as feedback, and stores pairs that ran successfully
//!
//! Failures never escape as errors from [`Orchestrator::answer`]; they are
//! logged and returned as [`Outcome::Failed`].

use std::sync::Arc;
use std::time::Duration;

use geoask_config::GeoaskConfig;
use geoask_core::{
    CompletionOptions, CompletionProvider, ExecutionFeedback, GeneratedSql, GeoaskError,
    Message, PromptContext, QueryRows, RetrievalStore, SqlExecutor, SqlOrigin,
};
use geoask_prompt::{PromptBuilder, within_budget};
use geoask_sanitize::sanitize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::backend::completion_options;

/// Where in the pipeline a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureStage {
    /// The retrieval store could not be queried.
    Retrieval,
    /// No schema is available for the question.
    Context,
    /// The backend returned an error.
    Backend,
    /// The backend did not answer in time.
    Timeout,
    /// The backend returned nothing usable.
    EmptyReply,
    /// The generated SQL failed to run.
    Execution,
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub sql: GeneratedSql,
    /// Rows returned by the executor, `None` when execution is disabled.
    pub rows: Option<QueryRows>,
    /// Generation attempts, 0 for cache hits.
    pub attempts: u32,
    /// Whether the pair was written to the store.
    pub persisted: bool,
}

/// Result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Answered(Answer),
    Failed { stage: FailureStage, message: String },
}

impl Outcome {
    fn failed(stage: FailureStage, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(stage = %stage, error = %message, "request failed");
        Self::Failed { stage, message }
    }

    /// The answer, if the request succeeded.
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Answered(answer) => Some(answer),
            Self::Failed { .. } => None,
        }
    }
}

/// Tunables for the loop, usually taken from [`GeoaskConfig`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Token budget per DDL and documentation section.
    pub max_tokens: usize,
    /// Upper bound on one backend call.
    pub timeout: Duration,
    /// Store pairs whose execution returned rows.
    pub auto_train: bool,
    /// Regeneration attempts after a failed execution.
    pub max_retries: u32,
    pub options: CompletionOptions,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&GeoaskConfig::default())
    }
}

impl From<&GeoaskConfig> for OrchestratorSettings {
    fn from(config: &GeoaskConfig) -> Self {
        Self {
            max_tokens: config.prompt.max_tokens,
            timeout: Duration::from_secs(config.backend.timeout_secs),
            auto_train: config.orchestrator.auto_train,
            max_retries: config.orchestrator.max_retries,
            options: completion_options(&config.backend),
        }
    }
}

/// Retrieved material for one question.
struct Gathered {
    examples: Vec<geoask_core::QuestionSql>,
    ddl: Vec<String>,
    docs: Vec<String>,
}

/// Composes a retrieval store, a completion backend and an optional executor.
pub struct Orchestrator {
    store: Arc<dyn RetrievalStore>,
    provider: Arc<dyn CompletionProvider>,
    executor: Option<Arc<dyn SqlExecutor>>,
    builder: PromptBuilder,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RetrievalStore>,
        provider: Arc<dyn CompletionProvider>,
        builder: PromptBuilder,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            provider,
            executor: None,
            builder,
            settings,
        }
    }

    /// Enables execution of generated SQL.
    pub fn with_executor(mut self, executor: Arc<dyn SqlExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn has_executor(&self) -> bool {
        self.executor.is_some()
    }

    /// Answers a question, reusing stored SQL when the question is known.
    ///
    /// With `allow_error_retry`, a statement the executor rejects is
    /// regenerated with the database error in the prompt, up to
    /// `max_retries` times.
    pub async fn answer(&self, question: &str, allow_error_retry: bool) -> Outcome {
        let similar = match self.store.find_similar(question).await {
            Ok(similar) => similar,
            Err(e) => return Outcome::failed(FailureStage::Retrieval, e.to_string()),
        };

        if let Some(sql) = similar.first().and_then(|hit| hit.sql.clone()) {
            info!(question, "reusing stored SQL");
            let generated = GeneratedSql {
                raw_text: sql.clone(),
                sanitized: sql,
                source_question: question.to_string(),
                origin: SqlOrigin::Cache,
            };
            return self.run_cached(generated).await;
        }

        self.generate_and_run(question, None, allow_error_retry)
            .await
    }

    /// Generates fresh SQL, skipping the stored-answer lookup.
    ///
    /// `error_feedback` is placed in the prompt so the model can correct a
    /// previous statement. No automatic retries are made.
    pub async fn regenerate(&self, question: &str, error_feedback: Option<&str>) -> Outcome {
        self.generate_and_run(question, error_feedback.map(str::to_string), false)
            .await
    }

    /// Records the caller's verdict on SQL that was returned unexecuted.
    ///
    /// Only successful generated statements are stored; returns whether the
    /// pair was written.
    pub async fn confirm(
        &self,
        generated: &GeneratedSql,
        feedback: ExecutionFeedback,
    ) -> Result<bool, GeoaskError> {
        match feedback {
            ExecutionFeedback::Success { row_count } => {
                if generated.origin == SqlOrigin::Cache {
                    debug!("confirmed SQL came from the store; not storing again");
                    return Ok(false);
                }
                let id = self
                    .store
                    .add_pair(&generated.source_question, &generated.sanitized)
                    .await?;
                info!(id = %id, row_count, "stored confirmed question/SQL pair");
                Ok(true)
            }
            ExecutionFeedback::Failure { message } => {
                debug!(error = %message, "SQL rejected by caller; not storing");
                Ok(false)
            }
        }
    }

    /// Merges a question and a follow-up comment into one question.
    pub async fn rewrite_question(
        &self,
        question: &str,
        comment: &str,
    ) -> Result<String, GeoaskError> {
        let messages = self.builder.rewrite_messages(question, comment);
        let reply = self
            .complete_with_timeout(&messages, &CompletionOptions::conversational())
            .await?;
        match reply.map(|text| text.trim().to_string()) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(GeoaskError::backend("empty reply while rewriting question")),
        }
    }

    async fn run_cached(&self, generated: GeneratedSql) -> Outcome {
        let rows = match &self.executor {
            Some(executor) => match executor.run(&generated.sanitized).await {
                Ok(rows) => Some(rows),
                Err(e) => return Outcome::failed(FailureStage::Execution, execution_message(e)),
            },
            None => None,
        };
        Outcome::Answered(Answer {
            sql: generated,
            rows,
            attempts: 0,
            persisted: false,
        })
    }

    async fn generate_and_run(
        &self,
        question: &str,
        mut feedback: Option<String>,
        allow_error_retry: bool,
    ) -> Outcome {
        let gathered = match self.gather(question).await {
            Ok(gathered) => gathered,
            Err(e) => return Outcome::failed(FailureStage::Retrieval, e.to_string()),
        };
        if within_budget(&gathered.ddl, self.settings.max_tokens).is_empty() {
            return Outcome::failed(
                FailureStage::Context,
                "no table definitions available; add DDL with `geoask train --ddl`",
            );
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let generated = match self.generate(question, &gathered, feedback.take()).await {
                Ok(generated) => generated,
                Err(outcome) => return outcome,
            };

            let Some(executor) = &self.executor else {
                return Outcome::Answered(Answer {
                    sql: generated,
                    rows: None,
                    attempts,
                    persisted: false,
                });
            };

            match executor.run(&generated.sanitized).await {
                Ok(rows) => {
                    let persisted = self.persist_executed(&generated, &rows).await;
                    return Outcome::Answered(Answer {
                        sql: generated,
                        rows: Some(rows),
                        attempts,
                        persisted,
                    });
                }
                Err(GeoaskError::Execution { message }) => {
                    if allow_error_retry && attempts <= self.settings.max_retries {
                        warn!(attempt = attempts, error = %message, "execution failed; regenerating");
                        feedback = Some(message);
                        continue;
                    }
                    return Outcome::failed(FailureStage::Execution, message);
                }
                // Only SQL errors are worth showing to the model.
                Err(e) => {
                    warn!(error = %e, "executor unavailable");
                    return Outcome::failed(FailureStage::Execution, e.to_string());
                }
            }
        }
    }

    async fn gather(&self, question: &str) -> Result<Gathered, GeoaskError> {
        let examples = self.store.related_examples(question).await?;
        let ddl = self.store.related_ddl(question).await?;
        let docs = self.store.related_documentation(question).await?;
        debug!(
            examples = examples.len(),
            ddl = ddl.len(),
            docs = docs.len(),
            "retrieved context"
        );
        Ok(Gathered {
            examples,
            ddl,
            docs,
        })
    }

    async fn generate(
        &self,
        question: &str,
        gathered: &Gathered,
        error_feedback: Option<String>,
    ) -> Result<GeneratedSql, Outcome> {
        let context = PromptContext {
            question: question.to_string(),
            prior_examples: gathered.examples.clone(),
            ddl_snippets: gathered.ddl.clone(),
            doc_snippets: gathered.docs.clone(),
            max_tokens: self.settings.max_tokens,
            error_feedback,
        };
        let messages = self.builder.build(&context);

        let raw = match self
            .complete_with_timeout(&messages, &self.settings.options)
            .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return Err(Outcome::failed(
                    FailureStage::EmptyReply,
                    format!("{} backend returned no reply", self.provider.name()),
                ));
            }
            Err(GeoaskError::Timeout { duration }) => {
                return Err(Outcome::failed(
                    FailureStage::Timeout,
                    format!("backend did not answer within {}s", duration.as_secs()),
                ));
            }
            Err(e) => return Err(Outcome::failed(FailureStage::Backend, e.to_string())),
        };

        let sanitized = sanitize(&raw);
        if sanitized.trim().is_empty() {
            return Err(Outcome::failed(
                FailureStage::EmptyReply,
                "backend reply contained no SQL",
            ));
        }
        debug!(sql = %sanitized, "generated SQL");

        Ok(GeneratedSql {
            raw_text: raw,
            sanitized,
            source_question: question.to_string(),
            origin: SqlOrigin::Generated,
        })
    }

    async fn complete_with_timeout(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Option<String>, GeoaskError> {
        let duration = self.settings.timeout;
        match tokio::time::timeout(duration, self.provider.complete(messages, options)).await {
            Ok(result) => result,
            Err(_) => Err(GeoaskError::Timeout { duration }),
        }
    }

    async fn persist_executed(&self, generated: &GeneratedSql, rows: &QueryRows) -> bool {
        if !self.settings.auto_train || rows.is_empty() {
            return false;
        }
        match self
            .store
            .add_pair(&generated.source_question, &generated.sanitized)
            .await
        {
            Ok(id) => {
                info!(id = %id, rows = rows.len(), "stored question/SQL pair");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to store question/SQL pair");
                false
            }
        }
    }
}

fn execution_message(error: GeoaskError) -> String {
    match error {
        GeoaskError::Execution { message } => message,
        other => other.to_string(),
    }
}
