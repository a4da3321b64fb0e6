// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of config into store, backend and orchestrator.

use std::sync::Arc;

use geoask_agent::{CompletionBackend, Orchestrator, OrchestratorSettings};
use geoask_config::GeoaskConfig;
use geoask_config::model::ExecutorKind;
use geoask_core::{GeoaskError, RetrievalStore, SqlExecutor};
use geoask_prompt::PromptBuilder;
use geoask_store::{
    PostgresExecutor, RetrievalLimits, SqliteExecutor, SqliteRetrievalStore, open_training_db,
};
use tracing::info;

/// Opens the training data store, creating it on first use.
pub async fn open_store(config: &GeoaskConfig) -> Result<Arc<dyn RetrievalStore>, GeoaskError> {
    let conn = open_training_db(&config.store.database_path).await?;
    Ok(Arc::new(SqliteRetrievalStore::new(
        conn,
        RetrievalLimits::from(&config.prompt),
    )))
}

/// Builds the orchestrator with the configured backend and, when the
/// `[executor]` section names a database, an executor of that kind.
pub async fn build_orchestrator(config: &GeoaskConfig) -> Result<Orchestrator, GeoaskError> {
    let store = open_store(config).await?;
    let builder = PromptBuilder::from_config(&config.agent).await?;
    let backend = CompletionBackend::from_config(config).await?;

    let mut orchestrator = Orchestrator::new(
        store,
        Arc::new(backend),
        builder,
        OrchestratorSettings::from(config),
    );

    if let Some(executor) = open_executor(config).await? {
        info!(kind = %config.executor.kind, "SQL execution enabled");
        orchestrator = orchestrator.with_executor(executor);
    }

    Ok(orchestrator)
}

/// Connects the analytics database named by `[executor]`, if any.
pub async fn open_executor(
    config: &GeoaskConfig,
) -> Result<Option<Arc<dyn SqlExecutor>>, GeoaskError> {
    let executor = &config.executor;
    if !executor.is_enabled() {
        return Ok(None);
    }
    let executor: Arc<dyn SqlExecutor> = match executor.kind {
        ExecutorKind::Postgres => Arc::new(PostgresExecutor::connect(executor).await?),
        ExecutorKind::Sqlite => match &executor.database_path {
            Some(path) => Arc::new(SqliteExecutor::open(path).await?),
            None => return Ok(None),
        },
    };
    Ok(Some(executor))
}
