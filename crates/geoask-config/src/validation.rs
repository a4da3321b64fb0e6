// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: non-zero budgets,
//! sampling ranges, and credentials required by the selected backend.

use crate::diagnostic::ConfigError;
use crate::model::{BackendKind, ExecutorKind, GeoaskConfig};

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &GeoaskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.agent.dialect.trim().is_empty() {
        fail("agent.dialect must not be empty".to_string());
    }

    if config.prompt.max_tokens == 0 {
        fail("prompt.max_tokens must be greater than zero".to_string());
    }

    if config.backend.timeout_secs == 0 {
        fail("backend.timeout_secs must be greater than zero".to_string());
    }

    if config.backend.max_new_tokens == 0 {
        fail("backend.max_new_tokens must be greater than zero".to_string());
    }

    if !(0.0..=2.0).contains(&config.backend.temperature) {
        fail(format!(
            "backend.temperature must be within 0.0..=2.0, got {}",
            config.backend.temperature
        ));
    }

    if !(config.backend.top_p > 0.0 && config.backend.top_p <= 1.0) {
        fail(format!(
            "backend.top_p must be within (0.0, 1.0], got {}",
            config.backend.top_p
        ));
    }

    match config.backend.kind {
        BackendKind::Remote => {
            if config.remote.endpoint.trim().is_empty() {
                fail("remote.endpoint must not be empty when backend.kind = \"remote\"".to_string());
            }
        }
        BackendKind::Local => {
            if config.local.model_id.trim().is_empty() {
                fail("local.model_id must not be empty when backend.kind = \"local\"".to_string());
            }
            if config.local.intra_threads == 0 {
                fail("local.intra_threads must be at least 1".to_string());
            }
        }
    }

    if config.store.database_path.trim().is_empty() {
        fail("store.database_path must not be empty".to_string());
    }

    let executor = &config.executor;
    match executor.kind {
        ExecutorKind::Postgres => {
            if let Some(url) = &executor.url
                && !(url.starts_with("postgres://") || url.starts_with("postgresql://"))
            {
                fail("executor.url must start with postgres:// or postgresql://".to_string());
            }
            if executor.database_path.is_some() {
                fail(
                    "executor.database_path only applies to executor.kind = \"sqlite\""
                        .to_string(),
                );
            }
        }
        ExecutorKind::Sqlite => {
            if let Some(path) = &executor.database_path
                && path.trim().is_empty()
            {
                fail("executor.database_path must not be empty when set".to_string());
            }
            if executor.url.is_some() {
                fail("executor.url only applies to executor.kind = \"postgres\"".to_string());
            }
        }
    }

    if executor.is_enabled() && executor.max_connections == 0 {
        fail("executor.max_connections must be at least 1".to_string());
    }

    if executor.is_enabled() && executor.query_timeout_secs == 0 {
        fail("executor.query_timeout_secs must be greater than zero".to_string());
    }

    // Generated SQL follows agent.dialect; the engine must understand it.
    if executor.is_enabled()
        && !config
            .agent
            .dialect
            .eq_ignore_ascii_case(executor.kind.dialect())
    {
        fail(format!(
            "agent.dialect = \"{}\" but executor.kind = \"{}\" runs {} SQL",
            config.agent.dialect,
            executor.kind,
            executor.kind.dialect()
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
