// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend selection.

use async_trait::async_trait;
use geoask_config::GeoaskConfig;
use geoask_config::model::{BackendConfig, BackendKind};
use geoask_core::{CompletionOptions, CompletionProvider, GeoaskError, Message};
use geoask_local::LocalModel;
use geoask_remote::RemoteService;
use tracing::info;

/// The completion backend chosen by `[backend].kind`.
#[derive(Clone)]
pub enum CompletionBackend {
    Local(LocalModel),
    Remote(RemoteService),
}

impl CompletionBackend {
    /// Builds the configured backend. The local variant downloads and loads
    /// the model, which can take a while on first run.
    pub async fn from_config(config: &GeoaskConfig) -> Result<Self, GeoaskError> {
        info!(kind = %config.backend.kind, "initializing completion backend");
        match config.backend.kind {
            BackendKind::Local => Ok(Self::Local(LocalModel::load(&config.local).await?)),
            BackendKind::Remote => Ok(Self::Remote(RemoteService::new(
                &config.remote,
                &config.backend,
            )?)),
        }
    }
}

/// Generation settings for SQL requests, taken from `[backend]`.
pub fn completion_options(config: &BackendConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        top_p: config.top_p,
        max_new_tokens: config.max_new_tokens,
        deterministic: config.deterministic,
    }
}

#[async_trait]
impl CompletionProvider for CompletionBackend {
    fn name(&self) -> &str {
        match self {
            Self::Local(model) => model.name(),
            Self::Remote(service) => service.name(),
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Option<String>, GeoaskError> {
        match self {
            Self::Local(model) => model.complete(messages, options).await,
            Self::Remote(service) => service.complete(messages, options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_backend_config() {
        let config = BackendConfig {
            deterministic: false,
            temperature: 0.7,
            top_p: 0.9,
            max_new_tokens: 256,
            ..BackendConfig::default()
        };
        let opts = completion_options(&config);
        assert!(!opts.deterministic);
        assert_eq!(opts.temperature, 0.7);
        assert_eq!(opts.top_p, 0.9);
        assert_eq!(opts.max_new_tokens, 256);
    }

    #[test]
    fn default_options_match_sql_preset() {
        assert_eq!(
            completion_options(&BackendConfig::default()),
            CompletionOptions::sql()
        );
    }

    #[tokio::test]
    async fn remote_backend_requires_api_key() {
        let mut config = GeoaskConfig::default();
        config.remote.api_key = None;
        let err = CompletionBackend::from_config(&config)
            .await
            .err()
            .expect("missing key should fail");
        assert!(matches!(err, GeoaskError::Config(_)));
    }

    #[tokio::test]
    async fn remote_backend_builds_with_key() {
        let mut config = GeoaskConfig::default();
        config.remote.api_key = Some("test-key".into());
        let backend = CompletionBackend::from_config(&config).await.unwrap();
        assert_eq!(backend.name(), "remote");
    }
}
