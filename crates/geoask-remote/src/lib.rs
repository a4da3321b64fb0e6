// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote completion backend for geoask.
//!
//! Sends the whole message sequence to a JSON-RPC service as one
//! `submit_prompt` call and returns the generated text.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use geoask_config::model::{BackendConfig, RemoteConfig};
use geoask_core::{CompletionOptions, CompletionProvider, GeoaskError, Message};
use tracing::{debug, info, warn};

use crate::client::RpcClient;

/// Completion backend that delegates generation to a remote service.
///
/// Generation settings live on the service side; [`CompletionOptions`] are
/// not forwarded.
#[derive(Debug, Clone)]
pub struct RemoteService {
    client: RpcClient,
}

impl RemoteService {
    /// Creates the backend from config.
    ///
    /// The API key comes from `remote.api_key`, which the `GEOASK_REMOTE_API_KEY`
    /// environment variable overrides at load time.
    pub fn new(remote: &RemoteConfig, backend: &BackendConfig) -> Result<Self, GeoaskError> {
        let api_key = resolve_api_key(&remote.api_key)?;
        let client = RpcClient::new(
            remote.endpoint.clone(),
            &api_key,
            remote.model.as_deref(),
            Duration::from_secs(backend.timeout_secs),
        )?;

        info!(
            endpoint = remote.endpoint.as_str(),
            model = remote.model.as_deref().unwrap_or("-"),
            "remote completion backend initialized"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl CompletionProvider for RemoteService {
    fn name(&self) -> &str {
        "remote"
    }

    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<Option<String>, GeoaskError> {
        let payload = serde_json::to_string(messages).map_err(|e| GeoaskError::Backend {
            message: format!("failed to encode messages: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(
            messages = messages.len(),
            bytes = payload.len(),
            "submitting prompt"
        );

        let reply = self.client.call("submit_prompt", payload).await?;
        match reply.result {
            Some(result) => Ok(Some(result.data)),
            None => {
                if let Some(error) = reply.error {
                    warn!(code = ?error.code, message = %error.message, "service returned no result");
                } else {
                    warn!("service returned no result");
                }
                Ok(None)
            }
        }
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, GeoaskError> {
    match config_key {
        Some(key) if !key.is_empty() => Ok(key.clone()),
        _ => Err(GeoaskError::Config(
            "remote API key not found. Set remote.api_key in config or GEOASK_REMOTE_API_KEY environment variable.".into(),
        )),
    }
}
