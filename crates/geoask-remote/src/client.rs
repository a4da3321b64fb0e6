// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the JSON-RPC completion service.
//!
//! Provides [`RpcClient`] which handles authentication headers, request
//! encoding, and a single retry on transient errors.

use std::time::Duration;

use geoask_core::GeoaskError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{RpcRequest, RpcResponse, StringData};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "Vanna-Key";

/// Header carrying the model (organization) name.
pub const ORG_HEADER: &str = "Vanna-Org";

/// HTTP client for the completion service.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl RpcClient {
    /// Creates a client for `endpoint`.
    ///
    /// `model` is sent as the organization header when present.
    pub fn new(
        endpoint: String,
        api_key: &str,
        model: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GeoaskError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key)
                .map_err(|e| GeoaskError::Config(format!("invalid API key header value: {e}")))?,
        );
        if let Some(model) = model {
            headers.insert(
                ORG_HEADER,
                HeaderValue::from_str(model)
                    .map_err(|e| GeoaskError::Config(format!("invalid model header value: {e}")))?,
            );
        }
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GeoaskError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            max_retries: 1,
        })
    }

    /// Calls `method` with one string parameter and returns the parsed reply.
    ///
    /// On transient errors (429, 500, 502, 503), retries once after a
    /// 1-second delay.
    pub async fn call(&self, method: &str, data: String) -> Result<RpcResponse, GeoaskError> {
        let request = RpcRequest {
            method,
            params: vec![StringData { data }],
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, method, "retrying RPC call after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| GeoaskError::Backend {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, method, "RPC response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| GeoaskError::Backend {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| GeoaskError::Backend {
                    message: format!("failed to parse RPC response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(GeoaskError::backend(format!(
                    "service returned {status}: {body}"
                )));
                continue;
            }

            return Err(GeoaskError::backend(format!(
                "service returned {status}: {body}"
            )));
        }

        Err(last_error
            .unwrap_or_else(|| GeoaskError::backend("RPC call failed after retries")))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
