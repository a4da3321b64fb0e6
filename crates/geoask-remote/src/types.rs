// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC request/response types for the completion service.

use serde::{Deserialize, Serialize};

/// Single-string payload used for both parameters and results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringData {
    pub data: String,
}

/// A JSON-RPC call: `{"method": "...", "params": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub method: &'a str,
    pub params: Vec<StringData>,
}

/// Service error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Reply envelope. Either field may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<StringData>,
    #[serde(default)]
    pub error: Option<RpcError>,
}
