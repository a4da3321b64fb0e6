// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for geoask.

use thiserror::Error;

/// The error type shared by every geoask crate.
#[derive(Debug, Error)]
pub enum GeoaskError {
    /// Configuration errors (invalid values, missing credentials, unreadable files).
    #[error("configuration error: {0}")]
    Config(String),

    /// Retrieval store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Completion backend errors (network failure, model load failure, malformed reply).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generated SQL failed to run against the target database.
    #[error("execution error: {message}")]
    Execution { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GeoaskError {
    /// Shorthand for a backend error without an underlying source.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }
}
