// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for language model backends.

use async_trait::async_trait;

use crate::error::GeoaskError;
use crate::types::{CompletionOptions, Message};

/// A backend that turns an ordered message transcript into generated text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable backend name used in logs.
    fn name(&self) -> &str;

    /// Generates a reply for `messages`.
    ///
    /// `Ok(None)` means the backend answered without a usable payload.
    /// Transport and model failures are returned as errors, never swallowed.
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Option<String>, GeoaskError>;
}
