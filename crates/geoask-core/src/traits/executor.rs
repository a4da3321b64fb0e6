// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL executor trait used to confirm generated statements.

use async_trait::async_trait;

use crate::error::GeoaskError;
use crate::types::QueryRows;

/// Runs SQL against the analytics database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes `sql` and returns its rows.
    ///
    /// Failures are reported as [`GeoaskError::Execution`] carrying the
    /// database message, which is fed back to the model on retry.
    async fn run(&self, sql: &str) -> Result<QueryRows, GeoaskError>;
}
