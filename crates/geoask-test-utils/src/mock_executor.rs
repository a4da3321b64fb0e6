// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock SQL executor for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use geoask_core::{GeoaskError, QueryRows, SqlExecutor};
use tokio::sync::Mutex;

/// An executor that returns scripted results and records every statement.
///
/// When the queue is empty a single-row, single-column result is returned.
#[derive(Clone, Default)]
pub struct MockExecutor {
    results: Arc<Mutex<VecDeque<Result<QueryRows, GeoaskError>>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful result with `n` rows of one integer column.
    pub async fn push_rows(&self, n: usize) {
        let rows = QueryRows {
            columns: vec!["n".to_string()],
            rows: (0..n).map(|i| vec![serde_json::json!(i)]).collect(),
        };
        self.results.lock().await.push_back(Ok(rows));
    }

    /// Queue a failure with the given database message.
    pub async fn push_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.results
            .lock()
            .await
            .push_back(Err(GeoaskError::Execution { message }));
    }

    /// Queue a lost-connection failure, reported as a storage error.
    pub async fn push_connection_error(&self) {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        self.results.lock().await.push_back(Err(GeoaskError::Storage {
            source: Box::new(source),
        }));
    }

    /// Statements executed so far, in order.
    pub async fn executed(&self) -> Vec<String> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn run(&self, sql: &str) -> Result<QueryRows, GeoaskError> {
        self.executed.lock().await.push(sql.to_string());
        let next = self.results.lock().await.pop_front();
        match next {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(e)) => Err(e),
            None => Ok(QueryRows {
                columns: vec!["n".to_string()],
                rows: vec![vec![serde_json::json!(1)]],
            }),
        }
    }
}
