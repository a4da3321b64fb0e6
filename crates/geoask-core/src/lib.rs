// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for geoask.
//!
//! Holds the shared message and context types, the workspace error type,
//! and the narrow traits that the orchestrator composes: a completion
//! provider, a retrieval store, and an optional SQL executor.

pub mod error;
pub mod traits;
pub mod types;

pub use error::GeoaskError;
pub use types::{
    CompletionOptions, ExecutionFeedback, GeneratedSql, Message, PromptContext, QueryRows,
    QuestionSql, Role, SqlOrigin, TrainingKind, TrainingRecord,
};

pub use traits::{CompletionProvider, RetrievalStore, SqlExecutor};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geoask_error_has_all_variants() {
        let _config = GeoaskError::Config("test".into());
        let _storage = GeoaskError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _backend = GeoaskError::Backend {
            message: "test".into(),
            source: None,
        };
        let _execution = GeoaskError::Execution {
            message: "no such table".into(),
        };
        let _timeout = GeoaskError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = GeoaskError::Internal("test".into());
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _provider(_: &dyn CompletionProvider) {}
        fn _store(_: &dyn RetrievalStore) {}
        fn _executor(_: &dyn SqlExecutor) {}
    }
}
