// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question answering for geoask.
//!
//! [`CompletionBackend`] picks the local or remote model from config, and
//! the [`Orchestrator`] turns questions into SQL on top of it.

pub mod backend;
pub mod orchestrator;

pub use backend::{CompletionBackend, completion_options};
pub use orchestrator::{Answer, FailureStage, Orchestrator, OrchestratorSettings, Outcome};
