// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the orchestrator and its collaborators.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects.

pub mod executor;
pub mod provider;
pub mod retrieval;

pub use executor::SqlExecutor;
pub use provider::CompletionProvider;
pub use retrieval::RetrievalStore;
