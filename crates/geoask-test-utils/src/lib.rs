// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for geoask integration tests.
//!
//! Provides mock collaborators for fast, deterministic tests without a
//! model, a network, or a database.
//!
//! # Components
//!
//! - [`MockProvider`] - Completion backend with scripted replies
//! - [`InMemoryStore`] - Retrieval store backed by a `Vec`
//! - [`MockExecutor`] - SQL executor with scripted results

pub mod mock_executor;
pub mod mock_provider;
pub mod mock_store;

pub use mock_executor::MockExecutor;
pub use mock_provider::{MockProvider, MockReply};
pub use mock_store::InMemoryStore;
