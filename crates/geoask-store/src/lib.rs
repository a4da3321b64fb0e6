// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence and SQL execution for geoask.
//!
//! Provides the training data store (question/SQL pairs, DDL, documentation)
//! with FTS5 keyword retrieval and embedded migrations, and read-only
//! executors for running generated SQL against the analytics database
//! (PostgreSQL through `sqlx`, SQLite through `tokio-rusqlite`).

pub mod database;
pub mod executor;
pub mod migrations;
pub mod postgres;
pub mod store;

pub use database::open_training_db;
pub use executor::SqliteExecutor;
pub use postgres::PostgresExecutor;
pub use store::{RetrievalLimits, SqliteRetrievalStore};
