// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for geoportal question-to-SQL generation.
//!
//! A prompt is an ordered list of role-tagged [`Message`]s:
//! - **System**: dialect line, rulebook, budgeted schema and documentation
//!   sections, optional previous error, response guidelines
//! - **Examples**: prior question/SQL pairs as user/assistant turns
//! - **Question**: the user's question as the final user turn
//!
//! Building is pure and deterministic. Loading instruction text from disk is
//! the only I/O and happens once, in [`PromptBuilder::from_config`].
//!
//! [`Message`]: geoask_core::Message

pub mod budget;
pub mod builder;
pub mod folding;
pub mod rulebook;

pub use budget::{estimate_tokens, within_budget};
pub use builder::PromptBuilder;
pub use folding::fold_system_message;
pub use rulebook::{GEOPORTAL_RULEBOOK, load_instructions};
