// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System-message folding for chat templates without a system role.

use geoask_core::{Message, Role};
use tracing::debug;

/// Moves a leading system message into the first user message.
///
/// The system content is prepended to the first user turn, separated by a
/// blank line, and the system message is dropped. Sequences that do not
/// start with a system message, or have no user message to fold into, are
/// returned unchanged.
pub fn fold_system_message(messages: &[Message]) -> Vec<Message> {
    let Some((first, rest)) = messages.split_first() else {
        return Vec::new();
    };
    if first.role != Role::System {
        return messages.to_vec();
    }
    let Some(target) = rest.iter().position(|m| m.role == Role::User) else {
        debug!("no user message to fold system prompt into");
        return messages.to_vec();
    };

    let mut folded = rest.to_vec();
    folded[target].content = format!("{}\n\n{}", first.content, folded[target].content);
    folded
}
