// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns raw model output into a single usable SQL statement.
//!
//! Three passes run in order:
//! 1. [`extract_sql`] keeps the first statement (or a fenced block).
//! 2. [`unescape`] removes `\_` and stray backslash artifacts.
//! 3. [`repair_any_alias`] renames the reserved word `any` used as an alias.
//!
//! None of the passes fail. Text without a recognizable statement is
//! returned unchanged apart from the artifact cleanup.
//!
//! Removing a backslash can complete a keyword (`SEL\ECT`), so the passes
//! repeat until the text stops changing. Every pass either shortens the
//! text or leaves it untouched, which bounds the loop.

pub mod extract;
pub mod repair;

pub use extract::extract_sql;
pub use repair::{repair_any_alias, unescape};

/// Extracts, unescapes and repairs `raw`.
///
/// Idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &str) -> String {
    let mut current = sanitize_once(raw);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(text: &str) -> String {
    let extracted = extract_sql(text);
    let unescaped = unescape(&extracted);
    repair_any_alias(&unescaped)
}
