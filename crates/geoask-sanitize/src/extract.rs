// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-statement extraction from free-form model output.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Statement shapes, matched anywhere in the text. The earliest match wins.
///
/// `CREATE TABLE` and `WITH` are uppercase-only: in lowercase they are
/// ordinary English ("the query with the join"). `SELECT` matches any case.
static STATEMENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // CREATE TABLE ... AS ...;
        Regex::new(r"(?s)\bCREATE\s+TABLE\b.*?\bAS\b.*?;").unwrap(),
        // Common table expression.
        Regex::new(r"(?s)\bWITH\b\s.*?;").unwrap(),
        Regex::new(r"(?is)\bSELECT\b.*?;").unwrap(),
    ]
});

static SQL_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```sql\s*\n(.*?)```").unwrap());

static PLAIN_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());

/// Returns the first SQL statement in `text`.
///
/// Lookup order:
/// 1. the earliest `CREATE TABLE .. AS ..;`, `WITH ..;` or `SELECT ..;`
///    (semicolon included),
/// 2. the body of the first ```` ```sql ```` block,
/// 3. the body of the first plain ```` ``` ```` block,
/// 4. `text` unchanged.
pub fn extract_sql(text: &str) -> String {
    let earliest = STATEMENT_PATTERNS
        .iter()
        .filter_map(|re| re.find(text))
        .min_by_key(|m| m.start());

    if let Some(m) = earliest {
        debug!(start = m.start(), len = m.len(), "extracted statement");
        return m.as_str().to_string();
    }

    for fence in [&*SQL_FENCE, &*PLAIN_FENCE] {
        if let Some(body) = fence.captures(text).and_then(|c| c.get(1)) {
            debug!("extracted fenced block");
            return body.as_str().trim().to_string();
        }
    }

    debug!("no SQL statement found, returning text unchanged");
    text.to_string()
}
