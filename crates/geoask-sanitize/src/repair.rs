// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Literal text repairs for known generation artifacts.

/// `any` is reserved in PostgreSQL but models keep using it as an alias.
/// Order matters: alias positions first, then list positions, then the
/// generic space-delimited forms.
const ANY_ALIAS_PATTERNS: &[(&str, &str)] = &[
    ("AS any,", "AS y,"),
    ("AS any ", "AS y "),
    ("AS any;", "AS y;"),
    ("BY any,", "BY y,"),
    ("BY any ", "BY y "),
    ("BY any;", "BY y;"),
    (",any,", ",y,"),
    (",any;", ",y;"),
    (", any,", ", y,"),
    (", any ", ", y "),
    (", any;", ", y;"),
    (" any,", " y,"),
    (" any;", " y;"),
    (" any ", " y "),
];

/// Rewrites `\_` to `_` and drops every other backslash.
pub fn unescape(sql: &str) -> String {
    sql.replace("\\_", "_").replace('\\', "")
}

/// Renames the bare word `any` to `y` where it appears as an alias or list item.
///
/// Each pattern is applied until it no longer occurs, so overlapping
/// occurrences such as `,any,any,` are all rewritten.
pub fn repair_any_alias(sql: &str) -> String {
    let mut out = sql.to_string();
    for (pattern, replacement) in ANY_ALIAS_PATTERNS {
        while out.contains(pattern) {
            out = out.replace(pattern, replacement);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_underscore_and_stray_backslashes() {
        assert_eq!(unescape(r"nom\_municipi"), "nom_municipi");
        assert_eq!(unescape(r"a\b\\c"), "abc");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn alias_after_as_and_by() {
        assert_eq!(
            repair_any_alias("SELECT x AS any, count(*) FROM t GROUP BY any;"),
            "SELECT x AS y, count(*) FROM t GROUP BY y;"
        );
        assert_eq!(repair_any_alias("ORDER BY any DESC"), "ORDER BY y DESC");
    }

    #[test]
    fn list_positions() {
        assert_eq!(repair_any_alias("GROUP BY 1,any,2"), "GROUP BY 1,y,2");
        assert_eq!(repair_any_alias("a, any, b"), "a, y, b");
        assert_eq!(repair_any_alias(",any,any,any;"), ",y,y,y;");
    }

    #[test]
    fn leaves_other_words_alone() {
        let sql = "SELECT company, anything FROM t WHERE x = ANY(ARRAY[1]);";
        assert_eq!(repair_any_alias(sql), sql);
    }

    #[test]
    fn trailing_any_without_delimiter_is_kept() {
        assert_eq!(repair_any_alias("SELECT 1 AS any"), "SELECT 1 AS any");
    }
}
