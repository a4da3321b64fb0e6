// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text tables for query results and training data.

use geoask_core::{QueryRows, TrainingRecord};

/// Rows printed before the output is cut.
pub const MAX_DISPLAY_ROWS: usize = 50;

/// Longest cell printed before truncation, in characters.
const MAX_CELL_CHARS: usize = 60;

/// Renders rows as an aligned table. Rows beyond [`MAX_DISPLAY_ROWS`] are
/// summarized in a trailing line.
pub fn rows_table(rows: &QueryRows) -> String {
    let body: Vec<Vec<String>> = rows
        .rows
        .iter()
        .take(MAX_DISPLAY_ROWS)
        .map(|row| row.iter().map(cell).collect())
        .collect();
    let mut out = table(&rows.columns, &body);
    if rows.len() > MAX_DISPLAY_ROWS {
        out.push_str(&format!("... {} more rows\n", rows.len() - MAX_DISPLAY_ROWS));
    }
    out.push_str(&format!("({} rows)\n", rows.len()));
    out
}

/// Renders training records, one per line.
pub fn training_table(records: &[TrainingRecord]) -> String {
    if records.is_empty() {
        return "no training data\n".to_string();
    }
    let header = ["id", "kind", "question", "content"].map(String::from);
    let body: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.kind.to_string(),
                truncate(r.question.as_deref().unwrap_or("")),
                truncate(&r.content),
            ]
        })
        .collect();
    table(&header, &body)
}

fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => truncate(s),
        other => truncate(&other.to_string()),
    }
}

fn truncate(text: &str) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_CELL_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_CELL_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

fn table(header: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (i, value) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(value.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(header);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in body {
        out.push_str(&line(row));
    }
    out
}
