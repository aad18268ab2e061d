//! Result rendering — plain-text tables or JSON.
//!
//! The row cap lives here, not in the engine: the engine always returns
//! every match and the renderer decides how much of it to show.

use nomina_core::{Cell, ResultSet, SheetMatches};
use serde::Serialize;

/// Text shown when a search matched nothing.
pub const NO_MATCHES: &str = "No matches found.";

/// Render every sheet as an aligned text table.
///
/// `max_rows` caps the rows shown per sheet (`0` shows all); the remainder
/// is summarised on a trailing `... N more rows` line.
pub fn render_table(results: &ResultSet<'_>, max_rows: usize) -> String {
    if results.is_empty() {
        return format!("{NO_MATCHES}\n");
    }
    let blocks: Vec<String> = results
        .iter()
        .map(|m| render_sheet(m, max_rows))
        .collect();
    blocks.join("\n")
}

fn render_sheet(m: &SheetMatches<'_>, max_rows: usize) -> String {
    let shown: Vec<Vec<String>> = m
        .rows()
        .take(if max_rows == 0 { usize::MAX } else { max_rows })
        .map(|row| row.iter().map(Cell::render).collect())
        .collect();

    let columns = m.columns();
    let width = columns
        .len()
        .max(shown.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; width];
    for (i, label) in columns.iter().enumerate() {
        widths[i] = widths[i].max(label.chars().count());
    }
    for row in &shown {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let noun = if m.len() == 1 { "row" } else { "rows" };
    out.push_str(&format!("{}: {} {}\n", m.key(), m.len(), noun));
    out.push_str(&line(columns.iter().map(String::as_str), &widths));
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &shown {
        out.push_str(&line(row.iter().map(String::as_str), &widths));
    }
    if shown.len() < m.len() {
        out.push_str(&format!("... {} more rows\n", m.len() - shown.len()));
    }
    out
}

fn line<'s>(mut cells: impl Iterator<Item = &'s str>, widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .map(|w| {
            let cell = cells.next().unwrap_or("");
            let pad = w.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let mut s = padded.join(" | ").trim_end().to_string();
    s.push('\n');
    s
}

#[derive(Serialize)]
struct JsonSheet<'a> {
    sheet: String,
    book: &'a str,
    columns: &'a [String],
    rows: Vec<&'a Vec<Cell>>,
}

/// Render the results as a JSON array of `{ sheet, book, columns, rows }`.
pub fn render_json(results: &ResultSet<'_>) -> serde_json::Result<String> {
    let sheets: Vec<JsonSheet<'_>> = results
        .iter()
        .map(|m| JsonSheet {
            sheet: m.key().label(),
            book: &m.key().book,
            columns: m.columns(),
            rows: m.rows().collect(),
        })
        .collect();
    serde_json::to_string_pretty(&sheets)
}
