//! Header/row shaping shared by every source.
//!
//! The first row is the header; blank header cells are named by their
//! column letter. Rows whose cells are all empty are dropped and short rows
//! are padded so every row is as wide as the sheet.

use nomina_core::{column_label, Cell, Row, Sheet};

pub(crate) fn build_sheet<I>(name: &str, mut rows: I) -> Sheet
where
    I: Iterator<Item = Row>,
{
    let header = rows.next().unwrap_or_default();
    let mut body: Vec<Row> = rows
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    let width = body
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(header.len());

    let columns = (0..width)
        .map(|i| match header.get(i) {
            Some(cell) if !cell.is_empty() => cell.render().trim().to_string(),
            _ => column_label(i),
        })
        .collect();

    for row in &mut body {
        row.resize(width, Cell::Empty);
    }

    Sheet {
        name: name.to_string(),
        columns,
        rows: body,
    }
}
