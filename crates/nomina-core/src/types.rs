//! Core types for nomina-core.
//!
//! This module defines the tabular data the engine searches: a [`Cell`]
//! scalar, a named [`Sheet`] of positional rows, and a [`Book`] grouping the
//! sheets loaded from one source. All of them are owned by the caller and
//! only ever borrowed by the engine.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

/// One spreadsheet cell value.
///
/// Matching never looks at the variant directly: every cell is compared
/// through its canonical text rendering (see [`Cell::render`]).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Missing or blank. Never matches any substring test.
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Date or date-time, as read from the workbook.
    Date(NaiveDateTime),
}

impl Cell {
    /// Returns `true` for a missing value.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Canonical text rendering, used for display, export and matching.
    ///
    /// Floats with no fractional part render as integers (`1500.0` →
    /// `"1500"`), so a payroll amount typed as a whole number in the query
    /// still matches. Dates render as `YYYY-MM-DD`, with ` HH:MM:SS` appended
    /// only when the value carries a time component.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) => render_float(*f),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
            Cell::Date(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }

    /// Case-insensitive substring test against an already case-folded needle.
    ///
    /// Empty cells are never a match.
    pub fn contains_folded(&self, needle: &str) -> bool {
        match self {
            Cell::Empty => false,
            Cell::Text(s) => s.to_lowercase().contains(needle),
            other => other.render().to_lowercase().contains(needle),
        }
    }
}

fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(dt: NaiveDateTime) -> Self {
        Cell::Date(dt)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Empty)
    }
}

impl Serialize for Cell {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_none(),
            Cell::Int(n) => serializer.serialize_i64(*n),
            Cell::Float(f) => serializer.serialize_f64(*f),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            other => serializer.serialize_str(&other.render()),
        }
    }
}

/// A row of a sheet, one [`Cell`] per column position.
pub type Row = Vec<Cell>;

/// A named table: ordered column labels and ordered positional rows.
///
/// Rows may be shorter than `columns`; missing trailing cells read as
/// [`Cell::Empty`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, returning `self` for chaining in fixtures.
    pub fn with_row<I, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns: the header width, or the widest row when wider.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, col)`; out-of-range positions read as missing.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// A named group of sheets loaded from one source, in canonical order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Book {
    pub name: String,
    pub sheets: Vec<Sheet>,
}

impl Book {
    pub fn new(name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            name: name.into(),
            sheets,
        }
    }

    /// Sheet by name, ignoring case as spreadsheet applications do.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| same_sheet_name(&s.name, name))
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Case-insensitive sheet-name comparison.
pub fn same_sheet_name(a: &str, b: &str) -> bool {
    a.trim().to_uppercase() == b.trim().to_uppercase()
}
