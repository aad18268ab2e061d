//! Field-column map — which physical columns back each logical field.
//!
//! A single structured mapping keyed by `(field, sheet)` replaces positional
//! per-sheet tables. Field and sheet names are both case-insensitive and
//! stored upper-cased, matching how spreadsheet tabs are told apart.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::column::{ColumnRef, ColumnSpec};
use crate::error::Result;
use crate::types::Book;

/// `field → sheet → columns`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, BTreeMap<String, ColumnSpec>>")]
pub struct FieldColumnMap {
    entries: BTreeMap<String, BTreeMap<String, ColumnSpec>>,
}

impl From<BTreeMap<String, BTreeMap<String, ColumnSpec>>> for FieldColumnMap {
    fn from(raw: BTreeMap<String, BTreeMap<String, ColumnSpec>>) -> Self {
        let mut map = FieldColumnMap::new();
        for (field, sheets) in raw {
            for (sheet, spec) in sheets {
                map.insert(&field, sheet, spec);
            }
        }
        map
    }
}

impl FieldColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FieldColumnMap::insert`].
    pub fn with(mut self, field: &str, sheet: impl Into<String>, spec: impl Into<ColumnSpec>) -> Self {
        self.insert(field, sheet, spec);
        self
    }

    pub fn insert(&mut self, field: &str, sheet: impl Into<String>, spec: impl Into<ColumnSpec>) {
        let sheet: String = sheet.into();
        self.entries
            .entry(normalize_field(field))
            .or_default()
            .insert(normalize_name(&sheet), spec.into());
    }

    /// Raw entry for a `(field, sheet)` pair, if one is configured.
    pub fn get(&self, field: &str, sheet: &str) -> Option<&ColumnSpec> {
        self.entries
            .get(&normalize_field(field))?
            .get(&normalize_name(sheet))
    }

    /// Known field names, upper-cased, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every entry against the loaded books.
    ///
    /// Reports entries naming a sheet no book contains, entries with a
    /// malformed label, and entries pointing past a sheet's last column.
    /// Unknown sheets are checked once per entry; column bounds are checked
    /// against every book that carries the sheet.
    pub fn validate(&self, books: &[Book]) -> Vec<MappingIssue> {
        let mut issues = Vec::new();
        for (field, sheets) in &self.entries {
            for (sheet_name, spec) in sheets {
                if let Err(err) = spec.resolve() {
                    issues.push(MappingIssue {
                        field: field.clone(),
                        sheet: sheet_name.clone(),
                        kind: IssueKind::MalformedLabel(err.to_string()),
                    });
                    continue;
                }

                let carriers: Vec<_> = books
                    .iter()
                    .filter_map(|b| b.sheet(sheet_name).map(|s| (b, s)))
                    .collect();
                if carriers.is_empty() {
                    issues.push(MappingIssue {
                        field: field.clone(),
                        sheet: sheet_name.clone(),
                        kind: IssueKind::UnknownSheet,
                    });
                    continue;
                }

                for (book, sheet) in carriers {
                    let width = sheet.column_count();
                    for r in spec.refs() {
                        let idx = r.resolve().unwrap_or(0);
                        if idx >= width {
                            issues.push(MappingIssue {
                                field: field.clone(),
                                sheet: sheet_name.clone(),
                                kind: IssueKind::ColumnOutOfRange {
                                    book: book.name.clone(),
                                    column: r,
                                    width,
                                },
                            });
                        }
                    }
                }
            }
        }
        issues
    }
}

/// Resolve the columns a field is searched in on one sheet.
///
/// An absent or empty entry yields an empty list: the field is not
/// searchable on that sheet. A malformed label is an error the caller is
/// expected to treat the same way.
pub fn resolve_field_columns(field: &str, sheet: &str, map: &FieldColumnMap) -> Result<Vec<usize>> {
    match map.get(field, sheet) {
        Some(spec) => spec.resolve(),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn normalize_field(field: &str) -> String {
    normalize_name(field)
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// A problem found by [`FieldColumnMap::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingIssue {
    pub field: String,
    pub sheet: String,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    UnknownSheet,
    MalformedLabel(String),
    ColumnOutOfRange {
        book: String,
        column: ColumnRef,
        width: usize,
    },
}

impl fmt::Display for MappingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}: ", self.field, self.sheet)?;
        match &self.kind {
            IssueKind::UnknownSheet => write!(f, "sheet not found in any book"),
            IssueKind::MalformedLabel(msg) => write!(f, "{msg}"),
            IssueKind::ColumnOutOfRange {
                book,
                column,
                width,
            } => write!(
                f,
                "column {column} is past the last column of {book} ({width} columns)"
            ),
        }
    }
}
