//! Search layer — multi-sheet, multi-field substring matching.
//!
//! For every sheet the engine builds a row mask and narrows it once per
//! active constraint:
//!
//! ```text
//! row matches = ∧ over fields   ( ∨ over the field's columns: cell ⊇ value )
//!             ∧ subject         ( ∨ over subject-like columns )
//!             ∧ over overrides  ( override column ⊇ value )
//! ```
//!
//! Containment is case-insensitive and works on each cell's text rendering;
//! missing cells never match. A field that has no columns on a sheet
//! excludes that sheet in [`Strictness::Strict`] mode and is skipped in
//! [`Strictness::Lenient`] mode.
//!
//! The engine holds no mutable state. [`SearchEngine::search`] only borrows
//! the books it is given, so one engine may serve any number of callers.

use std::fmt;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SearchError};
use crate::fieldmap::{resolve_field_columns, FieldColumnMap};
use crate::query::Query;
use crate::types::{same_sheet_name, Book, Row, Sheet};

/// Header pattern that marks a column as subject-like.
pub const DEFAULT_SUBJECT_PATTERN: &str = "(?i)asunto|subject";

/// How a field finds its columns on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Columns come from the [`FieldColumnMap`].
    #[default]
    Explicit,
    /// Every column of the sheet is searched for every field.
    AllColumns,
}

/// What happens to a sheet on which a non-blank field has no columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// The sheet is excluded from the results.
    #[default]
    Strict,
    /// The field is ignored on that sheet.
    Lenient,
}

/// Configured search engine.
///
/// # Example
///
/// ```
/// use nomina_core::{Book, FieldColumnMap, Query, SearchEngine, SearchMode, Sheet};
///
/// let base = Sheet::new("BASE", vec!["NOMBRE".into(), "RFC".into()])
///     .with_row(["ANA", "ABC010101AAA"])
///     .with_row(["LUIS", "XYZ020202BBB"]);
/// let books = vec![Book::new("control", vec![base])];
///
/// let engine = SearchEngine::new(SearchMode::Explicit)
///     .with_field_map(FieldColumnMap::new().with("RFC", "BASE", "B"));
///
/// let results = engine.search(&books, &Query::new().field("RFC", "abc"));
/// assert_eq!(results.total_rows(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SearchEngine {
    mode: SearchMode,
    strictness: Strictness,
    field_map: FieldColumnMap,
    sheet_order: Vec<String>,
    priority_sheet: Option<String>,
    subject_pattern: Regex,
}

impl SearchEngine {
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            strictness: Strictness::default(),
            field_map: FieldColumnMap::default(),
            sheet_order: Vec::new(),
            priority_sheet: None,
            subject_pattern: Regex::new(DEFAULT_SUBJECT_PATTERN)
                .expect("built-in subject pattern must compile"),
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_field_map(mut self, map: FieldColumnMap) -> Self {
        self.field_map = map;
        self
    }

    /// Canonical sheet order. Only sheets named here are searched; with no
    /// order set, each book's own sheet order is used.
    pub fn with_sheet_order<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sheet_order = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sheet that is always listed first when it has matches.
    pub fn with_priority_sheet(mut self, name: impl Into<String>) -> Self {
        self.priority_sheet = Some(name.into());
        self
    }

    /// Regular expression selecting subject-like columns by header.
    pub fn with_subject_pattern(mut self, pattern: &str) -> Result<Self> {
        self.subject_pattern = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn field_map(&self) -> &FieldColumnMap {
        &self.field_map
    }

    /// Run `query` against every book.
    ///
    /// Results follow book order, then canonical sheet order, with the
    /// priority sheet hoisted to the front. Sheets that contribute nothing
    /// are reported through [`ResultSet::skipped`].
    pub fn search<'a>(&self, books: &'a [Book], query: &Query) -> ResultSet<'a> {
        let qualified = books.len() > 1;
        let mut matches = Vec::new();
        let mut skipped = Vec::new();

        if query.is_blank() {
            debug!("blank query: every non-empty sheet is returned in full");
        }

        for book in books {
            for name in self.sheet_names(book) {
                let Some(sheet) = book.sheet(name) else {
                    continue;
                };
                let key = SheetKey {
                    book: book.name.clone(),
                    sheet: sheet.name.clone(),
                    qualified,
                };
                match self.search_sheet(sheet, query) {
                    Ok(rows) if rows.is_empty() => {
                        debug!(sheet = %key, "no matching rows");
                        skipped.push(Skipped {
                            key,
                            reason: SkipReason::NoMatches,
                        });
                    }
                    Ok(rows) => {
                        debug!(sheet = %key, rows = rows.len(), "sheet matched");
                        matches.push(SheetMatches { key, sheet, rows });
                    }
                    Err(reason) => {
                        debug!(sheet = %key, %reason, "sheet skipped");
                        skipped.push(Skipped { key, reason });
                    }
                }
            }
        }

        if let Some(priority) = &self.priority_sheet {
            // Stable: the rest keep canonical order.
            matches.sort_by_key(|m| !same_sheet_name(&m.key.sheet, priority));
        }

        ResultSet { matches, skipped }
    }

    fn sheet_names<'b>(&'b self, book: &'b Book) -> Vec<&'b str> {
        if self.sheet_order.is_empty() {
            book.sheet_names().collect()
        } else {
            let mut names: Vec<&str> = Vec::with_capacity(self.sheet_order.len());
            for name in &self.sheet_order {
                if !names.iter().any(|n| same_sheet_name(n, name)) {
                    names.push(name.as_str());
                }
            }
            names
        }
    }

    /// Matching row positions of one sheet, or the reason it contributes nothing.
    fn search_sheet(&self, sheet: &Sheet, query: &Query) -> std::result::Result<Vec<usize>, SkipReason> {
        if sheet.is_empty() {
            return Err(SkipReason::EmptySheet);
        }

        let mut mask = vec![true; sheet.row_count()];

        for (field, value) in query.active_fields() {
            let columns = match self.field_columns(field, sheet) {
                Ok(columns) => columns,
                Err(err) => {
                    warn!(field, sheet = %sheet.name, error = %err, "column mapping not usable");
                    match self.strictness {
                        Strictness::Strict => {
                            return Err(SkipReason::InvalidColumnLabel {
                                field: field.to_string(),
                                error: err,
                            })
                        }
                        Strictness::Lenient => continue,
                    }
                }
            };
            if columns.is_empty() {
                match self.strictness {
                    Strictness::Strict => {
                        return Err(SkipReason::FieldNotApplicable {
                            field: field.to_string(),
                        })
                    }
                    Strictness::Lenient => {
                        debug!(field, sheet = %sheet.name, "field not applicable, ignored");
                        continue;
                    }
                }
            }
            and_any(&mut mask, sheet, &columns, &value.to_lowercase());
        }

        if let Some(subject) = query.active_subject() {
            let columns = self.subject_columns(sheet);
            if columns.is_empty() {
                debug!(sheet = %sheet.name, "no subject column, subject filter ignored");
            } else {
                and_any(&mut mask, sheet, &columns, &subject.to_lowercase());
            }
        }

        for (column, value) in query.active_overrides() {
            match column.resolve() {
                Ok(idx) => and_any(&mut mask, sheet, &[idx], &value.to_lowercase()),
                Err(err) => {
                    warn!(column = %column, error = %err, "column override not usable");
                    return Err(SkipReason::InvalidColumnLabel {
                        field: format!("[{column}]"),
                        error: err,
                    });
                }
            }
        }

        Ok(mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect())
    }

    fn field_columns(&self, field: &str, sheet: &Sheet) -> Result<Vec<usize>> {
        match self.mode {
            SearchMode::AllColumns => Ok((0..sheet.column_count()).collect()),
            SearchMode::Explicit => resolve_field_columns(field, &sheet.name, &self.field_map),
        }
    }

    fn subject_columns(&self, sheet: &Sheet) -> Vec<usize> {
        sheet
            .columns
            .iter()
            .enumerate()
            .filter(|(_, label)| self.subject_pattern.is_match(label))
            .map(|(i, _)| i)
            .collect()
    }
}

/// `mask[i] &= any column of row i contains needle`.
fn and_any(mask: &mut [bool], sheet: &Sheet, columns: &[usize], needle: &str) {
    for (row, keep) in mask.iter_mut().enumerate() {
        if *keep {
            *keep = columns
                .iter()
                .any(|&col| sheet.cell(row, col).contains_folded(needle));
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Identity of one searched sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    pub book: String,
    pub sheet: String,
    qualified: bool,
}

impl SheetKey {
    /// Bare sheet name for a single book, `BOOK/SHEET` when books were merged.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualified {
            write!(f, "{}/{}", self.book, self.sheet)
        } else {
            f.write_str(&self.sheet)
        }
    }
}

/// Matching rows of one sheet, borrowed from the input.
#[derive(Debug, Clone)]
pub struct SheetMatches<'a> {
    key: SheetKey,
    sheet: &'a Sheet,
    rows: Vec<usize>,
}

impl<'a> SheetMatches<'a> {
    pub fn key(&self) -> &SheetKey {
        &self.key
    }

    pub fn sheet(&self) -> &'a Sheet {
        self.sheet
    }

    pub fn columns(&self) -> &'a [String] {
        &self.sheet.columns
    }

    /// Positions of the matching rows in the source sheet.
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Row> + '_ {
        let sheet = self.sheet;
        self.rows.iter().map(move |&i| &sheet.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy the matching rows into a standalone sheet named by the key label.
    pub fn to_sheet(&self) -> Sheet {
        Sheet {
            name: self.key.label(),
            columns: self.sheet.columns.clone(),
            rows: self.rows().cloned().collect(),
        }
    }
}

/// Why a sheet contributed no entry to a [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The sheet has no rows.
    EmptySheet,
    /// A non-blank field has no columns on this sheet.
    FieldNotApplicable { field: String },
    /// A column reference for this sheet could not be decoded.
    InvalidColumnLabel { field: String, error: SearchError },
    /// Every constraint applied but no row satisfied them all.
    NoMatches,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptySheet => write!(f, "sheet is empty"),
            SkipReason::FieldNotApplicable { field } => {
                write!(f, "field {field} does not apply to this sheet")
            }
            SkipReason::InvalidColumnLabel { field, error } => write!(f, "{field}: {error}"),
            SkipReason::NoMatches => write!(f, "no matches"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub key: SheetKey,
    pub reason: SkipReason,
}

/// Per-sheet search results in display order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet<'a> {
    matches: Vec<SheetMatches<'a>>,
    skipped: Vec<Skipped>,
}

impl<'a> ResultSet<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, SheetMatches<'a>> {
        self.matches.iter()
    }

    /// Number of sheets with matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Matches for a sheet, by its display label.
    pub fn get(&self, label: &str) -> Option<&SheetMatches<'a>> {
        self.matches.iter().find(|m| m.key.label() == label)
    }

    pub fn labels(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.key.label()).collect()
    }

    /// Matching rows across every sheet.
    pub fn total_rows(&self) -> usize {
        self.matches.iter().map(SheetMatches::len).sum()
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }
}

impl<'r, 'a> IntoIterator for &'r ResultSet<'a> {
    type Item = &'r SheetMatches<'a>;
    type IntoIter = std::slice::Iter<'r, SheetMatches<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
