//! Test builders — terse constructors for sheets and engines.
//!
//! These are for readability in assertions, not production use. They panic
//! on invalid input rather than returning `Result`.

use nomina_core::{Cell, FieldColumnMap, SearchEngine, SearchMode, Sheet, Strictness};

// ---------------------------------------------------------------------------
// SheetBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Sheet`] fixtures.
///
/// ```rust
/// let sheet = SheetBuilder::new("BASE")
///     .columns(["NOMBRE", "RFC"])
///     .row(["ANA", "ABC010101AAA"])
///     .build();
/// ```
pub struct SheetBuilder {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl SheetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns<const N: usize>(mut self, labels: [&str; N]) -> Self {
        self.columns = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn row<I, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// Row of explicit cells, for mixing numbers, dates and blanks.
    pub fn cells(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(cells);
        self
    }

    pub fn build(self) -> Sheet {
        let mut sheet = Sheet::new(self.name, self.columns);
        sheet.rows = self.rows;
        sheet
    }
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

/// Explicit-mode engine over `map`, strict, no ordering tweaks.
pub fn explicit_engine(map: FieldColumnMap) -> SearchEngine {
    SearchEngine::new(SearchMode::Explicit).with_field_map(map)
}

pub fn lenient_engine(map: FieldColumnMap) -> SearchEngine {
    explicit_engine(map).with_strictness(Strictness::Lenient)
}

pub fn all_columns_engine() -> SearchEngine {
    SearchEngine::new(SearchMode::AllColumns)
}
