//! nomina-core — search engine for payroll spreadsheets.
//!
//! This crate exposes the engine layers as public modules, plus the shared
//! tabular types the loaders produce and the front end renders.
//!
//! # Architecture
//!
//! ```text
//! Books (loaded sheets) ──┐
//! Field-column map ───────┼──► SearchEngine ──► ResultSet (per sheet)
//! Query ──────────────────┘
//! ```
//!
//! The engine is a pure function of its inputs: it borrows the sheets, never
//! mutates them, and keeps nothing between calls.

pub mod column;
pub mod config;
pub mod error;
pub mod fieldmap;
pub mod query;
pub mod search;
pub mod types;

pub use column::{column_label, resolve_letter, ColumnRef, ColumnSpec};
pub use error::{Result, SearchError};
pub use fieldmap::{resolve_field_columns, FieldColumnMap, IssueKind, MappingIssue};
pub use query::{ColumnOverride, Query};
pub use search::{
    ResultSet, SearchEngine, SearchMode, SheetKey, SheetMatches, SkipReason, Skipped, Strictness,
};
pub use types::{Book, Cell, Row, Sheet};
