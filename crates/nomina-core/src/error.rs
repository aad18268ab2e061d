//! Error types for the engine.

use thiserror::Error;

/// Errors raised while resolving column references.
///
/// The engine never lets one of these abort a search: a resolution failure
/// on a `(field, sheet)` pair degrades to "field not applicable" for that
/// sheet and is reported through [`SkipReason`](crate::search::SkipReason).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A column reference is empty or contains characters outside `A-Z`.
    #[error("invalid column label {label:?}")]
    InvalidColumnLabel { label: String },

    /// A column label decodes past the largest representable index.
    #[error("column label {label:?} is out of range")]
    ColumnLabelOverflow { label: String },

    /// The subject-column pattern does not compile.
    #[error("invalid subject pattern: {0}")]
    InvalidSubjectPattern(String),
}

impl From<regex::Error> for SearchError {
    fn from(err: regex::Error) -> Self {
        SearchError::InvalidSubjectPattern(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SearchError>;
