//! Query builder.
//!
//! A [`Query`] maps logical field names to free-text values, plus an
//! optional subject filter and ad-hoc column overrides. Blank values are
//! kept (so a form can round-trip) but never constrain a search.

use std::fmt;

use serde::Serialize;

use crate::column::ColumnRef;
use crate::fieldmap::normalize_field;

/// An ad-hoc `(column, value)` constraint that bypasses the field map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOverride {
    pub column: ColumnRef,
    pub value: String,
}

/// A search request.
///
/// # Example
///
/// ```
/// use nomina_core::Query;
///
/// let query = Query::new()
///     .field("RFC", "abc0101")
///     .field("NOMBRE", "")
///     .subject("licencia");
///
/// assert!(!query.is_blank());
/// assert_eq!(query.to_string(), "RFC=abc0101; ASUNTO=licencia");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Query {
    fields: Vec<(String, String)>,
    subject: Option<String>,
    overrides: Vec<ColumnOverride>,
}

impl Query {
    /// Creates a new empty query. An empty query matches every row.
    pub fn new() -> Self {
        Query::default()
    }

    /// Sets the value for a field, replacing any earlier value for it.
    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = normalize_field(name);
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Sets the free-text subject filter.
    pub fn subject(mut self, text: impl Into<String>) -> Self {
        self.subject = Some(text.into());
        self
    }

    /// Adds a constraint on one explicit column.
    pub fn column(mut self, column: impl Into<ColumnRef>, value: impl Into<String>) -> Self {
        self.overrides.push(ColumnOverride {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Non-blank field constraints as `(FIELD, trimmed value)`, in insertion order.
    pub fn active_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(n, v)| (n.as_str(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
    }

    /// The subject filter, if one is set and non-blank.
    pub fn active_subject(&self) -> Option<&str> {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Column overrides with a non-blank value.
    pub fn active_overrides(&self) -> impl Iterator<Item = (&ColumnRef, &str)> {
        self.overrides
            .iter()
            .map(|o| (&o.column, o.value.trim()))
            .filter(|(_, v)| !v.is_empty())
    }

    /// `true` when nothing constrains the search (bulk browse).
    pub fn is_blank(&self) -> bool {
        self.active_fields().next().is_none()
            && self.active_subject().is_none()
            && self.active_overrides().next().is_none()
    }
}

impl fmt::Display for Query {
    /// Canonical `FIELD=value; ...` rendering of the active constraints.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .active_fields()
            .map(|(n, v)| format!("{n}={v}"))
            .collect();
        if let Some(s) = self.active_subject() {
            parts.push(format!("ASUNTO={s}"));
        }
        for (col, v) in self.active_overrides() {
            parts.push(format!("[{col}]={v}"));
        }
        f.write_str(&parts.join("; "))
    }
}
