//! Column resolver — spreadsheet letter labels to zero-based positions.
//!
//! Labels follow spreadsheet numbering: `A`..`Z`, then `AA`, `AB`, ... They
//! are decoded as base-26 numerals with digits `A=1..Z=26` and shifted to a
//! zero-based index, so `A → 0`, `Z → 25`, `AA → 26`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// Decode a letter label (case-insensitive) to a zero-based column index.
///
/// Empty labels and labels containing anything other than ASCII letters are
/// rejected with [`SearchError::InvalidColumnLabel`]; surrounding whitespace
/// is ignored.
pub fn resolve_letter(label: &str) -> Result<usize> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(SearchError::InvalidColumnLabel {
            label: label.to_string(),
        });
    }

    let mut acc: usize = 0;
    for b in trimmed.bytes() {
        let digit = match b {
            b'A'..=b'Z' => (b - b'A') as usize + 1,
            b'a'..=b'z' => (b - b'a') as usize + 1,
            _ => {
                return Err(SearchError::InvalidColumnLabel {
                    label: label.to_string(),
                })
            }
        };
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| SearchError::ColumnLabelOverflow {
                label: label.to_string(),
            })?;
    }
    Ok(acc - 1)
}

/// Encode a zero-based column index as its letter label (`0 → "A"`).
pub fn column_label(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// A reference to one column: either a position or a letter label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Label(String),
}

impl ColumnRef {
    /// Resolve to a zero-based position.
    pub fn resolve(&self) -> Result<usize> {
        match self {
            ColumnRef::Index(i) => Ok(*i),
            ColumnRef::Label(l) => resolve_letter(l),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = std::convert::Infallible;

    /// All-digit text is a position; anything else is kept as a label and
    /// validated on [`ColumnRef::resolve`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(i) => ColumnRef::Index(i),
            Err(_) => ColumnRef::Label(s.to_string()),
        })
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(r) => r,
            Err(never) => match never {},
        }
    }
}

impl From<usize> for ColumnRef {
    fn from(i: usize) -> Self {
        ColumnRef::Index(i)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "{i}"),
            ColumnRef::Label(l) => f.write_str(l),
        }
    }
}

/// One configured field-column entry in its raw form.
///
/// Accepts a single label (`"C"`), a comma-separated list meaning "any of
/// these columns" (`"B, AF"`), a bare position, a list of labels/positions,
/// or an empty value meaning the field does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    #[default]
    None,
    Index(usize),
    Text(String),
    List(Vec<ColumnRef>),
}

impl ColumnSpec {
    /// Split the entry into individual column references.
    pub fn refs(&self) -> Vec<ColumnRef> {
        match self {
            ColumnSpec::None => Vec::new(),
            ColumnSpec::Index(i) => vec![ColumnRef::Index(*i)],
            ColumnSpec::Text(s) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(ColumnRef::from)
                .collect(),
            ColumnSpec::List(refs) => refs.clone(),
        }
    }

    /// Resolve every reference; the first malformed label fails the entry.
    ///
    /// An empty result means the field is not searchable on the sheet.
    pub fn resolve(&self) -> Result<Vec<usize>> {
        let mut out = Vec::new();
        for r in self.refs() {
            let idx = r.resolve()?;
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.refs().is_empty()
    }
}

impl From<&str> for ColumnSpec {
    fn from(s: &str) -> Self {
        ColumnSpec::Text(s.to_string())
    }
}

impl From<usize> for ColumnSpec {
    fn from(i: usize) -> Self {
        ColumnSpec::Index(i)
    }
}

impl<R: Into<ColumnRef>> From<Vec<R>> for ColumnSpec {
    fn from(refs: Vec<R>) -> Self {
        ColumnSpec::List(refs.into_iter().map(Into::into).collect())
    }
}
