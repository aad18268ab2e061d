//! nomina-books — sheet loaders for nomina.
//!
//! Each source reads one workbook (or one directory of CSV files) from local
//! disk and produces a [`nomina_core::Book`] holding only the requested
//! sheets, in the requested order. Downloading and caching the files is left
//! to whatever put them on disk.

mod csv_dir;
mod error;
mod grid;
mod workbook;

use std::path::Path;

use nomina_core::Book;
use tracing::warn;

pub use csv_dir::CsvDirSource;
pub use error::LoadError;
pub use workbook::WorkbookSource;

/// Trait implemented by each sheet source.
pub trait BookSource {
    /// Name the loaded book is known by.
    fn name(&self) -> &str;

    /// Sheet names available in the source, in source order.
    fn sheet_names(&mut self) -> Result<Vec<String>, LoadError>;

    /// Load the named sheets in the given order; an empty list loads every
    /// sheet. Requested sheets the source does not have are skipped.
    fn load(&mut self, sheets: &[String]) -> Result<Book, LoadError>;
}

/// Pick a source for `path`: a directory is read as CSV files, anything
/// else as a workbook.
pub fn open_book(name: &str, path: &Path) -> Result<Box<dyn BookSource>, LoadError> {
    if path.is_dir() {
        Ok(Box::new(CsvDirSource::new(name, path)))
    } else if path.is_file() {
        Ok(Box::new(WorkbookSource::open(name, path)?))
    } else {
        Err(LoadError::NotFound(path.to_path_buf()))
    }
}

/// Outcome of loading several books: what loaded and what failed.
#[derive(Debug, Default)]
pub struct Loaded {
    pub books: Vec<Book>,
    pub failures: Vec<(String, LoadError)>,
}

/// Load every `(name, path, sheets)` entry, continuing past failures so one
/// unreadable file does not hide the others.
pub fn load_books<'a, I>(entries: I) -> Loaded
where
    I: IntoIterator<Item = (&'a str, &'a Path, &'a [String])>,
{
    let mut loaded = Loaded::default();
    for (name, path, sheets) in entries {
        match open_book(name, path).and_then(|mut src| src.load(sheets)) {
            Ok(book) => loaded.books.push(book),
            Err(err) => {
                warn!(book = name, path = %path.display(), error = %err, "book failed to load");
                loaded.failures.push((name.to_string(), err));
            }
        }
    }
    loaded
}

/// Resolve the load order: the requested names that exist (first spelling
/// wins), or every available name when nothing was requested.
pub(crate) fn select_sheets(book: &str, available: &[String], requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return available.to_vec();
    }
    let mut out = Vec::with_capacity(requested.len());
    for want in requested {
        match available
            .iter()
            .find(|have| nomina_core::types::same_sheet_name(have, want))
        {
            Some(have) if !out.contains(have) => out.push(have.clone()),
            Some(_) => {}
            None => warn!(book, sheet = %want, "sheet not found in source, skipped"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn select_keeps_requested_order() {
        let available = names(&["BASE", "HIST", "PLANTILLA"]);
        assert_eq!(
            select_sheets("b", &available, &names(&["PLANTILLA", "base"])),
            names(&["PLANTILLA", "BASE"])
        );
    }

    #[test]
    fn select_skips_missing_and_duplicates() {
        let available = names(&["BASE"]);
        assert_eq!(
            select_sheets("b", &available, &names(&["BASE", "NOPE", "Base"])),
            names(&["BASE"])
        );
    }

    #[test]
    fn select_all_when_nothing_requested() {
        let available = names(&["B", "A"]);
        assert_eq!(select_sheets("b", &available, &[]), available);
    }

    #[test]
    fn missing_path_is_not_found() {
        let err = open_book("x", Path::new("/definitely/not/here.xlsx")).err().unwrap();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn load_books_reports_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BASE.csv"), "RFC\nABC\n").unwrap();
        let missing = dir.path().join("missing.xlsx");
        let none: Vec<String> = Vec::new();
        let loaded = load_books([
            ("roto", missing.as_path(), none.as_slice()),
            ("csv", dir.path(), none.as_slice()),
        ]);
        assert_eq!(loaded.books.len(), 1);
        assert_eq!(loaded.books[0].name, "csv");
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].0, "roto");
    }
}
