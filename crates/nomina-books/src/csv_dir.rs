//! Directory-of-CSV source: `<dir>/<SHEET>.csv` is one sheet.

use std::path::{Path, PathBuf};

use nomina_core::{Book, Cell, Row};
use tracing::debug;

use crate::error::LoadError;
use crate::grid::build_sheet;
use crate::{select_sheets, BookSource};

/// Reads every `*.csv` file in a directory as a sheet named by the file stem.
///
/// Cell values are kept as text.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    name: String,
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }

    /// `(sheet name, file)` for every CSV file, sorted by name.
    fn entries(&self) -> Result<Vec<(String, PathBuf)>, LoadError> {
        let mut entries: Vec<(String, PathBuf)> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .filter_map(|path| {
                let stem = path.file_stem()?.to_string_lossy().into_owned();
                Some((stem, path))
            })
            .collect();
        // Directory iteration order is platform-defined.
        entries.sort();
        Ok(entries)
    }
}

impl BookSource for CsvDirSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&mut self) -> Result<Vec<String>, LoadError> {
        Ok(self.entries()?.into_iter().map(|(name, _)| name).collect())
    }

    fn load(&mut self, sheets: &[String]) -> Result<Book, LoadError> {
        let entries = self.entries()?;
        let available: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        let mut loaded = Vec::new();
        for sheet in select_sheets(&self.name, &available, sheets) {
            let Some((_, path)) = entries.iter().find(|(name, _)| *name == sheet) else {
                continue;
            };
            let rows = read_rows(path)?;
            debug!(book = %self.name, sheet = %sheet, rows = rows.len(), "csv sheet read");
            loaded.push(build_sheet(&sheet, rows.into_iter()));
        }
        Ok(Book::new(self.name.clone(), loaded))
    }
}

fn read_rows(path: &Path) -> Result<Vec<Row>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from).collect());
    }
    Ok(rows)
}
