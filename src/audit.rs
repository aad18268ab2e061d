//! Audit log — one CSV line per search: who searched for what, and what came back.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use nomina_core::{Query, ResultSet};
use serde::{Deserialize, Serialize};

/// One audit line. Column order is the file's header order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// RFC 3339, UTC, whole seconds.
    pub timestamp: String,
    pub user: String,
    /// Canonical `FIELD=value; ...` rendering of the active constraints.
    pub query: String,
    /// Sheets with at least one match.
    pub sheets: usize,
    /// Matching rows across all sheets.
    pub rows: usize,
}

impl AuditRecord {
    pub fn new(at: DateTime<Utc>, user: &str, query: &Query, results: &ResultSet<'_>) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            user: user.to_string(),
            query: query.to_string(),
            sheets: results.len(),
            rows: results.total_rows(),
        }
    }
}

/// Append-only CSV audit file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record, writing the header first if the file is new or empty.
    pub fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let fresh = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening audit log {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(fresh)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Every record in file order. A missing file reads as empty.
    pub fn read_all(&self) -> anyhow::Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("reading audit log {}", self.path.display()))?;
        reader
            .deserialize()
            .collect::<Result<Vec<AuditRecord>, _>>()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nomina_core::{Book, SearchEngine, SearchMode, Sheet};
    use pretty_assertions::assert_eq;

    #[test]
    fn record_summarises_search() {
        let books = vec![Book::new(
            "control",
            vec![Sheet::new("BASE", vec!["RFC".into()]).with_row(["ABC"])],
        )];
        let query = Query::new().field("RFC", "abc");
        let rs = SearchEngine::new(SearchMode::AllColumns).search(&books, &query);
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let record = AuditRecord::new(at, "rh01", &query, &rs);
        assert_eq!(
            record,
            AuditRecord {
                timestamp: "2024-03-15T09:30:00Z".into(),
                user: "rh01".into(),
                query: "RFC=abc".into(),
                sheets: 1,
                rows: 1,
            }
        );
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("logs/audit.csv"));
        let record = AuditRecord {
            timestamp: "2024-03-15T09:30:00Z".into(),
            user: "rh01".into(),
            query: "RFC=abc; NOMBRE=ana".into(),
            sheets: 2,
            rows: 3,
        };
        log.append(&record).unwrap();
        log.append(&record).unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            text,
            "timestamp,user,query,sheets,rows\n\
             2024-03-15T09:30:00Z,rh01,RFC=abc; NOMBRE=ana,2,3\n\
             2024-03-15T09:30:00Z,rh01,RFC=abc; NOMBRE=ana,2,3\n"
        );
        assert_eq!(log.read_all().unwrap(), vec![record.clone(), record]);
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AuditLog::new(dir.path().join("none.csv")).read_all().unwrap().is_empty());
    }
}
