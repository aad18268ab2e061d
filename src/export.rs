//! Export layer — matched rows to CSV files.
//!
//! One file per result entry, header row first, cells in their canonical
//! text rendering.

use std::path::{Path, PathBuf};

use anyhow::Context;
use nomina_core::{Cell, ResultSet, SheetMatches};

/// Write every result entry to `<dir>/<label>.csv`, creating `dir` if needed.
///
/// Returns the written paths in result order. An empty result set writes
/// nothing.
pub fn export_csv(results: &ResultSet<'_>, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(results.len());
    for m in results {
        let path = dir.join(format!("{}.csv", file_stem(&m.key().label())));
        write_sheet(m, &path).with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), rows = m.len(), "exported sheet");
        written.push(path);
    }
    Ok(written)
}

fn write_sheet(m: &SheetMatches<'_>, path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(m.columns())?;
    for row in m.rows() {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    writer.flush()?;
    Ok(())
}

/// File-system-safe stem for a sheet label (`control/BASE` → `control_BASE`).
pub fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
