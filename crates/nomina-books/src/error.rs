//! Error types for the loaders.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a book from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
