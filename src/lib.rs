//! nomina — payroll spreadsheet search
//!
//! Command-line front end for searching payroll and administrative records
//! kept across several spreadsheet workbooks. The engine lives in
//! `nomina-core` and the loaders in `nomina-books`; this crate holds the
//! layers between the engine and the terminal so integration tests can
//! import them directly.
//!
//! # Architecture
//!
//! ```text
//! Books ──► SearchEngine ──► ResultSet ──► Render
//!                               │
//!                               ├──► Export (CSV)
//!                               └──► Audit log
//! ```

pub mod audit;
pub mod export;
pub mod render;
