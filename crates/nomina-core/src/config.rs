//! Configuration types for nomina.
//!
//! [`Config::load`] reads `~/.config/nomina/config.toml` (or an explicit
//! path), creating the default file if it does not yet exist, and layers
//! `NOMINA__*` environment variables on top. [`Config::defaults`] returns
//! the built-in defaults without touching the filesystem (useful in tests).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fieldmap::FieldColumnMap;
use crate::search::{SearchEngine, SearchMode, Strictness, DEFAULT_SUBJECT_PATTERN};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[search]
mode            = "explicit"
strictness      = "strict"
subject_pattern = "(?i)asunto|subject"

[display]
max_rows = 200
format   = "table"

[audit]
user = "anonimo"

# Books are searched in the order listed; `sheets` is the canonical sheet
# order inside each book.
#
# [[books]]
# name   = "control"
# path   = "control_nomina.xlsx"
# sheets = ["BASE", "QUINCENAS"]
#
# [fields.RFC]
# BASE      = "C"
# QUINCENAS = "B, F"
"#;

const ENV_PREFIX: &str = "NOMINA";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub books: Vec<BookConfig>,
    #[serde(default)]
    pub fields: FieldColumnMap,
}

/// `[search]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub priority_sheet: Option<String>,
    #[serde(default = "default_subject_pattern")]
    pub subject_pattern: String,
}

fn default_subject_pattern() -> String { DEFAULT_SUBJECT_PATTERN.to_string() }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            strictness: Strictness::default(),
            priority_sheet: None,
            subject_pattern: default_subject_pattern(),
        }
    }
}

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// `[display]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Rows shown per sheet; the rest are summarised. `0` shows everything.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_max_rows() -> usize { 200 }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            format: OutputFormat::default(),
        }
    }
}

/// `[audit]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// CSV file every search is appended to. No audit log when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String { "anonimo".to_string() }

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: None,
            user: default_user(),
        }
    }
}

/// One `[[books]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct BookConfig {
    pub name: String,
    pub path: PathBuf,
    /// Canonical sheet order. Empty loads every sheet in source order.
    #[serde(default)]
    pub sheets: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `path`, or from `~/.config/nomina/config.toml` when `None`,
    /// layered on top of the built-in defaults and under `NOMINA__*`
    /// environment variables. Creates the default file if it does not exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = config_path();
                if !p.exists() {
                    if let Some(parent) = p.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&p, DEFAULT_CONFIG.trim_start())?;
                }
                p
            }
        };

        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(true))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        cfg.resolve_paths(path.parent())
    }

    /// Parse a TOML document layered on the built-in defaults.
    pub fn from_toml(src: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(src, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    /// The configured field-column map.
    pub fn field_map(&self) -> FieldColumnMap {
        self.fields.clone()
    }

    /// Build the search engine described by `[search]`, `[[books]]` and `[fields]`.
    ///
    /// The canonical sheet order is the concatenation of every book's
    /// `sheets` list, so a sheet name keeps the position of its first
    /// appearance. Fails when `subject_pattern` is not a valid regex.
    pub fn engine(&self) -> anyhow::Result<SearchEngine> {
        let mut engine = SearchEngine::new(self.search.mode)
            .with_strictness(self.search.strictness)
            .with_field_map(self.field_map())
            .with_subject_pattern(&self.search.subject_pattern)?;

        let order: Vec<&str> = self
            .books
            .iter()
            .flat_map(|b| b.sheets.iter().map(String::as_str))
            .collect();
        if !order.is_empty() && self.books.iter().all(|b| !b.sheets.is_empty()) {
            engine = engine.with_sheet_order(order);
        }
        if let Some(priority) = &self.search.priority_sheet {
            engine = engine.with_priority_sheet(priority.clone());
        }
        Ok(engine)
    }

    /// Relative book and audit paths are taken from the config file's directory.
    fn resolve_paths(mut self, base: Option<&Path>) -> anyhow::Result<Self> {
        let Some(base) = base else {
            return Ok(self);
        };
        for book in &mut self.books {
            if book.path.is_relative() {
                book.path = base.join(&book.path);
            }
        }
        if let Some(p) = self.audit.path.as_mut() {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("nomina")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
