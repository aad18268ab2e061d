use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nomina::audit::{AuditLog, AuditRecord};
use nomina::{export, render};
use nomina_books::{load_books, Loaded};
use nomina_core::config::{Config, OutputFormat};
use nomina_core::{resolve_letter, ColumnRef, Query, SearchMode, SkipReason, Strictness};

#[derive(Parser)]
#[command(name = "nomina", about = "Search payroll spreadsheets by RFC, name, memo and more")]
struct Cli {
    /// Config file (default: ~/.config/nomina/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write debug logs to /tmp/nomina-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the configured books.
    Search(SearchArgs),
    /// List loaded books and sheets.
    Sheets,
    /// Check the field-column map against the loaded sheets.
    Validate,
    /// Print the zero-based index of spreadsheet column labels.
    Column {
        #[arg(required = true)]
        labels: Vec<String>,
    },
    /// Show recent audit log entries.
    Audit {
        /// Only entries for this user.
        #[arg(long)]
        user: Option<String>,
        /// Number of most recent entries.
        #[arg(long, default_value_t = 20)]
        last: usize,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Field constraint, e.g. `--field RFC=ABC0101` (repeatable).
    #[arg(short, long = "field", value_parser = parse_pair)]
    fields: Vec<(String, String)>,

    /// Text to look for in subject-like columns.
    #[arg(short, long)]
    subject: Option<String>,

    /// Ad-hoc column constraint, e.g. `--column AC=quincena` (repeatable).
    #[arg(short, long = "column", value_parser = parse_pair)]
    columns: Vec<(String, String)>,

    /// Search every column instead of the field map.
    #[arg(long)]
    all_columns: bool,

    /// Ignore fields that have no columns on a sheet instead of excluding the sheet.
    #[arg(long)]
    lenient: bool,

    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Rows shown per sheet (0 = all).
    #[arg(long)]
    max_rows: Option<usize>,

    /// Also write each matching sheet to `<DIR>/<sheet>.csv`.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// User recorded in the audit log.
    #[arg(short, long)]
    user: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got {s:?}"))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;

    match cli.command {
        Command::Column { labels } => {
            for label in labels {
                match resolve_letter(&label) {
                    Ok(idx) => println!("{label}\t{idx}"),
                    Err(err) => {
                        eprintln!("{err}");
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Sheets => {
            let config = load_config(cli.config.as_deref())?;
            let loaded = load(&config);
            for book in &loaded.books {
                println!("{}", book.name);
                for sheet in &book.sheets {
                    println!(
                        "  {}\t{} rows\t{} columns",
                        sheet.name,
                        sheet.row_count(),
                        sheet.column_count()
                    );
                }
            }
            report_failures(&loaded);
            Ok(exit_for(loaded.failures.is_empty()))
        }
        Command::Validate => {
            let config = load_config(cli.config.as_deref())?;
            let loaded = load(&config);
            report_failures(&loaded);
            let issues = config.field_map().validate(&loaded.books);
            for issue in &issues {
                println!("{issue}");
            }
            if issues.is_empty() && loaded.failures.is_empty() {
                println!("field map OK");
            }
            Ok(exit_for(issues.is_empty() && loaded.failures.is_empty()))
        }
        Command::Audit { user, last } => {
            let config = load_config(cli.config.as_deref())?;
            let Some(path) = &config.audit.path else {
                bail!("no audit log configured ([audit] path)");
            };
            let records: Vec<AuditRecord> = AuditLog::new(path)
                .read_all()?
                .into_iter()
                .filter(|r| user.as_deref().map_or(true, |u| r.user == u))
                .collect();
            let skip = records.len().saturating_sub(last);
            for r in &records[skip..] {
                println!("{}\t{}\t{}\t{} sheets\t{} rows", r.timestamp, r.user, r.query, r.sheets, r.rows);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Search(args) => {
            let config = load_config(cli.config.as_deref())?;
            search(&config, args)
        }
    }
}

fn search(config: &Config, args: SearchArgs) -> anyhow::Result<ExitCode> {
    let mut config = config.clone();
    if args.all_columns {
        config.search.mode = SearchMode::AllColumns;
    }
    if args.lenient {
        config.search.strictness = Strictness::Lenient;
    }
    let engine = config.engine()?;

    let mut query = Query::new();
    for (name, value) in &args.fields {
        query = query.field(name, value.as_str());
    }
    if let Some(subject) = &args.subject {
        query = query.subject(subject.as_str());
    }
    for (column, value) in &args.columns {
        query = query.column(ColumnRef::from(column.as_str()), value.as_str());
    }
    if query.is_blank() {
        tracing::warn!("blank query: every sheet is returned in full");
    }

    let loaded = load(&config);
    report_failures(&loaded);
    let results = engine.search(&loaded.books, &query);
    for skipped in results.skipped() {
        if is_notable(&skipped.reason) {
            tracing::warn!(sheet = %skipped.key, reason = %skipped.reason, "sheet not searched");
        } else {
            tracing::info!(sheet = %skipped.key, reason = %skipped.reason, "sheet not in results");
        }
    }

    let format = match args.format {
        Some(Format::Table) => OutputFormat::Table,
        Some(Format::Json) => OutputFormat::Json,
        None => config.display.format,
    };
    match format {
        OutputFormat::Table => {
            let max_rows = args.max_rows.unwrap_or(config.display.max_rows);
            print!("{}", render::render_table(&results, max_rows));
        }
        OutputFormat::Json => println!("{}", render::render_json(&results)?),
    }

    if let Some(dir) = &args.export_dir {
        let written = export::export_csv(&results, dir)?;
        eprintln!("exported {} file(s) to {}", written.len(), dir.display());
    }

    if let Some(path) = &config.audit.path {
        let user = args.user.as_deref().unwrap_or(&config.audit.user);
        let record = AuditRecord::new(chrono::Utc::now(), user, &query, &results);
        AuditLog::new(path)
            .append(&record)
            .context("recording search in audit log")?;
    }

    Ok(exit_for(loaded.failures.is_empty()))
}

/// Skips the user should hear about: the sheet was never searched because
/// of the field map or a column label, not because nothing matched.
fn is_notable(reason: &SkipReason) -> bool {
    !matches!(reason, SkipReason::NoMatches | SkipReason::EmptySheet)
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    Config::load(path).context("loading configuration")
}

fn load(config: &Config) -> Loaded {
    load_books(
        config
            .books
            .iter()
            .map(|b| (b.name.as_str(), b.path.as_path(), b.sheets.as_slice())),
    )
}

fn report_failures(loaded: &Loaded) {
    for (book, err) in &loaded.failures {
        eprintln!("could not load {book}: {err}");
    }
}

fn exit_for(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logging(debug: bool) -> anyhow::Result<()> {
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/nomina-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("nomina debug log started, tail -f /tmp/nomina-debug.log");
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .init();
    }
    Ok(())
}
