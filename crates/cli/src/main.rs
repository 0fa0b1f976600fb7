// parceljoin CLI - join a county property roll to its recent mortgage recordings

mod exit_codes;
mod fetch;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use parceljoin_join::{JoinConfig, JoinError, JoinResult, Table, TableKind, UnmatchedPolicy};
use url::Url;

use exit_codes::{
    EXIT_CONFIG, EXIT_ERROR, EXIT_MISSING_COLUMN, EXIT_OUTPUT, EXIT_SOURCE, EXIT_SUCCESS,
    EXIT_USAGE,
};
use fetch::{Fetcher, Source, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS};

const DEFAULT_OUTPUT: &str = "miami_dade_mortgage_assessed_join.csv";

#[derive(Parser)]
#[command(name = "parceljoin")]
#[command(about = "Join a property assessment roll to recent mortgage recordings")]
#[command(long_version = long_version())]
#[command(version)]
#[command(group(
    ArgGroup::new("properties")
        .required(true)
        .args(["properties_csv", "properties_url"])
))]
#[command(group(
    ArgGroup::new("mortgages")
        .required(true)
        .args(["mortgages_csv", "mortgages_url"])
))]
#[command(after_help = "\
Examples:
  parceljoin --properties-csv roll.csv --mortgages-csv records.csv
  parceljoin --properties-url https://example.org/roll.csv \\
             --mortgages-csv records.csv --years 1 --unmatched drop
  parceljoin --properties-csv roll.csv --mortgages-csv records.csv \\
             --config join.toml --as-of 2026-10-18 --summary-json run.json")]
struct Cli {
    /// Property roll CSV file
    #[arg(long, value_name = "PATH")]
    properties_csv: Option<PathBuf>,

    /// Property roll CSV URL
    #[arg(long, value_name = "URL", value_parser = fetch::parse_http_url)]
    properties_url: Option<Url>,

    /// Official records (mortgage recordings) CSV file
    #[arg(long, value_name = "PATH")]
    mortgages_csv: Option<PathBuf>,

    /// Official records (mortgage recordings) CSV URL
    #[arg(long, value_name = "URL", value_parser = fetch::parse_http_url)]
    mortgages_url: Option<Url>,

    /// Output CSV path (parent directories are created)
    #[arg(long, short = 'o', value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Lookback window in years [default: 2, or the config value]
    #[arg(long, value_name = "N")]
    years: Option<u32>,

    /// What to do with properties that have no recent mortgage [default: keep, or the config value]
    #[arg(long, value_enum)]
    unmatched: Option<UnmatchedArg>,

    /// TOML join config (column aliases, tier order, doc type, policy)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Evaluate the lookback window as of this date instead of today
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_as_of)]
    as_of: Option<NaiveDate>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// HTTP retries on 429, 5xx and connection errors
    #[arg(long, value_name = "N", default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    /// Also write run metadata and summary counts as JSON
    #[arg(long, value_name = "PATH")]
    summary_json: Option<PathBuf>,

    /// Suppress the summary on stderr
    #[arg(long, short = 'q')]
    quiet: bool,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum UnmatchedArg {
    /// Emit the property with blank mortgage fields
    Keep,
    /// Leave the property out
    Drop,
}

impl From<UnmatchedArg> for UnmatchedPolicy {
    fn from(arg: UnmatchedArg) -> Self {
        match arg {
            UnmatchedArg::Keep => UnmatchedPolicy::Keep,
            UnmatchedArg::Drop => UnmatchedPolicy::Drop,
        }
    }
}

fn parse_as_of(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{s}': {e}"))
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  parceljoin-join ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  parceljoin-join ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<JoinError> for CliError {
    fn from(err: JoinError) -> Self {
        let message = err.to_string();
        match err {
            JoinError::ConfigParse(_) | JoinError::ConfigValidation(_) => Self::config(message),
            JoinError::MissingColumn { field, .. } => Self {
                code: EXIT_MISSING_COLUMN,
                message,
                hint: Some(format!(
                    "add the table's header for this field to aliases.{field} in a --config file"
                )),
            },
            JoinError::Csv { .. } => Self { code: EXIT_SOURCE, message, hint: None },
            JoinError::Output(_) => Self { code: EXIT_OUTPUT, message, hint: None },
        }
    }
}

// ============================================================================
// Run
// ============================================================================

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref(), cli.years, cli.unmatched)?;
    let today = cli.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

    let fetcher = Fetcher::new(Duration::from_secs(cli.timeout), cli.retries)?;
    let properties_source = pick_source(TableKind::Properties, cli.properties_csv, cli.properties_url)?;
    let mortgages_source = pick_source(TableKind::Mortgages, cli.mortgages_csv, cli.mortgages_url)?;

    let properties = load_table(&fetcher, TableKind::Properties, &properties_source)?;
    let mortgages = load_table(&fetcher, TableKind::Mortgages, &mortgages_source)?;

    let result = parceljoin_join::run(&config, &properties, &mortgages, today)?;

    output::write_outputs(&result, &cli.output, cli.summary_json.as_deref())?;

    if !cli.quiet {
        print_summary(&result, &cli.output);
    }
    Ok(())
}

/// Built-in defaults, overlaid by `--config`, overlaid by flags.
fn load_config(
    path: Option<&Path>,
    years: Option<u32>,
    unmatched: Option<UnmatchedArg>,
) -> Result<JoinConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::config(format!("cannot read config {}: {e}", path.display()))
            })?;
            JoinConfig::from_toml(&text).map_err(|e| {
                let mut err = CliError::from(e);
                err.message = format!("{}: {}", path.display(), err.message);
                err
            })?
        }
        None => JoinConfig::default(),
    };

    if let Some(years) = years {
        config.lookback_years = years;
    }
    if let Some(unmatched) = unmatched {
        config.unmatched = unmatched.into();
    }
    Ok(config)
}

fn pick_source(
    kind: TableKind,
    path: Option<PathBuf>,
    url: Option<Url>,
) -> Result<Source, CliError> {
    match (path, url) {
        (Some(path), None) => Ok(Source::Path(path)),
        (None, Some(url)) => Ok(Source::Url(url)),
        _ => Err(CliError::usage(format!(
            "provide exactly one of --{kind}-csv or --{kind}-url"
        ))),
    }
}

fn load_table(fetcher: &Fetcher, kind: TableKind, source: &Source) -> Result<Table, CliError> {
    let text = fetcher.fetch_text(kind, source)?;
    Ok(Table::from_csv_str(kind, &text)?)
}

fn print_summary(result: &JoinResult, output: &Path) {
    let s = &result.summary;
    eprintln!("wrote {} ({} rows)", output.display(), s.rows_emitted);
    eprintln!(
        "properties: {} read, {} loaded, {} skipped",
        s.properties.rows_read,
        s.properties.loaded,
        s.properties.rows_read - s.properties.loaded,
    );
    eprintln!(
        "mortgages:  {} read, {} kept since {} ({} other doc types, {} outside window, {} bad dates)",
        s.mortgages.rows_read,
        s.mortgages.kept,
        result.meta.window_start,
        s.mortgages.wrong_doc_type,
        s.mortgages.outside_window,
        s.mortgages.unparseable_date,
    );
    eprintln!(
        "matches:    {} by parcel id, {} by address, {} unmatched ({})",
        s.matches.by_parcel_id,
        s.matches.by_address,
        s.matches.unmatched,
        result.meta.unmatched,
    );

    let warnings = s.warning_count();
    if warnings > 0 {
        eprintln!(
            "warning: {} row(s) skipped: {} blank parcel id/address, {} non-numeric assessed value, {} unparseable recording date",
            warnings,
            s.properties.blank_key,
            s.properties.non_numeric_assessed_value,
            s.mortgages.unparseable_date,
        );
    }
}
