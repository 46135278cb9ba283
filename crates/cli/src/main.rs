// addrgroup - merge address-duplicate records and export them grouped by GROUP/COUNTRY

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;

use addrgroup_merge::model::REQUIRED_FIELDS;
use addrgroup_merge::{AddressMatch, MergeConfig, MergeError, RunSummary};

use exit_codes::{merge_exit_code, EXIT_CONFIG, EXIT_SUCCESS, EXIT_WRITE};

#[derive(Parser)]
#[command(name = "addrgroup")]
#[command(about = "Merge address-duplicate records and export them grouped by GROUP and COUNTRY")]
#[command(version)]
#[command(after_help = "\
Examples:
  addrgroup addresses.csv
  addrgroup addresses.csv -o out/groups --json
  addrgroup addresses.tsv -d $'\\t'
  addrgroup addresses.csv --address-match normalized -v
  addrgroup addresses.csv -c addrgroup.toml")]
struct Cli {
    /// Delimited input file with a header row
    input: PathBuf,

    /// TOML config file with [input], [address] and [output] sections
    #[arg(long, short = 'c', env = "ADDRGROUP_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory (default: results)
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Field delimiter (default: ,)
    #[arg(long, short = 'd')]
    delimiter: Option<char>,

    /// How address fields are compared when looking for duplicates
    #[arg(long, value_enum)]
    address_match: Option<AddressMatchArg>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors; no summary line
    #[arg(long, short = 'q')]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum AddressMatchArg {
    /// Case- and whitespace-sensitive
    Exact,
    /// Ignore case and surrounding/repeated whitespace
    Normalized,
}

impl From<AddressMatchArg> for AddressMatch {
    fn from(arg: AddressMatchArg) -> Self {
        match arg {
            AddressMatchArg::Exact => AddressMatch::Exact,
            AddressMatchArg::Normalized => AddressMatch::Normalized,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cmd_run(&cli) {
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

/// `RUST_LOG` wins over the verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    let default_filter = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<MergeError> for CliError {
    fn from(err: MergeError) -> Self {
        let hint = match &err {
            MergeError::MalformedRow { .. } => {
                Some(format!("every row needs the columns {}", REQUIRED_FIELDS.join(", ")))
            }
            MergeError::DuplicateSequenceId { .. } => {
                Some("SEQUENCE_ID must be unique across all rows; no files were written".to_string())
            }
            MergeError::InvalidNameComponent { .. } => {
                Some("GROUP and COUNTRY name the export files; no files were written".to_string())
            }
            MergeError::AddressMismatch { .. } => {
                Some("this is a bug in the merge engine, please report it".to_string())
            }
            MergeError::Input(_) => Some("check the file encoding and --delimiter".to_string()),
            _ => None,
        };
        Self { code: merge_exit_code(&err), message: err.to_string(), hint }
    }
}

// ============================================================================
// run
// ============================================================================

/// Machine-readable result for `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    input: String,
    output_dir: String,
    #[serde(flatten)]
    summary: &'a RunSummary,
    written: Vec<String>,
}

fn load_config(cli: &Cli) -> Result<MergeConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::config(format!("cannot read config {}: {e}", path.display()))
            })?;
            MergeConfig::parse_toml(&text)?
        }
        None => MergeConfig::default(),
    };

    // Flags override the file.
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(delimiter) = cli.delimiter {
        config.input.delimiter = delimiter;
    }
    if let Some(mode) = cli.address_match {
        config.address.match_mode = mode.into();
    }

    config.validate().map_err(|e| {
        CliError::from(e).with_hint("flags override the config file; check both")
    })?;
    Ok(config)
}

fn cmd_run(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    log::debug!(
        "delimiter {:?}, address match {}, output {} (indent {})",
        config.input.delimiter,
        config.address.match_mode,
        config.output.dir.display(),
        config.output.indent
    );

    log::info!("Processing file {}...", cli.input.display());
    let rows = addrgroup_io::csv::read_rows(&cli.input, config.delimiter_byte())?;
    log::info!("Read {} row(s)", rows.len());

    let result = addrgroup_merge::run(&config, rows)?;
    let written = addrgroup_io::json::write_all(&config.output.dir, &result.document, config.output.indent)?;

    if cli.json {
        let report = JsonReport {
            input: cli.input.display().to_string(),
            output_dir: config.output.dir.display().to_string(),
            summary: &result.summary,
            written: written.iter().map(|p| display_name(p)).collect(),
        };
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError {
            code: EXIT_WRITE,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json}");
    }

    if !cli.quiet {
        let s = &result.summary;
        eprintln!(
            "{} row(s): {} record(s), {} merged, {} group(s); wrote {} file(s) to {}",
            s.input_rows,
            s.canonical_records,
            s.merged_records,
            s.partitions,
            written.len(),
            config.output.dir.display()
        );
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
