//! Command-line interface module

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::conversion::{parse_delimiter, resolve_worker_count, ConversionConfig, SheetSelector};
use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};

pub mod path_mapping;

use path_mapping::DEFAULT_MASK;

/// Main CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "xlsx2csv")]
#[command(about = "Convert XLSX/XLS workbooks to CSV, one file or a whole folder at a time")]
#[command(version)]
#[command(long_about = None)]
pub struct Args {
    /// [single file mode] Path to input XLSX/XLS file
    #[arg(long)]
    pub xlsx: Option<PathBuf>,

    /// [single file mode] Path to output CSV file (stdout if empty)
    #[arg(long)]
    pub csv: Option<String>,

    /// [batch mode] Folder to convert; every workbook gets a CSV named by --batchMask
    #[arg(long)]
    pub batch: Option<PathBuf>,

    /// [batch mode] Output path mask like '*/converted/raw-*-out.csv'
    #[arg(long = "batchMask", default_value = DEFAULT_MASK)]
    pub batch_mask: String,

    /// [batch mode] Number of concurrent workers, 0 for one more than the CPU count
    #[arg(long = "batchThreads", default_value_t = 1)]
    pub batch_threads: usize,

    /// [batch mode] Also convert workbooks in subdirectories
    #[arg(long = "batchRecursive")]
    pub batch_recursive: bool,

    /// [batch mode] Write a JSON report of every job to this path
    #[arg(long = "batchReport")]
    pub batch_report: Option<PathBuf>,

    /// Zero-based sheet index, -1 for the active sheet
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub sheet: i64,

    /// CSV delimiter: one ASCII character other than quote or newline, or tab, comma, semicolon, pipe
    #[arg(long, default_value = ";")]
    pub delimiter: String,

    /// Write stored cell values instead of rendering them
    #[arg(long = "fmtRaw")]
    pub fmt_raw: bool,

    /// Locale for number and date rendering (en, ru, de, fr, ...)
    #[arg(long = "fmtI18n", default_value = "en")]
    pub fmt_i18n: String,

    /// Render very large or small numbers in scientific notation (4.60561E+12)
    #[arg(long = "fmtAllowExp")]
    pub fmt_allow_exp: bool,

    /// Custom decimal separator for rendered numbers
    #[arg(long = "fmtDecimal")]
    pub fmt_decimal: Option<String>,

    /// Thousand separator for rendered numbers (no grouping when omitted)
    #[arg(long = "fmtThousand")]
    pub fmt_thousand: Option<String>,

    /// Fixed strftime format for every date cell, e.g. %Y-%m-%d
    #[arg(long = "fmtDateFixed")]
    pub fmt_date_fixed: Option<String>,

    /// Start every output with the UTF-8 byte-order mark EF BB BF
    #[arg(long)]
    pub bom: bool,

    /// Trim surrounding whitespace from cell values
    #[arg(long)]
    pub trim: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(long)]
    pub quiet: bool,
}

/// What the invocation asks for
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    Single {
        source: PathBuf,
        /// `None` writes to standard output
        destination: Option<PathBuf>,
    },
    Batch {
        dir: PathBuf,
    },
    Help,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub args: Args,
    pub conversion_config: ConversionConfig,
}

impl CliConfig {
    /// Create CLI configuration from arguments
    pub fn from_args(args: Args) -> ConversionResult<Self> {
        let conversion_config = Self::create_conversion_config(&args)?;

        Ok(Self {
            args,
            conversion_config,
        })
    }

    /// Create conversion configuration from CLI arguments
    fn create_conversion_config(args: &Args) -> ConversionResult<ConversionConfig> {
        let delimiter = parse_delimiter(&args.delimiter)
            .map_err(|e| ConversionError::conversion(ConversionErrorKind::configuration(e)))?;

        let config = ConversionConfig::new()
            .with_delimiter(delimiter)
            .with_raw_values(args.fmt_raw)
            .with_scientific(args.fmt_allow_exp)
            .with_decimal_separator(non_empty(&args.fmt_decimal))
            .with_thousand_separator(non_empty(&args.fmt_thousand))
            .with_locale(args.fmt_i18n.clone())
            .with_date_format(non_empty(&args.fmt_date_fixed))
            .with_trim(args.trim)
            .with_sheet(SheetSelector::from_cli(args.sheet))
            .with_bom(args.bom);

        // Validate configuration
        config
            .validate()
            .map_err(|e| ConversionError::conversion(ConversionErrorKind::configuration(e)))?;

        Ok(config)
    }

    /// Single-file mode wins when both modes are requested
    pub fn mode(&self) -> RunMode {
        if let Some(source) = &self.args.xlsx {
            return RunMode::Single {
                source: source.clone(),
                destination: non_empty(&self.args.csv).map(PathBuf::from),
            };
        }
        match &self.args.batch {
            Some(dir) => RunMode::Batch { dir: dir.clone() },
            None => RunMode::Help,
        }
    }

    /// Workers to start in batch mode
    pub fn worker_count(&self) -> usize {
        resolve_worker_count(self.args.batch_threads)
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.args.quiet
    }

    /// Log level for the diagnostic subscriber
    pub fn log_level(&self) -> tracing::Level {
        if self.args.verbose {
            tracing::Level::DEBUG
        } else if self.args.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }

    /// Get output destination description
    pub fn output_description(&self) -> String {
        match self.mode() {
            RunMode::Single {
                destination: Some(path),
                ..
            } => format!("'{}'", path.display()),
            RunMode::Single { .. } => "standard output".to_string(),
            RunMode::Batch { .. } => format!("mask '{}'", self.args.batch_mask),
            RunMode::Help => "nothing".to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

/// CLI utilities and helpers
pub struct CliUtils;

impl CliUtils {
    /// Format a duration in human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_millis = duration.as_millis();

        if total_millis < 1000 {
            format!("{}ms", total_millis)
        } else if total_millis < 60_000 {
            format!("{:.1}s", total_millis as f64 / 1000.0)
        } else {
            let minutes = total_millis / 60_000;
            let seconds = (total_millis % 60_000) / 1000;
            format!("{}m {}s", minutes, seconds)
        }
    }

    /// Format a row rate like `12.3k rows/s`
    pub fn format_throughput(rows_per_sec: f64) -> String {
        if rows_per_sec >= 1000.0 {
            format!("{:.1}k rows/s", rows_per_sec / 1000.0)
        } else {
            format!("{:.0} rows/s", rows_per_sec)
        }
    }

    /// Create a progress bar for batch jobs
    pub fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
        let pb = indicatif::ProgressBar::new(total);
        let style = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }

    /// Show a success message (if not in quiet mode)
    pub fn show_success(message: &str, quiet: bool) {
        if !quiet {
            println!("{} {}", console::style("✓").green(), message);
        }
    }

    /// Show an error message
    pub fn show_error(message: &str) {
        eprintln!("{} {}", console::style("✗").red(), message);
    }

    /// Show a warning message (if not in quiet mode)
    pub fn show_warning(message: &str, quiet: bool) {
        if !quiet {
            eprintln!("{} {}", console::style("⚠").yellow(), message);
        }
    }
}

/// Handle CLI errors with user-friendly messages
pub fn handle_error(error: &ConversionError) {
    let message = error.user_message();
    CliUtils::show_error(&message);

    // Provide helpful suggestions
    match error.kind() {
        Some(ConversionErrorKind::SheetSelection { .. }) => {
            eprintln!("\nTip: Use --sheet -1 to convert the sheet the workbook was saved on");
        }
        Some(ConversionErrorKind::Configuration { .. }) => {
            eprintln!("\nTry 'xlsx2csv --help' for usage information.");
        }
        Some(ConversionErrorKind::NotADirectory { .. }) => {
            eprintln!("\nTip: Use --xlsx to convert a single workbook");
        }
        _ => {}
    }
}
