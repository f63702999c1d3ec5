use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use xlsx2csv::cli::{handle_error, Args, CliConfig, CliUtils, RunMode};
use xlsx2csv::conversion::{plan_jobs, BatchDispatcher, ConversionEngine, ConversionJob};
use xlsx2csv::discovery::{discover, discover_recursive, is_spreadsheet_file};

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match CliConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            handle_error(&e);
            std::process::exit(2);
        }
    };

    init_logging(&config);

    match config.mode() {
        RunMode::Single {
            source,
            destination,
        } => run_single(&config, source, destination),
        RunMode::Batch { dir } => run_batch(&config, &dir),
        RunMode::Help => {
            Args::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Diagnostics go to stderr so stdout stays clean for CSV output.
/// `RUST_LOG` overrides the level picked from the flags.
fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level().to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_single(config: &CliConfig, source: PathBuf, destination: Option<PathBuf>) -> Result<()> {
    let quiet = config.is_quiet();
    if source.exists() && !is_spreadsheet_file(&source) {
        CliUtils::show_warning(
            &format!("{} does not look like a workbook, trying anyway", source.display()),
            quiet,
        );
    }

    let to_stdout = destination.is_none();
    let job = ConversionJob::new(source, destination, config.conversion_config.clone());

    match ConversionEngine::new().convert(&job) {
        Ok(summary) => {
            // Keep stdout clean when it carries the CSV
            if !to_stdout {
                CliUtils::show_success(
                    &format!(
                        "Converted {} to {} ({} rows in {}, {})",
                        summary.source.display(),
                        config.output_description(),
                        summary.rows_written,
                        CliUtils::format_duration(summary.elapsed),
                        CliUtils::format_throughput(summary.throughput())
                    ),
                    quiet,
                );
            }
        }
        Err(e) => handle_error(&e),
    }

    Ok(())
}

fn run_batch(config: &CliConfig, dir: &Path) -> Result<()> {
    let quiet = config.is_quiet();

    let discovered = if config.args.batch_recursive {
        discover_recursive(dir)
    } else {
        discover(dir)
    };
    let files = match discovered {
        Ok(files) => files,
        Err(e) => {
            handle_error(&e);
            return Ok(());
        }
    };

    if files.is_empty() {
        CliUtils::show_warning(&format!("No workbooks found in {}", dir.display()), quiet);
        return Ok(());
    }

    let jobs = plan_jobs(&files, &config.args.batch_mask, &config.conversion_config);
    let mut dispatcher = BatchDispatcher::new(ConversionEngine::new(), config.worker_count());
    if !quiet {
        dispatcher = dispatcher.with_progress(CliUtils::create_progress_bar(jobs.len() as u64));
    }
    tracing::info!(
        jobs = jobs.len(),
        workers = dispatcher.worker_count(),
        "starting batch"
    );

    let report = dispatcher.run(jobs);

    if report.failure_count() == 0 {
        CliUtils::show_success(&report.summary(), quiet);
    } else {
        CliUtils::show_warning(&report.summary(), quiet);
    }

    if let Some(path) = &config.args.batch_report {
        let json = report.to_json().context("Failed to serialize batch report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write batch report to {}", path.display()))?;
        CliUtils::show_success(&format!("Report written to {}", path.display()), quiet);
    }

    Ok(())
}
