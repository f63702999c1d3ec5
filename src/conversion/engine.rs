//! Core conversion engine: one workbook in, one delimited text stream out

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::conversion::config::{ConversionConfig, ConversionJob, SheetSelector};
use crate::conversion::stats::ConversionSummary;
use crate::conversion::ConversionResult;
use crate::error::{ConversionError, ConversionErrorKind};
use crate::scanner::{CalamineOpener, ScanStep, SheetScanner, WorkbookOpener};

/// Rows written between forced flushes of the output buffer
pub const FLUSH_INTERVAL: u64 = 10_000;

/// UTF-8 byte-order mark
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Main conversion engine
#[derive(Debug, Clone, Default)]
pub struct ConversionEngine<O: WorkbookOpener = CalamineOpener> {
    opener: O,
}

impl ConversionEngine<CalamineOpener> {
    /// Create an engine reading workbooks from disk
    pub fn new() -> Self {
        Self {
            opener: CalamineOpener,
        }
    }
}

impl<O: WorkbookOpener> ConversionEngine<O> {
    /// Create an engine over a custom workbook source
    pub fn with_opener(opener: O) -> Self {
        Self { opener }
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Convert one workbook.
    ///
    /// The scanner is closed and the output flushed on every exit path; the
    /// first error encountered is returned.
    pub fn convert(&self, job: &ConversionJob) -> ConversionResult<ConversionSummary> {
        let started = Instant::now();
        tracing::debug!(
            source = %job.source.display(),
            destination = %job.destination_description(),
            "converting workbook"
        );

        let mut scanner = self.opener.open(&job.source)?;
        let streamed = prepare_and_stream(scanner.as_mut(), job);
        let closed = scanner.close();
        let rows = streamed?;
        closed?;

        Ok(ConversionSummary::new(
            job.source.clone(),
            job.destination.clone(),
            rows,
            started.elapsed(),
        ))
    }
}

fn prepare_and_stream(scanner: &mut dyn SheetScanner, job: &ConversionJob) -> ConversionResult<u64> {
    scanner.configure(job.config.format_options());

    // Select before the destination exists so a bad index leaves no file behind
    if let SheetSelector::Index(index) = job.config.sheet {
        scanner.select_sheet(index)?;
    }

    match &job.destination {
        Some(path) => {
            let file = create_destination(path)?;
            stream_rows(scanner, BufWriter::new(file), &job.config)
        }
        None => {
            let stdout = io::stdout();
            stream_rows(scanner, stdout.lock(), &job.config)
        }
    }
}

/// Create (or truncate) the destination file, creating missing parents
pub fn create_destination(path: &Path) -> ConversionResult<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                ConversionError::conversion_with_source(
                    ConversionErrorKind::create(parent, e.to_string()),
                    e.into(),
                )
            })?;
        }
    }

    File::create(path).map_err(|e| {
        ConversionError::conversion_with_source(
            ConversionErrorKind::create(path, e.to_string()),
            e.into(),
        )
    })
}

/// Forward rows from `scanner` to `output` as delimited records.
///
/// Writes the byte-order mark first when configured (also for empty
/// sheets). Returns the number of records written.
pub fn stream_rows<W: Write>(
    scanner: &mut dyn SheetScanner,
    mut output: W,
    config: &ConversionConfig,
) -> ConversionResult<u64> {
    if config.bom {
        output.write_all(UTF8_BOM)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .flexible(true)
        .from_writer(output);

    let mut rows: u64 = 0;
    let outcome = loop {
        match scanner.scan_next() {
            Ok(ScanStep::Row(record)) => {
                if let Err(e) = writer.write_record(&record) {
                    break Err(ConversionError::from(e));
                }
                rows += 1;
                if rows % FLUSH_INTERVAL == 0 {
                    if let Err(e) = writer.flush() {
                        break Err(ConversionError::from(e));
                    }
                    tracing::debug!(rows, "flushed output");
                }
            }
            Ok(ScanStep::EndOfStream) => break Ok(rows),
            Err(e) => break Err(e),
        }
    };

    // Flush on failure too so everything already scanned reaches the output
    let flushed = writer.flush();
    let rows = outcome?;
    flushed?;
    Ok(rows)
}
