//! Workbook to CSV converter
//!
//! Converts XLSX/XLS (and other calamine-readable) workbooks into delimited
//! text, either one file at a time or as a concurrent batch over a folder.

pub mod cli;
pub mod conversion;
pub mod discovery;
pub mod error;
pub mod formatter;
pub mod scanner;

use std::path::Path;

// Re-export commonly used types
pub use conversion::{
    BatchDispatcher, BatchReport, ConversionConfig, ConversionEngine, ConversionJob,
    ConversionResult, ConversionSummary, SheetSelector,
};
pub use error::{ConversionError, ConversionErrorKind};
pub use formatter::{CellFormatter, CellValue, FormatOptions};
pub use scanner::{SheetScanner, WorkbookOpener};

/// Convert one workbook on disk with the given configuration.
///
/// `destination = None` writes to standard output.
pub fn convert_workbook(
    source: &Path,
    destination: Option<&Path>,
    config: &ConversionConfig,
) -> ConversionResult<ConversionSummary> {
    let job = ConversionJob::new(
        source.to_path_buf(),
        destination.map(Path::to_path_buf),
        config.clone(),
    );
    ConversionEngine::new().convert(&job)
}
