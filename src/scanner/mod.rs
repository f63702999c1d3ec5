//! Spreadsheet scanning module
//!
//! A scanner pulls one row at a time from a workbook. The conversion engine
//! only sees the [`SheetScanner`] and [`WorkbookOpener`] traits; parsing
//! lives behind them.

pub mod active_sheet;
pub mod memory;
pub mod workbook;

use std::path::Path;

use crate::error::ConversionResult;
use crate::formatter::FormatOptions;

pub use memory::{MemoryOpener, MemoryWorkbook};
pub use workbook::{CalamineOpener, CalamineScanner};

/// Extensions (lowercase, without dot) the scanners can read
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Cell values of one row, already rendered to text
pub type RowRecord = Vec<String>;

/// Result of one pull from a scanner
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep {
    Row(RowRecord),
    /// The sheet is exhausted. This is normal termination, not a failure.
    EndOfStream,
}

/// Row-at-a-time access to one worksheet of an opened workbook
pub trait SheetScanner {
    /// Names of all sheets, in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Switch to the sheet at `index`. Must be called before the first scan.
    fn select_sheet(&mut self, index: usize) -> ConversionResult<()>;

    /// Apply formatting policy to subsequently scanned rows
    fn configure(&mut self, options: FormatOptions);

    /// Pull the next row
    fn scan_next(&mut self) -> ConversionResult<ScanStep>;

    /// Release the workbook
    fn close(&mut self) -> ConversionResult<()> {
        Ok(())
    }
}

/// Opens workbooks into scanners. Shared by all batch workers.
pub trait WorkbookOpener: Send + Sync {
    fn open(&self, path: &Path) -> ConversionResult<Box<dyn SheetScanner>>;
}

/// Return true if the path has a spreadsheet extension (case-insensitive)
pub fn has_spreadsheet_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SPREADSHEET_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
