//! In-memory workbooks
//!
//! Lets library users feed rows that never touched disk through the same
//! conversion engine, and gives tests full control over sheet layout and
//! scan failures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};
use crate::formatter::{CellFormatter, CellValue, FormatOptions};
use crate::scanner::{ScanStep, SheetScanner, WorkbookOpener};

/// A workbook held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Vec<Vec<CellValue>>)>,
    active: usize,
    failure: Option<ScanFailure>,
}

#[derive(Debug, Clone)]
struct ScanFailure {
    sheet: usize,
    row: usize,
    message: String,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push((name.into(), rows));
        self
    }

    /// Append a sheet of plain text cells
    pub fn with_text_sheet(self, name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| CellValue::text(*cell)).collect())
            .collect();
        self.with_sheet(name, rows)
    }

    /// Mark the sheet that scanning starts on when no sheet is selected
    pub fn with_active_sheet(mut self, index: usize) -> Self {
        self.active = index;
        self
    }

    /// Make scanning fail when it reaches `row` of sheet `sheet`
    pub fn with_scan_failure(mut self, sheet: usize, row: usize, message: impl Into<String>) -> Self {
        self.failure = Some(ScanFailure {
            sheet,
            row,
            message: message.into(),
        });
        self
    }
}

#[derive(Debug, Default)]
struct OpenerLog {
    selections: Mutex<Vec<(PathBuf, usize)>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Opener over a fixed set of in-memory workbooks keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    workbooks: HashMap<PathBuf, MemoryWorkbook>,
    log: Arc<OpenerLog>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workbook under `path`
    pub fn insert(&mut self, path: impl Into<PathBuf>, workbook: MemoryWorkbook) {
        self.workbooks.insert(path.into(), workbook);
    }

    pub fn with_workbook(mut self, path: impl Into<PathBuf>, workbook: MemoryWorkbook) -> Self {
        self.insert(path, workbook);
        self
    }

    /// Every `select_sheet` call made so far, in order
    pub fn selection_calls(&self) -> Vec<(PathBuf, usize)> {
        self.log
            .selections
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn open_count(&self) -> usize {
        self.log.opened.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.log.closed.load(Ordering::SeqCst)
    }
}

impl WorkbookOpener for MemoryOpener {
    fn open(&self, path: &Path) -> ConversionResult<Box<dyn SheetScanner>> {
        let workbook = self.workbooks.get(path).ok_or_else(|| {
            ConversionError::conversion(ConversionErrorKind::open(path, "no such workbook"))
        })?;

        if workbook.sheets.is_empty() {
            return Err(ConversionError::conversion(ConversionErrorKind::open(
                path,
                "workbook has no sheets",
            )));
        }

        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryScanner {
            path: path.to_path_buf(),
            sheet: workbook.active.min(workbook.sheets.len() - 1),
            workbook: workbook.clone(),
            cursor: 0,
            formatter: CellFormatter::default(),
            log: Arc::clone(&self.log),
        }))
    }
}

/// Scanner over one [`MemoryWorkbook`]
pub struct MemoryScanner {
    path: PathBuf,
    workbook: MemoryWorkbook,
    sheet: usize,
    cursor: usize,
    formatter: CellFormatter,
    log: Arc<OpenerLog>,
}

impl SheetScanner for MemoryScanner {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook
            .sheets
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn select_sheet(&mut self, index: usize) -> ConversionResult<()> {
        if let Ok(mut calls) = self.log.selections.lock() {
            calls.push((self.path.clone(), index));
        }

        if index >= self.workbook.sheets.len() {
            return Err(ConversionError::conversion(
                ConversionErrorKind::SheetSelection {
                    index,
                    available: self.workbook.sheets.len(),
                },
            ));
        }

        self.sheet = index;
        self.cursor = 0;
        Ok(())
    }

    fn configure(&mut self, options: FormatOptions) {
        self.formatter = CellFormatter::new(options);
    }

    fn scan_next(&mut self) -> ConversionResult<ScanStep> {
        if let Some(failure) = &self.workbook.failure {
            if failure.sheet == self.sheet && failure.row == self.cursor {
                return Err(ConversionError::conversion(ConversionErrorKind::scan(
                    self.cursor as u64,
                    failure.message.clone(),
                )));
            }
        }

        let (_, rows) = &self.workbook.sheets[self.sheet];
        match rows.get(self.cursor) {
            Some(row) => {
                self.cursor += 1;
                Ok(ScanStep::Row(self.formatter.format_row(row)))
            }
            None => Ok(ScanStep::EndOfStream),
        }
    }

    fn close(&mut self) -> ConversionResult<()> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
