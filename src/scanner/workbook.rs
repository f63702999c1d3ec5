//! Workbook scanner backed by calamine
//!
//! `.xlsx` and `.xlsm` sheets are streamed: a reader thread walks the sheet
//! XML cell by cell and hands finished rows over a bounded channel, so only
//! a handful of rows are in memory at any time. `.xls`, `.xlsb` and `.ods`
//! have no cell-level reader in calamine; those load the selected sheet as
//! one range on the first pull.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use calamine::{
    open_workbook, open_workbook_auto, Data, Range, Reader, Sheets, Xlsx, XlsxError,
};
use crossbeam::channel::{bounded, Receiver, Sender};

use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};
use crate::formatter::{CellFormatter, CellValue, FormatOptions};
use crate::scanner::active_sheet::active_sheet_index;
use crate::scanner::{ScanStep, SheetScanner, WorkbookOpener};

type WorkbookReader = BufReader<File>;

/// Rows the reader thread may run ahead of the consumer
const ROW_BUFFER: usize = 256;

/// Opens workbooks from disk with calamine
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineOpener;

impl WorkbookOpener for CalamineOpener {
    fn open(&self, path: &Path) -> ConversionResult<Box<dyn SheetScanner>> {
        Ok(Box::new(CalamineScanner::open(path)?))
    }
}

fn scan_error(row: usize, message: impl Into<String>) -> ConversionError {
    ConversionError::conversion(ConversionErrorKind::scan(row as u64, message))
}

/// Builds dense rows out of a sparse, row-ordered cell sequence.
///
/// Rows and columns before the first used cell are padded with empty cells,
/// and every row is at least `width` cells wide.
#[derive(Debug)]
struct RowAssembler {
    width: usize,
    /// Absolute index of the next row to hand out
    next_row: usize,
    current: Option<(usize, Vec<CellValue>)>,
    ready: VecDeque<Vec<CellValue>>,
}

impl RowAssembler {
    fn new(width: usize) -> Self {
        Self {
            width,
            next_row: 0,
            current: None,
            ready: VecDeque::new(),
        }
    }

    fn push(&mut self, row: usize, col: usize, value: CellValue) {
        if value == CellValue::Empty {
            return;
        }

        let starts_new_row = match &self.current {
            Some((current, _)) => row > *current,
            None => true,
        };
        if starts_new_row {
            self.complete_current();
            while self.next_row < row {
                self.ready.push_back(vec![CellValue::Empty; self.width]);
                self.next_row += 1;
            }
            self.current = Some((row, Vec::with_capacity(self.width)));
        }

        if let Some((_, cells)) = self.current.as_mut() {
            if cells.len() <= col {
                cells.resize(col + 1, CellValue::Empty);
            }
            cells[col] = value;
        }
    }

    fn complete_current(&mut self) {
        if let Some((row, mut cells)) = self.current.take() {
            if cells.len() < self.width {
                cells.resize(self.width, CellValue::Empty);
            }
            self.ready.push_back(cells);
            self.next_row = row + 1;
        }
    }

    /// Flush the row in progress; call once the sheet is exhausted
    fn finish(&mut self) {
        self.complete_current();
    }

    fn pop_ready(&mut self) -> Option<Vec<CellValue>> {
        self.ready.pop_front()
    }

    /// Row a failure at the current position is reported against
    fn position(&self) -> usize {
        match &self.current {
            Some((row, _)) => *row,
            None => self.next_row,
        }
    }
}

enum StreamMessage {
    Row(Vec<CellValue>),
    Failed { row: usize, message: String },
}

/// Reader side of one worksheet: runs on its own thread and stops as soon
/// as the consumer hangs up.
fn stream_sheet<RS: Read + Seek>(
    mut workbook: Xlsx<RS>,
    sheet: &str,
    sender: &Sender<StreamMessage>,
) {
    let mut cells = match workbook.worksheet_cells_reader(sheet) {
        Ok(cells) => cells,
        // Chart sheets carry no cells
        Err(XlsxError::NotAWorksheet(_)) => return,
        Err(e) => {
            let _ = sender.send(StreamMessage::Failed {
                row: 0,
                message: format!("cannot read sheet '{}': {}", sheet, e),
            });
            return;
        }
    };

    let mut rows = RowAssembler::new(cells.dimensions().end.1 as usize + 1);
    loop {
        let exhausted = match cells.next_cell() {
            Ok(Some(cell)) => {
                let (row, col) = cell.get_position();
                let value = to_cell_value(&Data::from(cell.get_value().clone()));
                rows.push(row as usize, col as usize, value);
                false
            }
            Ok(None) => {
                rows.finish();
                true
            }
            Err(e) => {
                let _ = sender.send(StreamMessage::Failed {
                    row: rows.position(),
                    message: e.to_string(),
                });
                return;
            }
        };

        while let Some(record) = rows.pop_ready() {
            if sender.send(StreamMessage::Row(record)).is_err() {
                return;
            }
        }
        if exhausted {
            return;
        }
    }
}

/// Consumer side of a streamed worksheet
struct RowStream {
    rows: Option<Receiver<StreamMessage>>,
    reader: Option<JoinHandle<()>>,
    delivered: usize,
}

impl RowStream {
    fn spawn(workbook: Xlsx<WorkbookReader>, sheet: String) -> ConversionResult<Self> {
        let (sender, receiver) = bounded(ROW_BUFFER);
        let reader = thread::Builder::new()
            .name("xlsx-reader".to_string())
            .spawn(move || stream_sheet(workbook, &sheet, &sender))
            .map_err(|e| scan_error(0, format!("cannot start sheet reader: {}", e)))?;

        Ok(Self {
            rows: Some(receiver),
            reader: Some(reader),
            delivered: 0,
        })
    }

    fn next_row(&mut self) -> ConversionResult<Option<Vec<CellValue>>> {
        let received = self.rows.as_ref().and_then(|rows| rows.recv().ok());
        match received {
            Some(StreamMessage::Row(cells)) => {
                self.delivered += 1;
                Ok(Some(cells))
            }
            Some(StreamMessage::Failed { row, message }) => {
                self.shutdown();
                Err(scan_error(row, message))
            }
            // Reader hung up: either done or dead
            None if self.shutdown() => Ok(None),
            None => Err(scan_error(self.delivered, "sheet reader stopped unexpectedly")),
        }
    }

    /// Disconnect and join the reader. False if it panicked.
    fn shutdown(&mut self) -> bool {
        self.rows = None;
        match self.reader.take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Whole worksheet range plus the read cursor
struct LoadedSheet {
    range: Range<Data>,
    /// Absolute (row, column) of the range's top-left cell
    origin: (usize, usize),
    /// Absolute row one past the last used row
    end_row: usize,
    /// Absolute column one past the last used column
    width: usize,
    next_row: usize,
}

impl LoadedSheet {
    fn new(range: Range<Data>) -> Self {
        let (origin, end_row, width) = match range.start() {
            Some((row, col)) => {
                let (height, columns) = range.get_size();
                let origin = (row as usize, col as usize);
                (origin, origin.0 + height, origin.1 + columns)
            }
            None => ((0, 0), 0, 0),
        };

        Self {
            range,
            origin,
            end_row,
            width,
            next_row: 0,
        }
    }

    fn next_row(&mut self) -> Option<Vec<CellValue>> {
        if self.next_row >= self.end_row {
            return None;
        }

        let row = self.next_row;
        self.next_row += 1;

        let cells = (0..self.width)
            .map(|col| {
                if row < self.origin.0 || col < self.origin.1 {
                    return CellValue::Empty;
                }
                self.range
                    .get((row - self.origin.0, col - self.origin.1))
                    .map(to_cell_value)
                    .unwrap_or(CellValue::Empty)
            })
            .collect();
        Some(cells)
    }
}

enum Backend {
    /// `None` once the workbook has moved to a reader thread
    Streaming(Option<Xlsx<WorkbookReader>>),
    Buffered(Sheets<WorkbookReader>),
}

enum Cursor {
    Stream(RowStream),
    Loaded(LoadedSheet),
}

/// Scanner over one workbook on disk
pub struct CalamineScanner {
    path: PathBuf,
    backend: Option<Backend>,
    sheet_names: Vec<String>,
    sheet: usize,
    formatter: CellFormatter,
    cursor: Option<Cursor>,
}

impl CalamineScanner {
    /// Open a workbook and position on its active sheet
    pub fn open(path: &Path) -> ConversionResult<Self> {
        let workbook = open_workbook_auto(path).map_err(|e| {
            ConversionError::conversion(ConversionErrorKind::open(path, e.to_string()))
        })?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ConversionError::conversion(ConversionErrorKind::open(
                path,
                "workbook has no sheets",
            )));
        }

        let sheet = active_sheet_index(path)
            .filter(|index| *index < sheet_names.len())
            .unwrap_or(0);

        let backend = match workbook {
            Sheets::Xlsx(xlsx) => Backend::Streaming(Some(xlsx)),
            other => Backend::Buffered(other),
        };
        tracing::debug!(
            path = %path.display(),
            sheet,
            streaming = matches!(backend, Backend::Streaming(_)),
            "opened workbook"
        );

        Ok(Self {
            path: path.to_path_buf(),
            backend: Some(backend),
            sheet_names,
            sheet,
            formatter: CellFormatter::default(),
            cursor: None,
        })
    }

    /// Index of the sheet rows are read from
    pub fn current_sheet(&self) -> usize {
        self.sheet
    }

    fn start_cursor(&mut self) -> ConversionResult<Cursor> {
        let name = self.sheet_names[self.sheet].clone();

        match self.backend.as_mut() {
            None => Err(scan_error(0, "workbook is closed")),
            Some(Backend::Streaming(slot)) => {
                let workbook = match slot.take() {
                    Some(workbook) => workbook,
                    // An earlier stream took it
                    None => open_workbook::<Xlsx<WorkbookReader>, _>(&self.path).map_err(|e| {
                        ConversionError::conversion(ConversionErrorKind::open(
                            &self.path,
                            e.to_string(),
                        ))
                    })?,
                };
                RowStream::spawn(workbook, name).map(Cursor::Stream)
            }
            Some(Backend::Buffered(workbook)) => {
                let range = workbook
                    .worksheet_range_at(self.sheet)
                    .ok_or_else(|| scan_error(0, format!("sheet {} is missing", self.sheet)))?
                    .map_err(|e| scan_error(0, format!("cannot read sheet '{}': {}", name, e)))?;
                Ok(Cursor::Loaded(LoadedSheet::new(range)))
            }
        }
    }
}

impl SheetScanner for CalamineScanner {
    fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    fn select_sheet(&mut self, index: usize) -> ConversionResult<()> {
        if index >= self.sheet_names.len() {
            return Err(ConversionError::conversion(
                ConversionErrorKind::SheetSelection {
                    index,
                    available: self.sheet_names.len(),
                },
            ));
        }

        self.sheet = index;
        self.cursor = None;
        Ok(())
    }

    fn configure(&mut self, options: FormatOptions) {
        self.formatter = CellFormatter::new(options);
    }

    fn scan_next(&mut self) -> ConversionResult<ScanStep> {
        if self.cursor.is_none() {
            self.cursor = Some(self.start_cursor()?);
        }

        let cells = match self.cursor.as_mut() {
            Some(Cursor::Stream(stream)) => stream.next_row()?,
            Some(Cursor::Loaded(sheet)) => sheet.next_row(),
            None => None,
        };
        Ok(match cells {
            Some(cells) => ScanStep::Row(self.formatter.format_row(&cells)),
            None => ScanStep::EndOfStream,
        })
    }

    fn close(&mut self) -> ConversionResult<()> {
        tracing::debug!(path = %self.path.display(), "closing workbook");
        self.cursor = None;
        self.backend = None;
        Ok(())
    }
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Duration(dt.as_f64()),
        Data::DateTime(dt) => CellValue::DateTime {
            serial: dt.as_f64(),
            moment: dt.as_datetime(),
        },
        Data::DateTimeIso(s) => CellValue::DateTimeIso(s.clone()),
        Data::DurationIso(s) => CellValue::DurationIso(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}
