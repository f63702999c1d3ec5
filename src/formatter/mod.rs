//! Cell formatting module
//!
//! Turns scanned cell values into the strings written to CSV, applying the
//! raw/formatted policy, locale conventions and separator overrides.

pub mod locale;
pub mod numbers;

use std::fmt::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

pub use locale::Locale;

/// Seconds in one spreadsheet day
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Serial of 9999-12-31, the last day a workbook can hold
const MAX_DATE_SERIAL: f64 = 2_958_466.0;

/// A single cell value as delivered by a spreadsheet backend
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Date or date-time stored as a spreadsheet serial number. `moment` is
    /// filled in when the backend already resolved the calendar value.
    DateTime {
        serial: f64,
        moment: Option<NaiveDateTime>,
    },
    /// Elapsed time stored as fractional days
    Duration(f64),
    /// ISO 8601 date-time text (OpenDocument)
    DateTimeIso(String),
    /// ISO 8601 duration text (OpenDocument)
    DurationIso(String),
    /// Formula error such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Date from a 1900-system serial number
    pub fn date(serial: f64) -> Self {
        Self::DateTime {
            serial,
            moment: None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Formatter settings
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub raw_values: bool,
    pub allow_scientific: bool,
    pub decimal_separator: Option<String>,
    pub thousand_separator: Option<String>,
    pub locale: String,
    pub date_format: Option<String>,
    pub trim: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            raw_values: false,
            allow_scientific: false,
            decimal_separator: None,
            thousand_separator: None,
            locale: "en".to_string(),
            date_format: None,
            trim: false,
        }
    }
}

/// Renders cell values to strings
#[derive(Debug, Clone)]
pub struct CellFormatter {
    options: FormatOptions,
    locale: &'static Locale,
}

impl Default for CellFormatter {
    fn default() -> Self {
        Self::new(FormatOptions::default())
    }
}

impl CellFormatter {
    /// Create a formatter. Unknown locales fall back to English.
    pub fn new(options: FormatOptions) -> Self {
        let locale = Locale::resolve(&options.locale);
        Self { options, locale }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    pub fn locale(&self) -> &'static Locale {
        self.locale
    }

    /// Render one cell
    pub fn format(&self, value: &CellValue) -> String {
        let rendered = if self.options.raw_values {
            self.format_raw(value)
        } else {
            self.format_rendered(value)
        };

        if self.options.trim {
            rendered.trim().to_string()
        } else {
            rendered
        }
    }

    /// Render a whole row
    pub fn format_row(&self, cells: &[CellValue]) -> Vec<String> {
        cells.iter().map(|cell| self.format(cell)).collect()
    }

    fn format_raw(&self, value: &CellValue) -> String {
        match value {
            CellValue::Empty => String::new(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            CellValue::DateTime { serial, .. } => serial.to_string(),
            CellValue::Duration(days) => days.to_string(),
            CellValue::DateTimeIso(s) | CellValue::DurationIso(s) => s.clone(),
            CellValue::Error(e) => e.clone(),
        }
    }

    fn format_rendered(&self, value: &CellValue) -> String {
        match value {
            CellValue::Empty => String::new(),
            CellValue::Int(i) => numbers::format_integer(*i, self.thousand_separator()),
            CellValue::Float(f) => self.format_float(*f),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime { serial, moment } => {
                match moment.or_else(|| serial_to_datetime(*serial)) {
                    Some(moment) => self.format_datetime(moment),
                    None => self.format_float(*serial),
                }
            }
            CellValue::Duration(days) => format_duration(*days),
            CellValue::DateTimeIso(s) | CellValue::DurationIso(s) => s.clone(),
            CellValue::Error(e) => e.clone(),
        }
    }

    fn format_float(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let rounded = numbers::round_significant(value);
        let decimal = self.decimal_separator();

        if self.options.allow_scientific && numbers::wants_scientific(rounded) {
            numbers::format_scientific(rounded, decimal)
        } else {
            numbers::format_decimal(rounded, decimal, self.thousand_separator())
        }
    }

    fn format_datetime(&self, moment: NaiveDateTime) -> String {
        let locale_pattern = if moment.num_seconds_from_midnight() == 0 {
            self.locale.date_pattern
        } else {
            self.locale.datetime_pattern
        };
        let pattern = self.options.date_format.as_deref().unwrap_or(locale_pattern);

        let mut rendered = String::new();
        if write!(rendered, "{}", moment.format(pattern)).is_err() {
            // Unrenderable fixed pattern
            rendered.clear();
            let _ = write!(rendered, "{}", moment.format(locale_pattern));
        }
        rendered
    }

    fn decimal_separator(&self) -> &str {
        match &self.options.decimal_separator {
            Some(sep) if !sep.is_empty() => sep,
            _ => self.locale.decimal_separator,
        }
    }

    fn thousand_separator(&self) -> Option<&str> {
        self.options.thousand_separator.as_deref()
    }
}

/// Convert a 1900-system serial number to a calendar date-time.
///
/// Serials below 60 precede the phantom 1900-02-29 and are shifted by a day.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..MAX_DATE_SERIAL).contains(&serial) {
        return None;
    }

    let epoch = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let millis = (serial * SECONDS_PER_DAY * 1000.0).round() as i64;
    // Snap to whole seconds so 23:59:59.9996 does not render as a new day
    let seconds = millis.checked_add(500)?.div_euclid(1000);
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Render fractional days as `[h]:mm:ss`
fn format_duration(days: f64) -> String {
    let total = (days * SECONDS_PER_DAY).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
