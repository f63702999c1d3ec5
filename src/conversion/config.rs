//! Configuration options for workbook to CSV conversion

use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};

use crate::formatter::FormatOptions;

/// Which worksheet a conversion reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetSelector {
    /// The sheet the workbook was saved with as active
    #[default]
    Active,
    /// Zero-based sheet index
    Index(usize),
}

impl SheetSelector {
    /// Map the CLI convention (`-1` = active sheet) onto a selector
    pub fn from_cli(index: i64) -> Self {
        if index < 0 {
            SheetSelector::Active
        } else {
            SheetSelector::Index(index as usize)
        }
    }
}

/// Parse a delimiter argument into the single byte the CSV writer uses.
///
/// Accepts a literal character, the escape `\t`, or the names `tab`,
/// `comma`, `semicolon` and `pipe`. Only the first character of a literal
/// is used.
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    let resolved = match s.to_lowercase().as_str() {
        "tab" | "\\t" => '\t',
        "comma" => ',',
        "semicolon" => ';',
        "pipe" => '|',
        _ => s
            .chars()
            .next()
            .ok_or_else(|| "Delimiter must not be empty".to_string())?,
    };

    if !resolved.is_ascii() || resolved == '"' || resolved == '\n' || resolved == '\r' {
        return Err(format!(
            "Invalid delimiter '{}'. Use a single ASCII character other than quote or newline",
            resolved.escape_default()
        ));
    }

    Ok(resolved as u8)
}

/// Conversion configuration options
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Field delimiter byte
    pub delimiter: u8,
    /// Write cell values as stored instead of rendering them
    pub raw_values: bool,
    /// Permit scientific notation for very large or small numbers
    pub allow_scientific: bool,
    /// Decimal separator override (`None` = locale default)
    pub decimal_separator: Option<String>,
    /// Thousand separator override (`None` = no grouping)
    pub thousand_separator: Option<String>,
    /// Locale tag for built-in number and date rendering
    pub locale: String,
    /// strftime pattern applied to every date cell
    pub date_format: Option<String>,
    /// Strip surrounding whitespace from cell values
    pub trim: bool,
    /// Worksheet to convert
    pub sheet: SheetSelector,
    /// Start every output stream with a UTF-8 byte-order mark
    pub bom: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            delimiter: b';',
            raw_values: false,
            allow_scientific: false,
            decimal_separator: None,
            thousand_separator: None,
            locale: "en".to_string(),
            date_format: None,
            trim: false,
            sheet: SheetSelector::Active,
            bom: false,
        }
    }
}

impl ConversionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Enable raw cell values
    pub fn with_raw_values(mut self, raw: bool) -> Self {
        self.raw_values = raw;
        self
    }

    pub fn with_scientific(mut self, allowed: bool) -> Self {
        self.allow_scientific = allowed;
        self
    }

    pub fn with_decimal_separator(mut self, separator: Option<String>) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn with_thousand_separator(mut self, separator: Option<String>) -> Self {
        self.thousand_separator = separator;
        self
    }

    /// Set locale tag
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_date_format(mut self, format: Option<String>) -> Self {
        self.date_format = format;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Select worksheet
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    /// Enable byte-order mark
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(format!(
                "Delimiter 0x{:02x} cannot be used as a field separator",
                self.delimiter
            ));
        }

        if let Some(format) = &self.date_format {
            if format.trim().is_empty() {
                return Err("Fixed date format must not be blank".to_string());
            }
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(format!(
                    "Fixed date format '{}' is not a valid strftime pattern",
                    format
                ));
            }
        }

        if let (Some(decimal), Some(thousand)) = (&self.decimal_separator, &self.thousand_separator)
        {
            if !decimal.is_empty() && decimal == thousand {
                return Err(format!(
                    "Decimal and thousand separators must differ (both '{}')",
                    decimal
                ));
            }
        }

        Ok(())
    }

    /// Formatter settings handed to the spreadsheet scanner
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            raw_values: self.raw_values,
            allow_scientific: self.allow_scientific,
            decimal_separator: self.decimal_separator.clone(),
            thousand_separator: self.thousand_separator.clone(),
            locale: self.locale.clone(),
            date_format: self.date_format.clone(),
            trim: self.trim,
        }
    }
}

/// One source-to-destination conversion unit
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub source: PathBuf,
    /// `None` writes to standard output
    pub destination: Option<PathBuf>,
    pub config: ConversionConfig,
}

impl ConversionJob {
    pub fn new(source: PathBuf, destination: Option<PathBuf>, config: ConversionConfig) -> Self {
        Self {
            source,
            destination,
            config,
        }
    }

    /// Human-readable destination
    pub fn destination_description(&self) -> String {
        match &self.destination {
            Some(path) => path.display().to_string(),
            None => "standard output".to_string(),
        }
    }
}
