//! Error types and handling infrastructure for workbook to CSV conversion

use anyhow::Error;
use std::path::{Path, PathBuf};

/// Core error types for the conversion process
#[derive(Debug, thiserror::Error)]
pub enum ConversionErrorKind {
    #[error("cannot parse workbook {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },

    #[error("sheet index {index} is out of range (workbook has {available} sheets)")]
    SheetSelection { index: usize, available: usize },

    #[error("cannot create file {}: {message}", .path.display())]
    Create { path: PathBuf, message: String },

    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("scan error at row {row}: {message}")]
    Scan { row: u64, message: String },

    #[error("{} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("cannot read directory {}: {message}", .path.display())]
    Access { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

impl ConversionErrorKind {
    pub fn open(path: &Path, message: impl Into<String>) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn create(path: &Path, message: impl Into<String>) -> Self {
        Self::Create {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn io(message: String, path: Option<PathBuf>) -> Self {
        Self::Io { message, path }
    }

    pub fn scan(row: u64, message: impl Into<String>) -> Self {
        Self::Scan {
            row,
            message: message.into(),
        }
    }

    pub fn configuration(message: String) -> Self {
        Self::Configuration { message }
    }
}

/// Main error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("{kind}")]
    Conversion {
        kind: ConversionErrorKind,
        source: Option<anyhow::Error>,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] Error),
}

impl ConversionError {
    pub fn conversion(kind: ConversionErrorKind) -> Self {
        Self::Conversion { kind, source: None }
    }

    pub fn conversion_with_source(kind: ConversionErrorKind, source: anyhow::Error) -> Self {
        Self::Conversion {
            kind,
            source: Some(source),
        }
    }

    pub fn other(error: Error) -> Self {
        Self::Other(error)
    }

    /// The classified failure, if this error carries one
    pub fn kind(&self) -> Option<&ConversionErrorKind> {
        match self {
            Self::Conversion { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Create a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Conversion { kind, .. } => match kind {
                ConversionErrorKind::SheetSelection { index, available } => format!(
                    "Sheet {} does not exist; valid indexes are 0..{} (or -1 for the active sheet)",
                    index, available
                ),
                ConversionErrorKind::Io {
                    message,
                    path: Some(path),
                } => format!("IO error on {}: {}", path.display(), message),
                _ => self.to_string(),
            },
            Self::Csv(err) => format!("CSV write error: {}", err),
            Self::Other(err) => format!("Unexpected error: {}", err),
        }
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(error: std::io::Error) -> Self {
        Self::conversion(ConversionErrorKind::io(error.to_string(), None))
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;
