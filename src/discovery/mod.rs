//! Batch input discovery: find workbooks in a directory and rank them
//!
//! Larger files come first so the slowest conversions start earliest.

pub mod filter;
mod recursive;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};

pub use filter::is_spreadsheet_file;

/// A discovered workbook and its size in bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSortInfo {
    pub path: PathBuf,
    pub size: u64,
}

impl FileSortInfo {
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// List the workbooks directly inside `dir`, largest first.
///
/// Subdirectories are skipped. Files of equal size keep listing order.
pub fn discover(dir: &Path) -> ConversionResult<Vec<FileSortInfo>> {
    ensure_directory(dir)?;

    let entries = fs::read_dir(dir).map_err(|e| access_error(dir, e.to_string()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| access_error(dir, e.to_string()))?;
        let path = entry.path();
        // Follows symlinks so linked workbooks are included
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if filter::is_spreadsheet_entry(&path, &metadata) {
            files.push(FileSortInfo::new(path, metadata.len()));
        }
    }

    rank_by_size(&mut files);
    tracing::debug!(dir = %dir.display(), found = files.len(), "discovered workbooks");
    Ok(files)
}

/// Like [`discover`], but descends into subdirectories
pub fn discover_recursive(dir: &Path) -> ConversionResult<Vec<FileSortInfo>> {
    ensure_directory(dir)?;

    let mut files = recursive::walk_spreadsheets(dir)?;
    rank_by_size(&mut files);
    tracing::debug!(dir = %dir.display(), found = files.len(), "discovered workbooks recursively");
    Ok(files)
}

/// Stable sort, largest first
fn rank_by_size(files: &mut [FileSortInfo]) {
    files.sort_by(|a, b| b.size.cmp(&a.size));
}

fn ensure_directory(dir: &Path) -> ConversionResult<()> {
    let metadata = fs::metadata(dir).map_err(|e| access_error(dir, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(ConversionError::conversion(
            ConversionErrorKind::NotADirectory {
                path: dir.to_path_buf(),
            },
        ));
    }
    Ok(())
}

pub(crate) fn access_error(path: &Path, message: String) -> ConversionError {
    ConversionError::conversion(ConversionErrorKind::Access {
        path: path.to_path_buf(),
        message,
    })
}
