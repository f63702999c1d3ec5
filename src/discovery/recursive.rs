use std::path::Path;
use walkdir::WalkDir;

use crate::discovery::filter::is_spreadsheet_entry;
use crate::discovery::{access_error, FileSortInfo};
use crate::error::ConversionResult;

/// Find spreadsheet files anywhere under `dir`, in walk order
pub(crate) fn walk_spreadsheets(dir: &Path) -> ConversionResult<Vec<FileSortInfo>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            access_error(&path, e.to_string())
        })?;
        let metadata = entry
            .metadata()
            .map_err(|e| access_error(entry.path(), e.to_string()))?;

        if is_spreadsheet_entry(entry.path(), &metadata) {
            files.push(FileSortInfo::new(entry.path().to_path_buf(), metadata.len()));
        }
    }

    Ok(files)
}
