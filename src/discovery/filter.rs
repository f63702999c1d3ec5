use std::fs::Metadata;
use std::path::Path;

use crate::scanner::has_spreadsheet_extension;

/// Return true if the path is an existing regular file with a spreadsheet extension
pub fn is_spreadsheet_file(path: &Path) -> bool {
    path.is_file() && has_spreadsheet_extension(path)
}

/// Same check for a listed entry whose metadata is already known
pub fn is_spreadsheet_entry(path: &Path, metadata: &Metadata) -> bool {
    metadata.is_file() && has_spreadsheet_extension(path)
}
