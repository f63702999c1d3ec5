//! Active sheet lookup for Office Open XML workbooks
//!
//! The workbook remembers which tab was selected when it was saved in the
//! `activeTab` attribute of `<workbookView>` inside `xl/workbook.xml`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Index of the sheet that was active when the workbook was saved.
///
/// Returns `None` for non-OOXML files or when the attribute is absent or
/// unreadable; callers fall back to the first sheet.
pub fn active_sheet_index(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !matches!(ext.as_str(), "xlsx" | "xlsm") {
        return None;
    }

    let file = File::open(path).ok()?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).ok()?;
    let entry = archive.by_name("xl/workbook.xml").ok()?;
    read_active_tab(BufReader::new(entry))
}

/// Extract `activeTab` from a `workbook.xml` stream
pub fn read_active_tab<R: BufRead>(reader: R) -> Option<usize> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"workbookView" =>
            {
                let attr = e.try_get_attribute("activeTab").ok()??;
                let value = attr.decode_and_unescape_value(&xml).ok()?;
                return value.trim().parse().ok();
            }
            // Sheets are listed after the views; nothing useful past them
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheets" => return None,
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}
