//! Integration tests for the single-file conversion pipeline

#[cfg(test)]
mod pipeline_tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;
    use xlsx2csv::conversion::{stream_rows, FLUSH_INTERVAL, UTF8_BOM};
    use xlsx2csv::scanner::{MemoryOpener, MemoryWorkbook};
    use xlsx2csv::{
        CellValue, ConversionConfig, ConversionEngine, ConversionErrorKind, ConversionJob,
        SheetSelector, WorkbookOpener,
    };

    fn run(workbook: MemoryWorkbook, config: ConversionConfig) -> (String, u64) {
        let tmp = tempdir().unwrap();
        let destination = tmp.path().join("out.csv");
        let engine =
            ConversionEngine::with_opener(MemoryOpener::new().with_workbook("in.xlsx", workbook));

        let job = ConversionJob::new(PathBuf::from("in.xlsx"), Some(destination.clone()), config);
        let summary = engine.convert(&job).unwrap();
        (fs::read_to_string(destination).unwrap(), summary.rows_written)
    }

    #[test]
    fn test_formatted_numbers() {
        let workbook = MemoryWorkbook::new().with_sheet(
            "n",
            vec![vec![
                CellValue::Float(0.1 + 0.2),
                CellValue::Float(4605610000000.0),
                CellValue::Int(-1500),
            ]],
        );

        let (plain, _) = run(workbook.clone(), ConversionConfig::default());
        assert_eq!(plain, "0.3;4605610000000;-1500\n");

        let (scientific, _) = run(workbook, ConversionConfig::default().with_scientific(true));
        assert_eq!(scientific, "0.3;4.60561E+12;-1500\n");
    }

    #[test]
    fn test_raw_values_skip_rendering() {
        let workbook = MemoryWorkbook::new().with_sheet(
            "r",
            vec![vec![
                CellValue::Float(0.5),
                CellValue::Bool(true),
                CellValue::date(45000.0),
            ]],
        );

        let config = ConversionConfig::default()
            .with_raw_values(true)
            .with_decimal_separator(Some(",".to_string()));
        let (output, _) = run(workbook, config);
        assert_eq!(output, "0.5;1;45000\n");
    }

    #[test]
    fn test_tab_delimiter_and_quoting() {
        let workbook = MemoryWorkbook::new().with_text_sheet("t", &[&["a\tb", "c"], &["", "d"]]);
        let config = ConversionConfig::default().with_delimiter(b'\t');

        let (output, rows) = run(workbook, config);
        assert_eq!(rows, 2);
        assert_eq!(output, "\"a\tb\"\tc\n\td\n");
    }

    #[test]
    fn test_ragged_rows_are_written_as_is() {
        let workbook =
            MemoryWorkbook::new().with_text_sheet("r", &[&["a", "b", "c"], &["d"], &["e", "f"]]);
        let (output, _) = run(workbook, ConversionConfig::default());
        assert_eq!(output, "a;b;c\nd\ne;f\n");
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let workbook = MemoryWorkbook::new().with_sheet("l", vec![vec![CellValue::Float(2.5)]]);
        let (output, _) = run(workbook, ConversionConfig::default().with_locale("tlh"));
        assert_eq!(output, "2.5\n");
    }

    #[test]
    fn test_selected_sheet_is_converted() {
        let workbook = MemoryWorkbook::new()
            .with_text_sheet("a", &[&["first"]])
            .with_text_sheet("b", &[&["second"]]);
        let (output, _) = run(
            workbook,
            ConversionConfig::default().with_sheet(SheetSelector::Index(1)),
        );
        assert_eq!(output, "second\n");
    }

    #[test]
    fn test_multiple_flush_intervals() {
        let total = FLUSH_INTERVAL * 2 + 1;
        let rows = (0..total)
            .map(|i| vec![CellValue::Int(i as i64), CellValue::from("x")])
            .collect();
        let (output, written) = run(
            MemoryWorkbook::new().with_sheet("big", rows),
            ConversionConfig::default(),
        );

        assert_eq!(written, total);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len() as u64, total);
        assert_eq!(lines[0], "0;x");
        assert_eq!(lines[lines.len() - 1], format!("{};x", total - 1));
    }

    #[test]
    fn test_scan_failure_on_first_row_leaves_only_bom() {
        let tmp = tempdir().unwrap();
        let destination = tmp.path().join("out.csv");
        let workbook = MemoryWorkbook::new()
            .with_text_sheet("s", &[&["never"]])
            .with_scan_failure(0, 0, "corrupt row");
        let engine =
            ConversionEngine::with_opener(MemoryOpener::new().with_workbook("in.xlsx", workbook));

        let job = ConversionJob::new(
            PathBuf::from("in.xlsx"),
            Some(destination.clone()),
            ConversionConfig::default().with_bom(true),
        );
        let error = engine.convert(&job).unwrap_err();

        assert_matches!(error.kind(), Some(ConversionErrorKind::Scan { row: 0, .. }));
        assert!(error.user_message().contains("corrupt row"));
        assert_eq!(fs::read(destination).unwrap(), UTF8_BOM.to_vec());
        assert_eq!(engine.opener().close_count(), 1);
    }

    #[test]
    fn test_stream_rows_into_memory() {
        let opener = MemoryOpener::new().with_workbook(
            "in.xlsx",
            MemoryWorkbook::new().with_text_sheet("s", &[&["1", "2"]]),
        );
        let mut scanner = opener.open(Path::new("in.xlsx")).unwrap();

        let mut buffer = Vec::new();
        let rows = stream_rows(
            scanner.as_mut(),
            &mut buffer,
            &ConversionConfig::default().with_delimiter(b'|'),
        )
        .unwrap();

        assert_eq!(rows, 1);
        assert_eq!(buffer, b"1|2\n");
    }

    #[test]
    fn test_destination_is_truncated() {
        let tmp = tempdir().unwrap();
        let destination = tmp.path().join("out.csv");
        fs::write(&destination, "stale content that is much longer\n").unwrap();

        let engine = ConversionEngine::with_opener(
            MemoryOpener::new()
                .with_workbook("in.xlsx", MemoryWorkbook::new().with_text_sheet("s", &[&["new"]])),
        );
        let job = ConversionJob::new(
            PathBuf::from("in.xlsx"),
            Some(destination.clone()),
            ConversionConfig::default(),
        );
        engine.convert(&job).unwrap();

        assert_eq!(fs::read_to_string(destination).unwrap(), "new\n");
    }
}
