//! Integration tests converting real XLSX files through calamine

mod common;

#[cfg(test)]
mod workbook_tests {
    use crate::common::{Cell, XlsxFixture};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;
    use xlsx2csv::scanner::{CalamineScanner, ScanStep, SheetScanner};
    use xlsx2csv::{convert_workbook, ConversionConfig, ConversionErrorKind, SheetSelector};

    fn convert(source: &Path, config: &ConversionConfig) -> String {
        let destination = source.with_extension("csv");
        convert_workbook(source, Some(&destination), config).unwrap();
        fs::read_to_string(destination).unwrap()
    }

    #[test]
    fn test_text_and_numbers() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("prices.xlsx");
        XlsxFixture::new()
            .sheet(
                "Prices",
                vec![
                    vec![Cell::Text("item"), Cell::Text("price")],
                    vec![Cell::Text("tea; green"), Cell::Number(12.5)],
                    vec![Cell::Text("cup"), Cell::Number(3.0)],
                ],
            )
            .write(&source);

        let output = convert(&source, &ConversionConfig::default());
        assert_eq!(output, "item;price\n\"tea; green\";12.5\ncup;3\n");
    }

    #[test]
    fn test_active_tab_is_default_sheet() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("tabs.xlsx");
        XlsxFixture::new()
            .text_sheet("First", &[&["one"]])
            .text_sheet("Second", &[&["two"]])
            .text_sheet("Third", &[&["three"]])
            .active(1)
            .write(&source);

        assert_eq!(convert(&source, &ConversionConfig::default()), "two\n");

        let explicit = ConversionConfig::default().with_sheet(SheetSelector::Index(2));
        assert_eq!(convert(&source, &explicit), "three\n");
    }

    #[test]
    fn test_without_active_tab_first_sheet_is_used() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("plain.xlsx");
        XlsxFixture::new()
            .text_sheet("A", &[&["a"]])
            .text_sheet("B", &[&["b"]])
            .write(&source);

        let mut scanner = CalamineScanner::open(&source).unwrap();
        assert_eq!(scanner.current_sheet(), 0);
        assert_eq!(scanner.sheet_names(), vec!["A".to_string(), "B".to_string()]);
        assert_matches!(scanner.scan_next().unwrap(), ScanStep::Row(row) if row == vec!["a".to_string()]);
        assert_matches!(scanner.scan_next().unwrap(), ScanStep::EndOfStream);
        scanner.close().unwrap();
    }

    #[test]
    fn test_sheet_out_of_range_leaves_no_file() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("one.xlsx");
        let destination = tmp.path().join("one.csv");
        XlsxFixture::new().text_sheet("Only", &[&["x"]]).write(&source);

        let config = ConversionConfig::default().with_sheet(SheetSelector::Index(5));
        let error = convert_workbook(&source, Some(&destination), &config).unwrap_err();

        assert_matches!(
            error.kind(),
            Some(ConversionErrorKind::SheetSelection { index: 5, available: 1 })
        );
        assert!(!destination.exists());
    }

    #[test]
    fn test_leading_blank_rows_and_columns_are_padded() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("offset.xlsx");
        XlsxFixture::new()
            .sheet(
                "Offset",
                vec![
                    vec![Cell::Blank, Cell::Blank, Cell::Blank],
                    vec![Cell::Blank, Cell::Text("b2"), Cell::Text("c2")],
                ],
            )
            .write(&source);

        assert_eq!(convert(&source, &ConversionConfig::default()), ";;\n;b2;c2\n");
    }

    #[test]
    fn test_dates_and_booleans() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("typed.xlsx");
        XlsxFixture::new()
            .sheet(
                "Typed",
                vec![vec![Cell::Date(45000.0), Cell::Bool(true), Cell::Bool(false)]],
            )
            .write(&source);

        assert_eq!(
            convert(&source, &ConversionConfig::default()),
            "3/15/2023;TRUE;FALSE\n"
        );
        assert_eq!(
            convert(&source, &ConversionConfig::default().with_locale("ru")),
            "15.03.2023;TRUE;FALSE\n"
        );
        assert_eq!(
            convert(
                &source,
                &ConversionConfig::default().with_date_format(Some("%Y-%m-%d".to_string()))
            ),
            "2023-03-15;TRUE;FALSE\n"
        );
        assert_eq!(
            convert(&source, &ConversionConfig::default().with_raw_values(true)),
            "45000;1;0\n"
        );
    }

    #[test]
    fn test_locale_and_separators() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("money.xlsx");
        XlsxFixture::new()
            .sheet("Money", vec![vec![Cell::Number(1234567.25)]])
            .write(&source);

        let config = ConversionConfig::default()
            .with_locale("de_DE")
            .with_thousand_separator(Some(".".to_string()));
        assert_eq!(convert(&source, &config), "1.234.567,25\n");

        let raw = ConversionConfig::default()
            .with_locale("de")
            .with_raw_values(true);
        assert_eq!(convert(&source, &raw), "1234567.25\n");
    }

    #[test]
    fn test_bom_and_trim() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("spaced.xlsx");
        XlsxFixture::new()
            .text_sheet("S", &[&["  padded  ", "x"]])
            .write(&source);

        let config = ConversionConfig::default().with_bom(true).with_trim(true);
        let destination = tmp.path().join("spaced.csv");
        convert_workbook(&source, Some(&destination), &config).unwrap();

        let bytes = fs::read(destination).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"padded;x\n");
    }

    #[test]
    fn test_long_sheet_streams_every_row() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("long.xlsx");
        let rows = (0..2_000)
            .map(|i| vec![Cell::Number(i as f64), Cell::Text("row")])
            .collect();
        XlsxFixture::new().sheet("Long", rows).write(&source);

        let output = convert(&source, &ConversionConfig::default());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2_000);
        assert_eq!(lines[0], "0;row");
        assert_eq!(lines[1_999], "1999;row");
    }

    #[test]
    fn test_close_mid_stream() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("partial.xlsx");
        let rows = (0..1_000).map(|i| vec![Cell::Number(i as f64)]).collect();
        XlsxFixture::new().sheet("Rows", rows).write(&source);

        let mut scanner = CalamineScanner::open(&source).unwrap();
        assert_matches!(scanner.scan_next().unwrap(), ScanStep::Row(row) if row == vec!["0".to_string()]);
        scanner.close().unwrap();
        assert!(scanner.scan_next().is_err());
    }

    #[test]
    fn test_reselecting_sheet_restarts_the_stream() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("two.xlsx");
        XlsxFixture::new()
            .text_sheet("A", &[&["a1"], &["a2"]])
            .text_sheet("B", &[&["b1"]])
            .write(&source);

        let mut scanner = CalamineScanner::open(&source).unwrap();
        assert_matches!(scanner.scan_next().unwrap(), ScanStep::Row(row) if row == vec!["a1".to_string()]);

        scanner.select_sheet(1).unwrap();
        assert_matches!(scanner.scan_next().unwrap(), ScanStep::Row(row) if row == vec!["b1".to_string()]);
        assert_matches!(scanner.scan_next().unwrap(), ScanStep::EndOfStream);

        scanner.select_sheet(0).unwrap();
        assert_matches!(scanner.scan_next().unwrap(), ScanStep::Row(row) if row == vec!["a1".to_string()]);
        scanner.close().unwrap();
    }

    #[test]
    fn test_corrupt_workbook_fails_to_open() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("broken.xlsx");
        fs::write(&source, b"PK\x03\x04 not really a zip").unwrap();

        let error = convert_workbook(&source, Some(&tmp.path().join("broken.csv")), &ConversionConfig::default())
            .unwrap_err();
        assert_matches!(error.kind(), Some(ConversionErrorKind::Open { .. }));
        assert!(!tmp.path().join("broken.csv").exists());
    }
}
