//! End-to-end tests driving the xlsx2csv binary

mod common;

#[cfg(test)]
mod cli_tests {
    use crate::common::{Cell, XlsxFixture};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::process::{Command, Output};
    use tempfile::tempdir;

    fn run_xlsx2csv(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_xlsx2csv"))
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run xlsx2csv")
    }

    fn stdout_of(output: &Output) -> String {
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn stderr_of(output: &Output) -> String {
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    #[test]
    fn test_single_file_to_stdout() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("book.xlsx");
        XlsxFixture::new()
            .sheet(
                "S",
                vec![
                    vec![Cell::Text("name"), Cell::Text("qty")],
                    vec![Cell::Text("bolt"), Cell::Number(40.0)],
                ],
            )
            .write(&source);

        let output = run_xlsx2csv(&["--xlsx", source.to_str().unwrap(), "--quiet"]);

        assert!(output.status.success());
        assert_eq!(stdout_of(&output), "name;qty\nbolt;40\n");
    }

    #[test]
    fn test_single_file_to_path_with_options() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("book.xlsx");
        let destination = tmp.path().join("out/book.tsv");
        XlsxFixture::new()
            .text_sheet("First", &[&["ignored"]])
            .text_sheet("Second", &[&[" a ", "b"]])
            .write(&source);

        let output = run_xlsx2csv(&[
            "--xlsx",
            source.to_str().unwrap(),
            "--csv",
            destination.to_str().unwrap(),
            "--sheet",
            "1",
            "--delimiter",
            "tab",
            "--trim",
            "--bom",
        ]);

        assert!(output.status.success(), "stderr: {}", stderr_of(&output));
        let bytes = fs::read(&destination).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"a\tb\n");
        assert!(stdout_of(&output).contains("Converted"));
    }

    #[test]
    fn test_missing_input_reports_error_and_exits_zero() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nope.xlsx");

        let output = run_xlsx2csv(&["--xlsx", missing.to_str().unwrap()]);

        assert!(output.status.success());
        assert!(stdout_of(&output).is_empty());
        assert!(stderr_of(&output).contains("nope.xlsx"));
    }

    #[test]
    fn test_bad_sheet_index() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("book.xlsx");
        let destination = tmp.path().join("book.csv");
        XlsxFixture::new().text_sheet("S", &[&["x"]]).write(&source);

        let output = run_xlsx2csv(&[
            "--xlsx",
            source.to_str().unwrap(),
            "--csv",
            destination.to_str().unwrap(),
            "--sheet",
            "3",
        ]);

        assert!(output.status.success());
        assert!(stderr_of(&output).contains("Sheet 3 does not exist"));
        assert!(!destination.exists());
    }

    #[test]
    fn test_batch_mode_with_report() {
        let tmp = tempdir().unwrap();
        XlsxFixture::new()
            .text_sheet("S", &[&["one"]])
            .write(&tmp.path().join("one.xlsx"));
        XlsxFixture::new()
            .text_sheet("S", &[&["two"], &["2"]])
            .write(&tmp.path().join("two.xlsm"));
        fs::write(tmp.path().join("broken.xls"), b"garbage").unwrap();
        let report = tmp.path().join("report.json");
        let mask = format!("{}/converted/*.csv", tmp.path().display());

        let output = run_xlsx2csv(&[
            "--batch",
            tmp.path().to_str().unwrap(),
            "--batchMask",
            &mask,
            "--batchThreads",
            "0",
            "--batchReport",
            report.to_str().unwrap(),
            "--quiet",
        ]);

        assert!(output.status.success(), "stderr: {}", stderr_of(&output));
        assert_eq!(
            fs::read_to_string(tmp.path().join("converted/one.csv")).unwrap(),
            "one\n"
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("converted/two.csv")).unwrap(),
            "two\n2\n"
        );
        assert!(stderr_of(&output).contains("broken.xls"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(json["succeeded"], 2);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["jobs"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_batch_on_file_is_reported() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("single.xlsx");
        XlsxFixture::new().text_sheet("S", &[&["x"]]).write(&file);

        let output = run_xlsx2csv(&["--batch", file.to_str().unwrap()]);

        assert!(output.status.success());
        assert!(stderr_of(&output).contains("is not a directory"));
    }

    #[test]
    fn test_invalid_delimiter_exits_non_zero() {
        let output = run_xlsx2csv(&["--xlsx", "whatever.xlsx", "--delimiter", "\""]);
        assert!(!output.status.success());
        assert!(stderr_of(&output).contains("Invalid configuration"));
    }

    #[test]
    fn test_invalid_date_pattern_is_a_configuration_error() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("dated.xlsx");
        XlsxFixture::new()
            .sheet("S", vec![vec![Cell::Date(45000.0)]])
            .write(&source);

        let output = run_xlsx2csv(&["--xlsx", source.to_str().unwrap(), "--fmtDateFixed", "%Y-%Q"]);

        assert_eq!(output.status.code(), Some(2));
        assert!(stdout_of(&output).is_empty());
        assert!(stderr_of(&output).contains("Invalid configuration"));
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        let output = run_xlsx2csv(&["--xlsx", "whatever.xlsx", "--delimiter", "§"]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stderr_of(&output).contains("ASCII"));
    }

    #[test]
    fn test_no_mode_prints_help() {
        let output = run_xlsx2csv(&[]);
        assert!(output.status.success());
        let stdout = stdout_of(&output);
        assert!(stdout.contains("--batchMask"));
        assert!(stdout.contains("--fmtDateFixed"));
        assert!(stdout.contains("ASCII"));
    }
}
