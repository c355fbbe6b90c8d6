//! Command line tests for the `lazycsv` binary.
//!
//! Tests cover:
//! 1. parse: key remapping, numeric filters, positional output
//! 2. detect, headers and count
//! 3. stdin input
//! 4. Error reporting for malformed input

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::NamedTempFile;

// =============================================================================
// Helper functions
// =============================================================================

fn create_csv_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}

fn run_lazycsv(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lazycsv"))
        .args(args)
        .output()
        .expect("Failed to run lazycsv")
}

fn run_lazycsv_with_stdin(args: &[&str], stdin_content: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_lazycsv"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn lazycsv");

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(stdin_content.as_bytes()).unwrap();
    }

    child.wait_with_output().expect("Failed to wait for lazycsv")
}

fn is_success(output: &Output) -> bool {
    output.status.success()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn path(file: &NamedTempFile) -> &str {
    file.path().to_str().unwrap()
}

// =============================================================================
// parse
// =============================================================================

#[test]
fn test_parse_mapping_rows() {
    let file = create_csv_file("Name,Qty\nann,3\nbob,\n");
    let output = run_lazycsv(&["parse", path(&file)]);

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "name=ann\tqty=3\nname=bob\n");
}

#[test]
fn test_parse_with_map_and_only() {
    let file = create_csv_file("id,secret,zip,qty\n1,s,02134,5\n");
    let output = run_lazycsv(&[
        "parse",
        "--map",
        "secret=",
        "--map",
        "qty=amount",
        "--only",
        "amount",
        path(&file),
    ]);

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "id=1\tzip=02134\tamount=5\n");
}

#[test]
fn test_parse_arrays_without_header() {
    let file = create_csv_file("1,a,0\n\n2,b,\n");
    let output = run_lazycsv(&["parse", "--arrays", "--no-header", path(&file)]);

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "1\ta\t0\n2\tb\n");
}

#[test]
fn test_parse_chunks_are_separated() {
    let file = create_csv_file("n\n1\n2\n3\n");
    let output = run_lazycsv(&["parse", "--chunk-size", "2", path(&file)]);

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "n=1\nn=2\n\nn=3\n");
}

#[test]
fn test_parse_invalid_map_entry() {
    let file = create_csv_file("a\n1\n");
    let output = run_lazycsv(&["parse", "--map", "a", path(&file)]);

    assert!(!is_success(&output));
    assert!(stderr(&output).contains("OLD=NEW"));
}

// =============================================================================
// detect, headers, count
// =============================================================================

#[test]
fn test_detect_crlf() {
    let file = create_csv_file("a,b\r\n1,\"x\ny\"\r\n");
    let output = run_lazycsv(&["detect", path(&file)]);

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "CRLF\tLF=0 CR=0 CRLF=2\n");
}

#[test]
fn test_headers() {
    let file = create_csv_file("First Name,Zip-Code,\"City\"\nann,1,x\n");
    let output = run_lazycsv(&["headers", path(&file)]);

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "first_name\nzip_code\ncity\n");
}

#[test]
fn test_headers_keep_original() {
    let file = create_csv_file("First Name,Zip\n");
    let output = run_lazycsv(&["headers", "--keep-original-headers", path(&file)]);

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "First Name\nZip\n");
}

#[test]
fn test_count_rows_and_chunks() {
    let file = create_csv_file("n\n1\n2\n# note\n3\n\n4\n5\n");

    let output = run_lazycsv(&["count", path(&file)]);
    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "5\n");

    let output = run_lazycsv(&["count", "--chunk-size", "2", path(&file)]);
    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "5\t3\n");
}

// =============================================================================
// stdin
// =============================================================================

#[test]
fn test_parse_stdin_dash() {
    let output = run_lazycsv_with_stdin(&["parse", "-"], "n\n1\n2\n");

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "n=1\nn=2\n");
}

#[test]
fn test_stdin_without_input_argument() {
    let output = run_lazycsv_with_stdin(&["count", "--row-sep", "auto"], "a\r1\r2\r3\r");

    assert!(is_success(&output), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "3\n");
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_malformed_file_reports_error() {
    let file = create_csv_file("a,b\n1,2\n\"x\"y,3\n");
    let output = run_lazycsv(&["parse", path(&file)]);

    assert!(!is_success(&output));
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("Error: "), "stderr: {}", err);
    assert!(err.contains("record 3"), "stderr: {}", err);
}

#[test]
fn test_missing_file_reports_error() {
    let output = run_lazycsv(&["count", "/nonexistent/lazy-csv/input.csv"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("Error: "));
}
