//! Reader lifecycle: stream ownership, rewind, chunking and failure handling.

use lazy_csv::{process_path, Config, CsvError, CsvReader, Row, Status, Value};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

fn create_csv_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}

const PEOPLE: &str = "\
Name,Age,City
ann,31,Oslo
# retired
bob,45,\"Bergen, West\"
carl,,Tromso
";

// =============================================================================
// Ownership
// =============================================================================

#[test]
fn test_path_reader_closes_on_exhaustion() {
    let file = create_csv_file(PEOPLE);
    let mut reader = CsvReader::from_path(file.path(), Config::new()).unwrap();
    assert!(reader.owns_input());

    let rows: Vec<Row> = reader.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(reader.status(), Status::Exhausted);
    assert!(reader.is_closed());
    assert!(reader.next().is_none());
}

#[test]
fn test_path_reader_closes_on_failure() {
    let file = create_csv_file("a,b\n1,2\n\"x\"y,3\n4,5\n");
    let mut reader = CsvReader::from_path(file.path(), Config::new()).unwrap();

    assert!(reader.next().unwrap().is_ok());
    match reader.next() {
        Some(Err(CsvError::MalformedRecord { record, line, .. })) => {
            assert_eq!(record, 3);
            assert_eq!(line, 3);
        }
        other => panic!("expected malformed record, got {:?}", other),
    }
    assert_eq!(reader.status(), Status::Failed);
    assert!(reader.is_closed());
}

#[test]
fn test_handle_is_never_closed() {
    let mut cursor = Cursor::new(PEOPLE.as_bytes().to_vec());
    {
        let mut reader = CsvReader::from_reader(&mut cursor, Config::new()).unwrap();
        assert!(!reader.owns_input());
        assert_eq!(reader.by_ref().count(), 3);
        assert!(!reader.is_closed());
    }

    // The caller still holds a usable handle.
    cursor.seek(SeekFrom::Start(0)).unwrap();
    let mut text = String::new();
    cursor.read_to_string(&mut text).unwrap();
    assert_eq!(text, PEOPLE);
}

#[test]
fn test_borrowed_handle_survives_failed_construction() {
    let mut cursor = Cursor::new(b"a,b\n1,2\n".to_vec());
    let config = Config::new().with_user_headers(["x"]);
    let result = CsvReader::from_reader(&mut cursor, config);
    assert!(matches!(result, Err(CsvError::HeaderSizeMismatch { .. })));

    // The failed reader is gone but the handle can still be parsed.
    cursor.seek(SeekFrom::Start(0)).unwrap();
    let reader = CsvReader::from_reader(&mut cursor, Config::new()).unwrap();
    assert_eq!(reader.count(), 1);
}

#[test]
fn test_handle_from_open_file() {
    let file = create_csv_file("x\n1\n2\n");
    let mut handle = file.reopen().unwrap();
    let reader = CsvReader::from_reader(&mut handle, Config::new()).unwrap();
    let total: i64 = reader
        .map(|row| row.unwrap().get("x").and_then(Value::as_i64).unwrap_or(0))
        .sum();
    assert_eq!(total, 3);

    // Reading after exhaustion still works on the caller's handle.
    handle.seek(SeekFrom::Start(0)).unwrap();
    let mut first = [0u8; 1];
    handle.read_exact(&mut first).unwrap();
    assert_eq!(&first, b"x");
}

#[test]
fn test_missing_file_fails_construction() {
    let result = CsvReader::from_path("/nonexistent/lazy-csv/input.csv", Config::new());
    assert!(matches!(result, Err(CsvError::Io(_))));
}

#[test]
fn test_setup_failure_on_invalid_option() {
    let file = create_csv_file(PEOPLE);
    let config = Config::new().with_delimiter(b'"');
    assert!(matches!(
        CsvReader::from_path(file.path(), config),
        Err(CsvError::IncorrectOption(_))
    ));
}

// =============================================================================
// Rewind
// =============================================================================

#[test]
fn test_rewind_after_close_reopens_path() {
    let file = create_csv_file(PEOPLE);
    let mut reader = CsvReader::from_path(file.path(), Config::new()).unwrap();

    let first: Vec<Row> = reader.by_ref().collect::<Result<_, _>>().unwrap();
    assert!(reader.is_closed());

    reader.rewind().unwrap();
    assert!(!reader.is_closed());
    assert_eq!(reader.status(), Status::Streaming);
    let second: Vec<Row> = reader.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rewind_mid_stream() {
    let mut reader =
        CsvReader::from_reader(Cursor::new(PEOPLE.as_bytes()), Config::new()).unwrap();
    let ann = reader.next().unwrap().unwrap();
    reader.next().unwrap().unwrap();

    reader.rewind().unwrap();
    assert_eq!(reader.state().record, 1);
    assert_eq!(reader.state().file_line, 1);
    assert_eq!(reader.next().unwrap().unwrap(), ann);
}

#[test]
fn test_rewind_skips_header_and_skipped_lines() {
    let content = "generated by tool\nid,v\n1,a\n2,b\n";
    let config = Config::new().with_skip_lines(1);
    let mut reader = CsvReader::from_reader(Cursor::new(content), config).unwrap();
    assert_eq!(reader.by_ref().count(), 2);
    reader.rewind().unwrap();
    let ids: Vec<i64> = reader
        .map(|row| row.unwrap().get("id").and_then(Value::as_i64).unwrap())
        .collect();
    assert_eq!(ids, [1, 2]);
}

// =============================================================================
// Chunks
// =============================================================================

#[test]
fn test_chunks_from_path() {
    let mut content = String::from("n\n");
    for i in 0..7 {
        content.push_str(&format!("{}\n", i));
    }
    let file = create_csv_file(&content);
    let reader = CsvReader::from_path(file.path(), Config::new()).unwrap();

    let chunks: Vec<Vec<Row>> = reader.chunks(3).collect::<Result<_, _>>().unwrap();
    let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
    assert_eq!(sizes, [3, 3, 1]);
    assert_eq!(chunks[2][0].get("n"), Some(&Value::Int(6)));
}

#[test]
fn test_chunks_yield_nothing_for_empty_body() {
    let reader = CsvReader::from_reader(Cursor::new("a,b\n"), Config::new()).unwrap();
    assert_eq!(reader.chunks(10).count(), 0);
}

#[test]
fn test_process_path() {
    let file = create_csv_file(PEOPLE);
    let rows = process_path(file.path(), Config::new()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].get("city"), Some(&Value::from("Bergen, West")));
    assert_eq!(rows[2].get("age"), None);
    assert_eq!(rows[2].len(), 2);
}
