//! The lazy record sequence.
//!
//! [`CsvReader`] resolves the header eagerly on construction and then
//! produces one transformed row per pull. Rows suppressed by the pipeline
//! are skipped silently.
//!
//! # Stream ownership
//!
//! A reader opened from a path owns its file: the file is closed as soon as
//! the sequence is exhausted or fails, and also when construction fails. A
//! reader built over a caller-supplied handle never closes it; pass
//! `&mut handle` to keep using the handle after the reader is gone, or take
//! it back with [`CsvReader::into_inner`].

use crate::assembler::{ParseState, RecordAssembler};
use crate::config::{Config, RowSeparator};
use crate::error::{CsvError, Result};
use crate::header::{normalize_fields, Header};
use crate::streaming::buffers::DEFAULT_INPUT_BUFFER;
use crate::streaming::line_ending::detect_line_ending;
use crate::streaming::lines::LineReader;
use crate::transform::transform;
use crate::value::Row;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a reader's bytes come from.
#[derive(Debug)]
pub enum Input<R> {
    /// A path the reader opens, owns and closes.
    Path(PathBuf),
    /// An open handle the reader borrows and never closes.
    Handle(R),
}

/// The underlying byte source, with ownership carried as data.
enum Source<R> {
    Owned(File),
    Borrowed(R),
}

impl<R: Read> Read for Source<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Owned(f) => f.read(buf),
            Source::Borrowed(r) => r.read(buf),
        }
    }
}

impl<R: Seek> Seek for Source<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Source::Owned(f) => f.seek(pos),
            Source::Borrowed(r) => r.seek(pos),
        }
    }
}

type Assembler<R> = RecordAssembler<BufReader<Source<R>>>;

/// Sequence lifecycle after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Streaming,
    Exhausted,
    Failed,
}

/// A lazy, rewindable sequence of rows.
pub struct CsvReader<R> {
    config: Arc<Config>,
    header: Header,
    /// `None` once an owned file has been closed.
    assembler: Option<Assembler<R>>,
    /// Set when the reader owns its file.
    path: Option<PathBuf>,
    terminator: String,
    capacity: usize,
    /// Stream offset and counters right after the header.
    data_start: u64,
    data_state: ParseState,
    status: Status,
}

impl CsvReader<File> {
    /// Open a CSV file. The reader owns and closes the file.
    pub fn from_path<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        Self::open(Input::Path(path.as_ref().to_path_buf()), config, DEFAULT_INPUT_BUFFER)
    }
}

impl<R: Read + Seek> CsvReader<R> {
    /// Read from an already-open handle. The reader never closes it.
    ///
    /// A handle passed by value is still dropped along with the reader,
    /// and also when construction fails. Pass `&mut handle` to keep the
    /// handle open and usable in both cases.
    pub fn from_reader(reader: R, config: Config) -> Result<Self> {
        Self::open(Input::Handle(reader), config, DEFAULT_INPUT_BUFFER)
    }

    /// Build a reader with an explicit input buffer capacity.
    pub fn open(input: Input<R>, config: Config, capacity: usize) -> Result<Self> {
        config.validate()?;
        let (source, path) = match input {
            Input::Path(path) => (Source::Owned(File::open(&path)?), Some(path)),
            Input::Handle(r) => (Source::Borrowed(r), None),
        };
        let config = Arc::new(config);
        let mut buffered = BufReader::with_capacity(capacity, source);

        // Any error from here on drops `buffered`, which closes an owned file.
        let terminator = match &config.row_separator {
            RowSeparator::Explicit(s) => s.clone(),
            RowSeparator::Auto => {
                let start = buffered.stream_position()?;
                let ending = detect_line_ending(&mut buffered, config.quote)?;
                buffered.seek(SeekFrom::Start(start))?;
                ending.as_str().to_string()
            }
        };

        let mut assembler = RecordAssembler::new(
            LineReader::new(buffered, terminator.as_bytes()),
            Arc::clone(&config),
        );
        if config.skip_lines > 0 {
            let skipped = assembler.skip_lines(config.skip_lines)?;
            tracing::debug!(skipped, "skipped leading lines");
        }

        let file_fields = if config.headers_in_file {
            let fields = assembler.read_header()?.unwrap_or_default();
            Some(normalize_fields(fields, &config))
        } else {
            None
        };
        let header = Header::resolve(&config, file_fields)?;

        let data_start = assembler.stream_position()?;
        let data_state = assembler.state();
        tracing::debug!(
            keys = header.keys().len(),
            data_start,
            owned = path.is_some(),
            "header resolved"
        );

        Ok(Self {
            config,
            header,
            assembler: Some(assembler),
            path,
            terminator,
            capacity,
            data_start,
            data_state,
            status: Status::Streaming,
        })
    }

    /// Read the next emitted row, or `Ok(None)` once the input is exhausted.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        if self.status != Status::Streaming {
            return Ok(None);
        }
        let Some(assembler) = self.assembler.as_mut() else {
            return Ok(None);
        };

        let outcome = loop {
            match assembler.next_record() {
                Ok(Some(fields)) => {
                    if let Some(row) = transform(fields, &self.header, &self.config) {
                        break Ok(Some(row));
                    }
                }
                Ok(None) => break Ok(None),
                Err(e) => break Err(e),
            }
        };

        match outcome {
            Ok(None) => self.finish(Status::Exhausted),
            Err(_) => self.finish(Status::Failed),
            Ok(Some(_)) => {}
        }
        outcome
    }

    /// Restart the sequence at the first data record.
    ///
    /// The header is not read again. A path-owned reader whose file was
    /// already closed reopens it.
    pub fn rewind(&mut self) -> Result<()> {
        if self.assembler.is_none() {
            let Some(path) = &self.path else {
                return Err(CsvError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "input handle is no longer available",
                )));
            };
            let file = File::open(path)?;
            let buffered = BufReader::with_capacity(self.capacity, Source::Owned(file));
            self.assembler = Some(RecordAssembler::new(
                LineReader::new(buffered, self.terminator.as_bytes()),
                Arc::clone(&self.config),
            ));
        }

        let result = match self.assembler.as_mut() {
            Some(assembler) => assembler.seek_to(self.data_start, self.data_state),
            None => Ok(()),
        };
        match result {
            Ok(()) => {
                self.status = Status::Streaming;
                Ok(())
            }
            Err(e) => {
                self.finish(Status::Failed);
                Err(e.into())
            }
        }
    }

    /// Group rows into batches of `size`; the last batch may be shorter.
    pub fn chunks(self, size: usize) -> Chunks<R> {
        Chunks {
            reader: self,
            size: size.max(1),
        }
    }

    /// Take back the caller-supplied handle. `None` for path-owned readers.
    pub fn into_inner(self) -> Option<R> {
        match self.assembler?.into_inner().into_inner() {
            Source::Borrowed(r) => Some(r),
            Source::Owned(_) => None,
        }
    }

    /// Counters as of the last record read.
    pub fn state(&self) -> ParseState {
        self.assembler
            .as_ref()
            .map_or(self.data_state, RecordAssembler::state)
    }

    fn finish(&mut self, status: Status) {
        self.status = status;
        if self.path.is_some() && self.assembler.take().is_some() {
            tracing::debug!(?status, "closed input file");
        }
    }
}

impl<R> CsvReader<R> {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The row terminator in use, detected or configured.
    pub fn line_ending(&self) -> &str {
        &self.terminator
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the reader owns (and will close) its input.
    pub fn owns_input(&self) -> bool {
        self.path.is_some()
    }

    /// Whether the underlying file has been closed.
    pub fn is_closed(&self) -> bool {
        self.assembler.is_none()
    }
}

impl<R: Read + Seek> Iterator for CsvReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row().transpose()
    }
}

/// Iterator over fixed-size batches of rows.
pub struct Chunks<R> {
    reader: CsvReader<R>,
    size: usize,
}

impl<R> Chunks<R> {
    pub fn reader(&self) -> &CsvReader<R> {
        &self.reader
    }
}

impl<R: Read + Seek> Iterator for Chunks<R> {
    type Item = Result<Vec<Row>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = Vec::with_capacity(self.size.min(1024));
        while chunk.len() < self.size {
            match self.reader.read_row() {
                Ok(Some(row)) => chunk.push(row),
                Ok(None) => break,
                Err(e) => return Some(Err(e)),
            }
        }
        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::io::Cursor;

    fn reader(input: &str, config: Config) -> CsvReader<Cursor<Vec<u8>>> {
        CsvReader::from_reader(Cursor::new(input.as_bytes().to_vec()), config).unwrap()
    }

    #[test]
    fn test_basic_rows() {
        let mut r = reader("id,name\n1,ann\n2,bob\n", Config::new());
        let rows: Vec<Row> = r.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));
        assert_eq!(rows[1].get("name"), Some(&Value::from("bob")));
        assert_eq!(r.status(), Status::Exhausted);
        assert!(!r.is_closed());
    }

    #[test]
    fn test_auto_line_ending() {
        let config = Config::new().with_row_separator(RowSeparator::Auto);
        let r = reader("a,b\r\n1,2\r\n3,4\r\n", config);
        assert_eq!(r.line_ending(), "\r\n");
        let rows: Vec<Row> = r.collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("b"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_rewind_replays_rows() {
        let mut r = reader("id,v\n1,x\n#skip\n2,y\n", Config::new());
        let first: Vec<Row> = r.by_ref().collect::<Result<_>>().unwrap();
        r.rewind().unwrap();
        let second: Vec<Row> = r.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunks() {
        let r = reader("n\n1\n2\n3\n4\n5\n", Config::new());
        let chunks: Vec<Vec<Row>> = r.chunks(2).collect::<Result<_>>().unwrap();
        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), [2, 2, 1]);
    }

    #[test]
    fn test_failure_stops_sequence() {
        let mut r = reader("a\n\"x\"y\n2\n", Config::new());
        assert!(matches!(
            r.next(),
            Some(Err(CsvError::MalformedRecord { record: 2, .. }))
        ));
        assert_eq!(r.status(), Status::Failed);
        assert!(r.next().is_none());
    }

    #[test]
    fn test_into_inner_returns_handle() {
        let r = reader("a\n1\n", Config::new());
        let cursor = r.into_inner().unwrap();
        assert_eq!(cursor.get_ref(), b"a\n1\n");
    }
}
