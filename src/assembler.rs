//! Logical record assembly.
//!
//! A logical record is one physical line, plus as many following physical
//! lines as needed to balance its quote characters. Comment detection only
//! looks at the first physical line of a record; a continuation line is
//! never treated as a comment.

use crate::config::Config;
use crate::error::{CsvError, Result};
use crate::streaming::buffers::DEFAULT_LINE_BUFFER;
use crate::streaming::lines::{decode_line, LineReader};
use crate::streaming::parsing::count_byte;
use crate::streaming::split::FieldSplitter;
use std::io::{self, BufRead, Seek};
use std::sync::Arc;

/// Parse position counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseState {
    /// Physical lines read, comments and continuation lines included.
    pub file_line: usize,
    /// Logical records completed, header included, comments excluded.
    pub record: usize,
}

/// What to do with a comment-pattern match on the first line of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comments {
    /// Discard the whole line (data records).
    Skip,
    /// Remove the matched text and keep the rest (the header line).
    Strip,
}

/// Builds logical records from physical lines and splits them into fields.
pub struct RecordAssembler<R> {
    lines: LineReader<R>,
    config: Arc<Config>,
    splitter: FieldSplitter,
    state: ParseState,
    buf: Vec<u8>,
}

impl<R: BufRead> RecordAssembler<R> {
    pub fn new(lines: LineReader<R>, config: Arc<Config>) -> Self {
        let splitter = FieldSplitter::from_config(&config);
        Self {
            lines,
            config,
            splitter,
            state: ParseState::default(),
            buf: Vec::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Drop `n` physical lines before any interpretation. Not counted.
    pub fn skip_lines(&mut self, n: usize) -> io::Result<usize> {
        self.lines.skip_lines(n)
    }

    /// Read and split the header line.
    ///
    /// The header is read even if it matches the comment pattern; the
    /// matched text is removed first. `strip_chars_from_headers` is applied
    /// to the raw text before splitting.
    pub fn read_header(&mut self) -> Result<Option<Vec<String>>> {
        let Some(mut text) = self.next_record_text(Comments::Strip)? else {
            return Ok(None);
        };
        if let Some(re) = &self.config.strip_chars_from_headers {
            text = re.replace_all(&text, "").into_owned();
        }
        self.split(&text).map(Some)
    }

    /// Read the next data record as raw fields.
    ///
    /// Returns `Ok(None)` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<Vec<String>>> {
        match self.next_record_text(Comments::Skip)? {
            Some(text) => self.split(&text).map(Some),
            None => Ok(None),
        }
    }

    fn split(&self, text: &str) -> Result<Vec<String>> {
        self.splitter.split(text).map_err(|e| {
            CsvError::malformed(self.state.record, self.state.file_line, e.to_string())
        })
    }

    /// Read one physical line and decode it, repairing invalid bytes when
    /// configured.
    fn read_physical(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if !self.lines.read_line(&mut self.buf)? {
            return Ok(None);
        }
        self.state.file_line += 1;
        if self.config.verbose {
            tracing::info!(
                file_line = self.state.file_line,
                record = self.state.record,
                "processing"
            );
        }

        let replacement = self
            .config
            .repairs_encoding()
            .then_some(self.config.invalid_byte_replacement.as_str());
        match decode_line(&self.buf, replacement) {
            Some(text) => Ok(Some(text)),
            None => Err(CsvError::InvalidEncoding {
                line: self.state.file_line,
            }),
        }
    }

    fn next_record_text(&mut self, comments: Comments) -> Result<Option<String>> {
        let quote = self.config.quote;
        loop {
            let Some(mut text) = self.read_physical()? else {
                return Ok(None);
            };

            if let Some(re) = &self.config.comment_pattern {
                match comments {
                    Comments::Skip if re.is_match(&text) => {
                        tracing::trace!(file_line = self.state.file_line, "skipping comment line");
                        continue;
                    }
                    Comments::Strip => text = re.replace(&text, "").into_owned(),
                    Comments::Skip => {}
                }
            }

            let first_line = self.state.file_line;
            let mut quotes = count_byte(text.as_bytes(), quote);
            while quotes % 2 == 1 {
                let Some(next) = self.read_physical()? else {
                    return Err(CsvError::malformed(
                        self.state.record + 1,
                        self.state.file_line,
                        "unclosed quoted field at end of input",
                    ));
                };
                quotes += count_byte(next.as_bytes(), quote);
                text.push_str(&next);
            }
            if self.state.file_line > first_line {
                tracing::debug!(
                    from = first_line,
                    to = self.state.file_line,
                    record = self.state.record + 1,
                    "record spans multiple lines"
                );
            }

            self.state.record += 1;
            let terminator = self.lines.terminator();
            if text.as_bytes().ends_with(terminator) {
                text.truncate(text.len() - terminator.len());
            }
            return Ok(Some(text));
        }
    }
}

impl<R: BufRead + Seek> RecordAssembler<R> {
    pub fn stream_position(&mut self) -> io::Result<u64> {
        self.lines.stream_position()
    }

    /// Reposition the stream and restore the counters that belong there.
    pub fn seek_to(&mut self, pos: u64, state: ParseState) -> io::Result<()> {
        self.lines.seek_to(pos)?;
        self.state = state;
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.lines.into_inner()
    }
}
