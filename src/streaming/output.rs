//! Row output formatting for the command line tool.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use crate::error::CsvError;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use crate::value::{Key, Row, Value};
use std::io::{BufWriter, Write};

/// Writes rows as one tab-separated line each.
///
/// Mapping rows print `key=value` pairs, positional rows print bare values.
/// Tabs, line breaks and backslashes inside text are escaped so every row
/// stays on a single line.
pub struct RowWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> RowWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write one row followed by a newline.
    pub fn write_row(&mut self, row: &Row) -> Result<(), CsvError> {
        match row {
            Row::Positional(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.writer.write_all(b"\t")?;
                    }
                    self.write_value(value)?;
                }
            }
            Row::Mapping(pairs) => {
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        self.writer.write_all(b"\t")?;
                    }
                    self.write_text(key.as_str())?;
                    self.writer.write_all(b"=")?;
                    self.write_value(value)?;
                }
            }
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write resolved header keys, one per line.
    pub fn write_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a Key>) -> Result<(), CsvError> {
        for key in keys {
            self.write_text(key.as_str())?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Write a full line as-is with newline.
    pub fn write_line(&mut self, line: &str) -> Result<(), CsvError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    pub fn write_value(&mut self, value: &Value) -> Result<(), CsvError> {
        match value {
            Value::Null => {}
            Value::Text(s) => self.write_text(s)?,
            Value::Int(n) => self.writer.write_all(self.itoa_buf.format(*n).as_bytes())?,
            Value::Float(f) => self.writer.write_all(self.ryu_buf.format(*f).as_bytes())?,
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), CsvError> {
        let bytes = text.as_bytes();
        let mut start = 0;
        for (pos, &b) in bytes.iter().enumerate() {
            let escaped: &[u8] = match b {
                b'\t' => b"\\t",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\\' => b"\\\\",
                _ => continue,
            };
            self.writer.write_all(&bytes[start..pos])?;
            self.writer.write_all(escaped)?;
            start = pos + 1;
        }
        self.writer.write_all(&bytes[start..])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), CsvError> {
        self.writer.flush()?;
        Ok(())
    }
}
