//! Physical line reading with an arbitrary terminator.

use std::io::{self, BufRead, Seek, SeekFrom};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads terminator-delimited physical lines from a buffered stream.
///
/// Each line keeps its terminator. The final line of a stream may lack one.
/// A UTF-8 byte order mark at the very start of the stream is dropped.
pub struct LineReader<R> {
    reader: R,
    terminator: Vec<u8>,
    at_start: bool,
}

impl<R: BufRead> LineReader<R> {
    /// Create a line reader. `terminator` must not be empty.
    pub fn new(reader: R, terminator: impl Into<Vec<u8>>) -> Self {
        Self {
            reader,
            terminator: terminator.into(),
            at_start: true,
        }
    }

    /// The terminator this reader splits on.
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    /// Append the next physical line, terminator included, to `out`.
    ///
    /// Returns `Ok(false)` once the stream is exhausted.
    pub fn read_line(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
        let start = out.len();
        let Some(&last) = self.terminator.last() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty line terminator",
            ));
        };

        loop {
            let n = self.reader.read_until(last, out)?;
            if n == 0 || out[start..].ends_with(&self.terminator) || out.last() != Some(&last) {
                break;
            }
        }

        if self.at_start {
            self.at_start = false;
            if out[start..].starts_with(UTF8_BOM) {
                out.drain(start..start + UTF8_BOM.len());
            }
        }
        Ok(out.len() > start)
    }

    /// Discard up to `n` physical lines. Returns how many were skipped.
    pub fn skip_lines(&mut self, n: usize) -> io::Result<usize> {
        let mut scratch = Vec::new();
        for skipped in 0..n {
            scratch.clear();
            if !self.read_line(&mut scratch)? {
                return Ok(skipped);
            }
        }
        Ok(n)
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead + Seek> LineReader<R> {
    /// Current logical position in the underlying stream.
    pub fn stream_position(&mut self) -> io::Result<u64> {
        self.reader.stream_position()
    }

    /// Reposition the underlying stream, discarding buffered input.
    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(pos))?;
        Ok(())
    }
}

/// Decode a physical line as UTF-8 into an owned string.
///
/// With `replacement` set, each invalid byte sequence is replaced by it;
/// otherwise invalid input yields `None`. The input buffer is left untouched
/// so the caller can reuse it.
pub fn decode_line(bytes: &[u8], replacement: Option<&str>) -> Option<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(s.to_owned());
    }
    let replacement = replacement?;
    let mut repaired = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        repaired.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            repaired.push_str(replacement);
        }
    }
    Some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn all_lines(input: &[u8], terminator: &str) -> Vec<Vec<u8>> {
        let mut reader = LineReader::new(input, terminator);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        while reader.read_line(&mut buf).unwrap() {
            lines.push(std::mem::take(&mut buf));
        }
        lines
    }

    #[test]
    fn test_lf_lines_keep_terminator() {
        let lines = all_lines(b"a,b\nc,d\ne", "\n");
        assert_eq!(lines, vec![b"a,b\n".to_vec(), b"c,d\n".to_vec(), b"e".to_vec()]);
    }

    #[test]
    fn test_crlf_ignores_bare_lf() {
        let lines = all_lines(b"a\nb\r\nc\r\n", "\r\n");
        assert_eq!(lines, vec![b"a\nb\r\n".to_vec(), b"c\r\n".to_vec()]);
    }

    #[test]
    fn test_custom_terminator() {
        let lines = all_lines(b"a\x01b\x02c\x01d\x02", "\x02");
        assert_eq!(lines, vec![b"a\x01b\x02".to_vec(), b"c\x01d\x02".to_vec()]);
    }

    #[test]
    fn test_multibyte_terminator_across_small_buffer() {
        let inner = BufReader::with_capacity(2, &b"ab||cd||ef"[..]);
        let mut reader = LineReader::new(inner, "||");
        let mut buf = Vec::new();
        assert!(reader.read_line(&mut buf).unwrap());
        assert_eq!(buf, b"ab||");
        buf.clear();
        assert!(reader.read_line(&mut buf).unwrap());
        assert_eq!(buf, b"cd||");
        buf.clear();
        assert!(reader.read_line(&mut buf).unwrap());
        assert_eq!(buf, b"ef");
        buf.clear();
        assert!(!reader.read_line(&mut buf).unwrap());
    }

    #[test]
    fn test_bom_dropped_once() {
        let lines = all_lines(b"\xEF\xBB\xBFa\n\xEF\xBB\xBFb\n", "\n");
        assert_eq!(lines[0], b"a\n");
        assert_eq!(lines[1], b"\xEF\xBB\xBFb\n");
    }

    #[test]
    fn test_skip_lines() {
        let mut reader = LineReader::new(&b"x\ny\nz\n"[..], "\n");
        assert_eq!(reader.skip_lines(2).unwrap(), 2);
        let mut buf = Vec::new();
        assert!(reader.read_line(&mut buf).unwrap());
        assert_eq!(buf, b"z\n");
        assert_eq!(reader.skip_lines(5).unwrap(), 0);
    }

    #[test]
    fn test_seek_rereads() {
        let mut reader = LineReader::new(BufReader::new(Cursor::new(b"h\n1\n2\n".to_vec())), "\n");
        let mut buf = Vec::new();
        reader.read_line(&mut buf).unwrap();
        let pos = reader.stream_position().unwrap();
        assert_eq!(pos, 2);
        buf.clear();
        reader.read_line(&mut buf).unwrap();
        reader.seek_to(pos).unwrap();
        buf.clear();
        reader.read_line(&mut buf).unwrap();
        assert_eq!(buf, b"1\n");
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"ok", None).as_deref(), Some("ok"));
        assert_eq!(decode_line(b"a\xFFb", None), None);
        assert_eq!(decode_line(b"a\xFFb", Some("")).as_deref(), Some("ab"));
        assert_eq!(decode_line(b"a\xFFb", Some("?")).as_deref(), Some("a?b"));
    }
}
