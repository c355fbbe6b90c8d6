//! Line ending detection.
//!
//! Scans an entire stream once and reports the most frequent of `\n`, `\r`
//! and `\r\n`, ignoring terminators inside quoted spans. A quoted span opens
//! and closes on every quote character; nesting is not tracked.
//!
//! # Tie-breaking
//!
//! Equal counts resolve in the order `\n`, `\r`, `\r\n`: the first maximum
//! wins. A stream with no terminator at all resolves to `\n`.

use memchr::memchr3_iter;
use std::fmt;
use std::io::{self, BufRead};

/// One of the recognized line endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    Lf,
    Cr,
    CrLf,
}

impl LineEnding {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Short display name (`LF`, `CR`, `CRLF`).
    pub fn name(&self) -> &'static str {
        match self {
            LineEnding::Lf => "LF",
            LineEnding::Cr => "CR",
            LineEnding::CrLf => "CRLF",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Occurrence counts of each line ending outside quoted spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineEndingCounts {
    pub lf: usize,
    pub cr: usize,
    pub crlf: usize,
}

impl LineEndingCounts {
    /// The most frequent ending, ties resolved in `\n`, `\r`, `\r\n` order.
    pub fn dominant(&self) -> LineEnding {
        let mut best = (LineEnding::Lf, self.lf);
        for candidate in [(LineEnding::Cr, self.cr), (LineEnding::CrLf, self.crlf)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }
}

impl fmt::Display for LineEndingCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LF={} CR={} CRLF={}", self.lf, self.cr, self.crlf)
    }
}

/// Count line endings in the remainder of `reader`.
///
/// Consumes the reader to its end; the caller repositions it afterwards.
/// A `\r` is only classified once the following character is known, and a
/// trailing `\r` at end of input counts as one `\r` ending.
pub fn count_line_endings<R: BufRead>(reader: &mut R, quote: u8) -> io::Result<LineEndingCounts> {
    let mut counts = LineEndingCounts::default();
    let mut in_quotes = false;
    // The last character seen outside quotes was a `\r`.
    let mut pending_cr = false;

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        let len = chunk.len();
        let mut next_unseen = 0;

        for pos in memchr3_iter(b'\r', b'\n', quote, chunk) {
            let b = chunk[pos];
            // Ordinary bytes between two interesting ones resolve a pending `\r`.
            if pos > next_unseen && !in_quotes && pending_cr {
                counts.cr += 1;
                pending_cr = false;
            }
            next_unseen = pos + 1;

            if b == quote {
                in_quotes = !in_quotes;
                if in_quotes {
                    continue;
                }
            } else if in_quotes {
                continue;
            }

            if pending_cr {
                pending_cr = false;
                if b == b'\n' {
                    counts.crlf += 1;
                    continue;
                }
                counts.cr += 1;
            }
            match b {
                b'\n' => counts.lf += 1,
                b'\r' => pending_cr = true,
                _ => {}
            }
        }

        if len > next_unseen && !in_quotes && pending_cr {
            counts.cr += 1;
            pending_cr = false;
        }
        reader.consume(len);
    }

    if pending_cr {
        counts.cr += 1;
    }
    Ok(counts)
}

/// Detect the dominant line ending of the remainder of `reader`.
pub fn detect_line_ending<R: BufRead>(reader: &mut R, quote: u8) -> io::Result<LineEnding> {
    let counts = count_line_endings(reader, quote)?;
    let ending = counts.dominant();
    tracing::debug!(%counts, %ending, "detected line ending");
    Ok(ending)
}
