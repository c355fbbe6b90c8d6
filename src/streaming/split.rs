//! Quote-aware field splitting for one logical line.
//!
//! Lines without a quote character (or with simple splitting forced) are cut
//! on the raw delimiter. Everything else is checked against the quote grammar
//! and handed to the `csv` crate for unescaping.

use crate::config::Config;
use memchr::{memchr, memchr_iter};
use std::borrow::Cow;
use thiserror::Error;

/// Why a line could not be resolved by the quote grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("unclosed quoted field in column {column}")]
    Unclosed { column: usize },

    #[error("illegal quoting in column {column}")]
    StrayQuote { column: usize },

    #[error("text after closing quote in column {column}")]
    TextAfterQuote { column: usize },

    #[error("{0}")]
    Parse(String),
}

/// Record terminator handed to the `csv` reader. `0xFF` never occurs in
/// UTF-8 text, so a line is always read as a single record and bare `\r` or
/// `\n` outside quotes stay field text.
const NO_TERMINATOR: u8 = 0xFF;

/// Splits logical lines into raw field strings.
#[derive(Debug, Clone, Copy)]
pub struct FieldSplitter {
    delimiter: u8,
    quote: u8,
    force_simple: bool,
    strip_whitespace: bool,
}

impl FieldSplitter {
    pub fn new(delimiter: u8, quote: u8) -> Self {
        Self {
            delimiter,
            quote,
            force_simple: false,
            strip_whitespace: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            delimiter: config.delimiter,
            quote: config.quote,
            force_simple: config.force_simple_split,
            strip_whitespace: config.strip_whitespace,
        }
    }

    pub fn with_force_simple(mut self, enabled: bool) -> Self {
        self.force_simple = enabled;
        self
    }

    pub fn with_strip_whitespace(mut self, enabled: bool) -> Self {
        self.strip_whitespace = enabled;
        self
    }

    /// Split a line whose terminator has already been removed.
    ///
    /// Quote characters left at field boundaries are stripped. When
    /// whitespace stripping is enabled it runs on both sides of the quote
    /// strip, so `  "b"` and `"b"` give the same field.
    pub fn split(&self, line: &str) -> Result<Vec<String>, QuoteError> {
        let raw = if self.force_simple || memchr(self.quote, line.as_bytes()).is_none() {
            self.split_simple(line)
        } else {
            check_quote_grammar(line.as_bytes(), self.delimiter, self.quote)?;
            self.split_quoted(line)?
        };

        let quote = self.quote as char;
        Ok(raw
            .into_iter()
            .map(|field| {
                let field: &str = &field;
                let field = if self.strip_whitespace { field.trim() } else { field };
                let field = field.trim_matches(quote);
                let field = if self.strip_whitespace { field.trim() } else { field };
                field.to_string()
            })
            .collect())
    }

    fn split_simple<'a>(&self, line: &'a str) -> Vec<Cow<'a, str>> {
        let bytes = line.as_bytes();
        let mut fields = Vec::with_capacity(16);
        let mut start = 0;
        for pos in memchr_iter(self.delimiter, bytes) {
            // Delimiter is ASCII, so every cut lands on a char boundary.
            fields.push(Cow::Borrowed(&line[start..pos]));
            start = pos + 1;
        }
        fields.push(Cow::Borrowed(&line[start..]));
        fields
    }

    fn split_quoted<'a>(&self, line: &'a str) -> Result<Vec<Cow<'a, str>>, QuoteError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(true)
            .terminator(csv::Terminator::Any(NO_TERMINATOR))
            .from_reader(line.as_bytes());

        let mut record = csv::StringRecord::new();
        reader
            .read_record(&mut record)
            .map_err(|e| QuoteError::Parse(e.to_string()))?;
        Ok(record.iter().map(|f| Cow::Owned(f.to_string())).collect())
    }
}

/// Validate RFC 4180 quoting: a quoted field must start with the quote
/// character, double any literal quote, and be followed directly by a
/// delimiter or the end of the line. Unquoted fields may not contain quotes.
pub fn check_quote_grammar(line: &[u8], delimiter: u8, quote: u8) -> Result<(), QuoteError> {
    let mut column = 1;
    let mut i = 0;
    let len = line.len();

    loop {
        if i < len && line[i] == quote {
            // Quoted field.
            i += 1;
            loop {
                let Some(offset) = memchr(quote, &line[i..]) else {
                    return Err(QuoteError::Unclosed { column });
                };
                i += offset + 1;
                if i < len && line[i] == quote {
                    i += 1;
                    continue;
                }
                break;
            }
            match line.get(i) {
                None => return Ok(()),
                Some(&b) if b == delimiter => {}
                Some(_) => return Err(QuoteError::TextAfterQuote { column }),
            }
            i += 1;
        } else {
            // Unquoted field: runs to the next delimiter.
            let end = memchr(delimiter, &line[i..]).map_or(len, |o| i + o);
            if memchr(quote, &line[i..end]).is_some() {
                return Err(QuoteError::StrayQuote { column });
            }
            if end == len {
                return Ok(());
            }
            i = end + 1;
        }
        if line.get(i - 1).is_some_and(|&b| b == delimiter) {
            column += 1;
        }
    }
}
