//! Error types surfaced by the reader.

use std::io;
use thiserror::Error;

/// Errors that can occur while setting up or iterating a CSV session.
///
/// Every variant is fatal for the session that produced it. End of input is
/// not an error and is reported as `None` by the iterator.
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid or insufficient configuration, detected at construction.
    #[error("incorrect option: {0}")]
    IncorrectOption(String),

    /// Caller-supplied headers disagree with the header found in the file.
    #[error("user-provided headers define {provided} keys but the file header has {in_file}")]
    HeaderSizeMismatch { provided: usize, in_file: usize },

    /// The quote grammar could not resolve a logical record.
    #[error("malformed CSV at record {record} (file line {line}): {message}")]
    MalformedRecord {
        record: usize,
        line: usize,
        message: String,
    },

    /// Invalid UTF-8 was read while byte repair is disabled.
    #[error("invalid UTF-8 at file line {line}; set force_utf8 or a non UTF-8 encoding to repair it")]
    InvalidEncoding { line: usize },

    /// A configured pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, CsvError>;

impl CsvError {
    /// Build a [`CsvError::MalformedRecord`].
    pub(crate) fn malformed(record: usize, line: usize, message: impl Into<String>) -> Self {
        CsvError::MalformedRecord {
            record,
            line,
            message: message.into(),
        }
    }
}
