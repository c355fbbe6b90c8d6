//! Streaming building blocks shared by the record assembler.
//!
//! This module provides the pieces that work directly on the byte stream:
//! - Line ending detection
//! - Terminator-aware physical line reading
//! - Quote-aware field splitting
//! - Literal classification scans
//! - Row output formatting for the command line tool
//!
//! Nothing here buffers more than one logical record at a time.

pub mod buffers;
pub mod line_ending;
pub mod lines;
pub mod output;
pub mod parsing;
pub mod split;

pub use line_ending::{count_line_endings, detect_line_ending, LineEnding, LineEndingCounts};
pub use lines::{decode_line, LineReader};
pub use output::RowWriter;
pub use parsing::{classify_number, is_blank, is_zero_literal, NumberLiteral};
pub use split::{check_quote_grammar, FieldSplitter, QuoteError};
