// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! lazy-csv: streaming, quote-aware CSV reader
//!
//! Turns a CSV byte stream into a lazy sequence of rows, either key/value
//! mappings keyed by the (normalized) header or positional arrays.
//!
//! # Features
//!
//! - **Streaming I/O**: one logical record is read per pull, so memory stays
//!   bounded by the longest record
//! - **Quoted fields across lines**: records whose quoted fields contain the
//!   row terminator are reassembled before splitting
//! - **Line ending detection**: `\n`, `\r` or `\r\n`, ignoring terminators
//!   inside quotes
//! - **Value pipeline**: empty/zero/pattern removal, numeric coercion with
//!   column filters, and per-column converters
//!
//! # Example
//!
//! ```rust,no_run
//! use lazy_csv::{Config, CsvReader};
//!
//! let reader = CsvReader::from_path("people.csv", Config::new()).unwrap();
//! for row in reader {
//!     let row = row.unwrap();
//!     println!("{:?}", row.get("name"));
//! }
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod header;
pub mod reader;
pub mod streaming;
pub mod transform;
pub mod value;

// Re-export commonly used types
pub use assembler::ParseState;
pub use config::{Column, ColumnFilter, Config, RowSeparator, ValueConverter};
pub use error::{CsvError, Result};
pub use header::Header;
pub use reader::{Chunks, CsvReader, Input, Status};
pub use streaming::LineEnding;
pub use value::{Key, Row, Value};

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Read every emitted row from an open handle.
///
/// The handle is not closed; pass `&mut handle` to keep using it.
pub fn process<R: Read + Seek>(reader: R, config: Config) -> Result<Vec<Row>> {
    CsvReader::from_reader(reader, config)?.collect()
}

/// Read every emitted row from a file.
pub fn process_path<P: AsRef<Path>>(path: P, config: Config) -> Result<Vec<Row>> {
    CsvReader::<File>::from_path(path, config)?.collect()
}

/// Read every emitted row grouped into batches of `config.chunk_size`.
///
/// Without a chunk size all rows land in a single batch.
pub fn process_chunks<R: Read + Seek>(reader: R, config: Config) -> Result<Vec<Vec<Row>>> {
    let size = config.chunk_size.unwrap_or(usize::MAX);
    CsvReader::from_reader(reader, config)?.chunks(size).collect()
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{Column, ColumnFilter, Config, RowSeparator};
    pub use crate::error::{CsvError, Result};
    pub use crate::reader::{CsvReader, Input};
    pub use crate::value::{Key, Row, Value};
    pub use crate::{process, process_chunks, process_path};
}
