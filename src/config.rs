//! Reader configuration.
//!
//! A [`Config`] is assembled with the `with_*` builder methods, validated once
//! when a reader is constructed and then shared read-only by every component
//! of the session.

use crate::error::{CsvError, Result};
use crate::streaming::LineEnding;
use crate::value::Value;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Row terminator: an explicit string, or detected from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSeparator {
    /// Scan the whole input once and use the most frequent line ending.
    Auto,
    Explicit(String),
}

impl From<LineEnding> for RowSeparator {
    fn from(ending: LineEnding) -> Self {
        RowSeparator::Explicit(ending.as_str().to_string())
    }
}

impl From<&str> for RowSeparator {
    fn from(s: &str) -> Self {
        RowSeparator::Explicit(s.to_string())
    }
}

/// A column reference: a header key in mapping mode, a position in array mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Name(String),
    Index(usize),
}

impl From<&str> for Column {
    fn from(s: &str) -> Self {
        Column::Name(s.to_string())
    }
}

impl From<String> for Column {
    fn from(s: String) -> Self {
        Column::Name(s)
    }
}

impl From<usize> for Column {
    fn from(i: usize) -> Self {
        Column::Index(i)
    }
}

/// Only/except filter restricting which columns numeric coercion touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnFilter {
    #[default]
    All,
    Only(Vec<Column>),
    Except(Vec<Column>),
}

impl ColumnFilter {
    /// Build an include-only filter.
    pub fn only<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        ColumnFilter::Only(columns.into_iter().map(Into::into).collect())
    }

    /// Build an exclusion filter.
    pub fn except<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        ColumnFilter::Except(columns.into_iter().map(Into::into).collect())
    }

    #[inline]
    pub fn allows_key(&self, key: &str) -> bool {
        self.allows(|c| matches!(c, Column::Name(name) if name == key))
    }

    #[inline]
    pub fn allows_index(&self, index: usize) -> bool {
        self.allows(|c| matches!(c, Column::Index(i) if *i == index))
    }

    fn allows(&self, is_column: impl Fn(&Column) -> bool) -> bool {
        match self {
            ColumnFilter::All => true,
            ColumnFilter::Only(columns) => columns.iter().any(is_column),
            ColumnFilter::Except(columns) => !columns.iter().any(is_column),
        }
    }
}

/// A per-column value converter.
///
/// Any `Fn(Value) -> Value` closure that is `Send + Sync` is a converter.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, value: Value) -> Value;
}

impl<F> ValueConverter for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn convert(&self, value: Value) -> Value {
        self(value)
    }
}

/// Registered converters, looked up by header key or by position.
#[derive(Clone, Default)]
pub struct Converters {
    by_name: FxHashMap<String, Arc<dyn ValueConverter>>,
    by_index: FxHashMap<usize, Arc<dyn ValueConverter>>,
}

impl Converters {
    pub fn insert(&mut self, column: Column, converter: Arc<dyn ValueConverter>) {
        match column {
            Column::Name(name) => {
                self.by_name.insert(name, converter);
            }
            Column::Index(i) => {
                self.by_index.insert(i, converter);
            }
        }
    }

    #[inline]
    pub fn for_key(&self, key: &str) -> Option<&dyn ValueConverter> {
        self.by_name.get(key).map(|c| c.as_ref())
    }

    #[inline]
    pub fn for_index(&self, index: usize) -> Option<&dyn ValueConverter> {
        self.by_index.get(&index).map(|c| c.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_index.is_empty()
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("by_name", &self.by_name.keys().collect::<Vec<_>>())
            .field("by_index", &self.by_index.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Complete option set for one parse session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Field delimiter (ASCII).
    pub delimiter: u8,
    /// Quote character (ASCII).
    pub quote: u8,
    pub row_separator: RowSeparator,
    /// Always split on the raw delimiter, ignoring quoting.
    pub force_simple_split: bool,
    /// Lines matching this pattern are skipped (and stripped from the header line).
    pub comment_pattern: Option<Regex>,
    /// Physical lines to drop before anything is interpreted.
    pub skip_lines: usize,
    pub headers_in_file: bool,
    pub user_headers: Option<Vec<String>>,
    /// Removed from the raw header text before it is split.
    pub strip_chars_from_headers: Option<Regex>,
    /// Header key to replacement; `None` or an empty replacement removes the column.
    pub key_mapping: Option<FxHashMap<String, Option<String>>>,
    pub remove_unmapped_keys: bool,
    pub keep_original_headers: bool,
    pub downcase_header: bool,
    pub strip_whitespace: bool,
    /// Use plain text keys instead of interned symbols.
    pub strings_as_keys: bool,
    pub remove_empty_values: bool,
    pub remove_zero_values: bool,
    pub remove_values_matching: Option<Regex>,
    /// Suppress rows left empty after removals.
    pub remove_empty_rows: bool,
    pub convert_values_to_numeric: bool,
    pub numeric_filter: ColumnFilter,
    pub value_converters: Converters,
    pub chunk_size: Option<usize>,
    pub file_encoding: String,
    pub force_utf8: bool,
    /// Replaces each invalid byte sequence when repair is active.
    pub invalid_byte_replacement: String,
    /// Emit positional rows instead of key/value mappings.
    pub parse_to_arrays: bool,
    /// Emit a progress event for every physical line read.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            row_separator: RowSeparator::Explicit("\n".to_string()),
            force_simple_split: false,
            comment_pattern: Regex::new("^#").ok(),
            skip_lines: 0,
            headers_in_file: true,
            user_headers: None,
            strip_chars_from_headers: None,
            key_mapping: None,
            remove_unmapped_keys: false,
            keep_original_headers: false,
            downcase_header: true,
            strip_whitespace: true,
            strings_as_keys: false,
            remove_empty_values: true,
            remove_zero_values: false,
            remove_values_matching: None,
            remove_empty_rows: true,
            convert_values_to_numeric: true,
            numeric_filter: ColumnFilter::All,
            value_converters: Converters::default(),
            chunk_size: None,
            file_encoding: "utf-8".to_string(),
            force_utf8: false,
            invalid_byte_replacement: String::new(),
            parse_to_arrays: false,
            verbose: false,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_row_separator(mut self, separator: impl Into<RowSeparator>) -> Self {
        self.row_separator = separator.into();
        self
    }

    pub fn with_force_simple_split(mut self, enabled: bool) -> Self {
        self.force_simple_split = enabled;
        self
    }

    /// Set or clear the comment-line pattern.
    pub fn with_comment_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.comment_pattern = pattern;
        self
    }

    pub fn with_skip_lines(mut self, n: usize) -> Self {
        self.skip_lines = n;
        self
    }

    pub fn with_headers_in_file(mut self, enabled: bool) -> Self {
        self.headers_in_file = enabled;
        self
    }

    /// Use these keys verbatim instead of normalizing the file header.
    pub fn with_user_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_strip_chars_from_headers(mut self, pattern: Regex) -> Self {
        self.strip_chars_from_headers = Some(pattern);
        self
    }

    /// Remap header keys. Mapping a key to `None` (or `""`) drops the column.
    pub fn with_key_mapping<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.key_mapping = Some(
            mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        );
        self
    }

    pub fn with_remove_unmapped_keys(mut self, enabled: bool) -> Self {
        self.remove_unmapped_keys = enabled;
        self
    }

    pub fn with_keep_original_headers(mut self, enabled: bool) -> Self {
        self.keep_original_headers = enabled;
        self
    }

    pub fn with_downcase_header(mut self, enabled: bool) -> Self {
        self.downcase_header = enabled;
        self
    }

    pub fn with_strip_whitespace(mut self, enabled: bool) -> Self {
        self.strip_whitespace = enabled;
        self
    }

    pub fn with_strings_as_keys(mut self, enabled: bool) -> Self {
        self.strings_as_keys = enabled;
        self
    }

    pub fn with_remove_empty_values(mut self, enabled: bool) -> Self {
        self.remove_empty_values = enabled;
        self
    }

    pub fn with_remove_zero_values(mut self, enabled: bool) -> Self {
        self.remove_zero_values = enabled;
        self
    }

    pub fn with_remove_values_matching(mut self, pattern: Regex) -> Self {
        self.remove_values_matching = Some(pattern);
        self
    }

    pub fn with_remove_empty_rows(mut self, enabled: bool) -> Self {
        self.remove_empty_rows = enabled;
        self
    }

    pub fn with_convert_values_to_numeric(mut self, enabled: bool) -> Self {
        self.convert_values_to_numeric = enabled;
        self
    }

    /// Restrict numeric coercion with an only/except filter.
    pub fn with_numeric_filter(mut self, filter: ColumnFilter) -> Self {
        self.numeric_filter = filter;
        self
    }

    /// Register a converter for a column (header key or position).
    pub fn with_converter<C>(mut self, column: impl Into<Column>, converter: C) -> Self
    where
        C: ValueConverter + 'static,
    {
        self.value_converters
            .insert(column.into(), Arc::new(converter));
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    pub fn with_file_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.file_encoding = encoding.into();
        self
    }

    pub fn with_force_utf8(mut self, enabled: bool) -> Self {
        self.force_utf8 = enabled;
        self
    }

    pub fn with_invalid_byte_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.invalid_byte_replacement = replacement.into();
        self
    }

    pub fn with_parse_to_arrays(mut self, enabled: bool) -> Self {
        self.parse_to_arrays = enabled;
        self
    }

    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Whether invalid byte sequences are replaced rather than rejected.
    #[inline]
    pub fn repairs_encoding(&self) -> bool {
        self.force_utf8 || !self.file_encoding.to_ascii_lowercase().contains("utf-8")
    }

    /// Whether keys are kept as text rather than interned symbols.
    #[inline]
    pub fn keys_as_text(&self) -> bool {
        self.strings_as_keys || self.keep_original_headers
    }

    /// Check option consistency. Called once when a reader is built.
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || !self.quote.is_ascii() {
            return Err(CsvError::IncorrectOption(
                "delimiter and quote character must be ASCII".to_string(),
            ));
        }
        if self.delimiter == self.quote {
            return Err(CsvError::IncorrectOption(format!(
                "delimiter and quote character are both {:?}",
                self.delimiter as char
            )));
        }

        let separator = match &self.row_separator {
            RowSeparator::Auto => "\r\n",
            RowSeparator::Explicit(s) if s.is_empty() => {
                return Err(CsvError::IncorrectOption(
                    "row separator must be a non-empty string or auto".to_string(),
                ));
            }
            RowSeparator::Explicit(s) => s.as_str(),
        };
        for (name, byte) in [("delimiter", self.delimiter), ("quote character", self.quote)] {
            if separator.as_bytes().contains(&byte) {
                return Err(CsvError::IncorrectOption(format!(
                    "{} {:?} is part of the row separator",
                    name, byte as char
                )));
            }
        }

        if self.chunk_size == Some(0) {
            return Err(CsvError::IncorrectOption(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
