//! lazycsv: streaming CSV reader
//!
//! Usage: lazycsv <COMMAND> [OPTIONS] [INPUT]

use clap::{Args, Parser, Subcommand};
use regex::Regex;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use lazy_csv::streaming::buffers::input_buffer_size;
use lazy_csv::streaming::{count_line_endings, RowWriter};
use lazy_csv::{Column, ColumnFilter, Config, CsvError, CsvReader, Input, RowSeparator};

#[derive(Parser)]
#[command(name = "lazycsv")]
#[command(version)]
#[command(about = "Streaming, quote-aware CSV reader", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every emitted row, one per line
    Parse {
        #[command(flatten)]
        opts: ParseOpts,
    },

    /// Print the detected line ending and the terminator counts
    Detect {
        /// Input CSV file (use - for stdin)
        input: Option<PathBuf>,

        /// Quote character
        #[arg(short, long, default_value = "\"")]
        quote: char,
    },

    /// Print the resolved header keys, one per line
    Headers {
        #[command(flatten)]
        opts: ParseOpts,
    },

    /// Count emitted rows (and chunks, with --chunk-size)
    Count {
        #[command(flatten)]
        opts: ParseOpts,
    },
}

/// Options shared by every command that parses rows.
#[derive(Args)]
struct ParseOpts {
    /// Input CSV file (use - for stdin)
    input: Option<PathBuf>,

    /// Field delimiter
    #[arg(short, long, default_value = ",")]
    delimiter: char,

    /// Quote character
    #[arg(short, long, default_value = "\"")]
    quote: char,

    /// Row separator, or "auto" to detect it (\n, \r and \t escapes accepted)
    #[arg(long, default_value = "\\n")]
    row_sep: String,

    /// Split on the raw delimiter, ignoring quotes
    #[arg(long)]
    force_simple_split: bool,

    /// Pattern marking comment lines
    #[arg(long, default_value = "^#")]
    comment: String,

    /// Do not treat any line as a comment
    #[arg(long, conflicts_with = "comment")]
    no_comments: bool,

    /// Physical lines to drop before the header
    #[arg(long, default_value = "0")]
    skip_lines: usize,

    /// The input has no header line
    #[arg(long)]
    no_header: bool,

    /// Header keys to use instead of the file header (comma separated)
    #[arg(long, value_delimiter = ',')]
    headers: Vec<String>,

    /// Pattern removed from the raw header line before splitting
    #[arg(long)]
    strip_chars_from_headers: Option<String>,

    /// Rename a header key (old=new); an empty new name removes the column
    #[arg(long = "map", value_name = "OLD=NEW")]
    key_mapping: Vec<String>,

    /// Drop columns not named in --map
    #[arg(long)]
    remove_unmapped: bool,

    /// Keep header names as written (no case or separator changes)
    #[arg(long)]
    keep_original_headers: bool,

    /// Do not lowercase header names
    #[arg(long)]
    keep_case: bool,

    /// Do not trim whitespace around fields
    #[arg(long)]
    no_strip: bool,

    /// Keep values that are empty or missing
    #[arg(long)]
    keep_empty_values: bool,

    /// Drop zero values (0, 0.0, 00.000)
    #[arg(long)]
    remove_zero_values: bool,

    /// Drop values matching this pattern
    #[arg(long)]
    remove_matching: Option<String>,

    /// Emit rows that end up empty
    #[arg(long)]
    keep_empty_rows: bool,

    /// Keep numbers as text
    #[arg(long)]
    no_numeric: bool,

    /// Convert numbers only in these columns (comma separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "except")]
    only: Vec<String>,

    /// Convert numbers in all columns but these (comma separated)
    #[arg(long, value_delimiter = ',')]
    except: Vec<String>,

    /// Input encoding name; anything but UTF-8 enables byte repair
    #[arg(long, default_value = "utf-8")]
    encoding: String,

    /// Replace invalid UTF-8 instead of failing
    #[arg(long)]
    force_utf8: bool,

    /// Replacement text for invalid byte sequences
    #[arg(long, default_value = "")]
    replacement: String,

    /// Emit positional rows instead of key=value pairs
    #[arg(long)]
    arrays: bool,

    /// Group rows into batches of N
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Log a progress event for every physical line
    #[arg(long)]
    progress: bool,

    /// Use smaller I/O buffers
    #[arg(long)]
    low_memory: bool,
}

impl ParseOpts {
    fn to_config(&self) -> Result<Config, CsvError> {
        let row_separator = if self.row_sep.eq_ignore_ascii_case("auto") {
            RowSeparator::Auto
        } else {
            RowSeparator::Explicit(unescape(&self.row_sep))
        };
        let comment_pattern = if self.no_comments {
            None
        } else {
            Some(Regex::new(&self.comment)?)
        };

        let mut config = Config::new()
            .with_delimiter(ascii_byte("delimiter", self.delimiter)?)
            .with_quote(ascii_byte("quote", self.quote)?)
            .with_row_separator(row_separator)
            .with_force_simple_split(self.force_simple_split)
            .with_comment_pattern(comment_pattern)
            .with_skip_lines(self.skip_lines)
            .with_headers_in_file(!self.no_header)
            .with_remove_unmapped_keys(self.remove_unmapped)
            .with_keep_original_headers(self.keep_original_headers)
            .with_downcase_header(!self.keep_case)
            .with_strip_whitespace(!self.no_strip)
            .with_remove_empty_values(!self.keep_empty_values)
            .with_remove_zero_values(self.remove_zero_values)
            .with_remove_empty_rows(!self.keep_empty_rows)
            .with_convert_values_to_numeric(!self.no_numeric)
            .with_file_encoding(self.encoding.as_str())
            .with_force_utf8(self.force_utf8)
            .with_invalid_byte_replacement(self.replacement.as_str())
            .with_parse_to_arrays(self.arrays)
            .with_verbose(self.progress);

        if !self.headers.is_empty() {
            config = config.with_user_headers(self.headers.iter().map(String::as_str));
        }
        if let Some(pattern) = &self.strip_chars_from_headers {
            config = config.with_strip_chars_from_headers(Regex::new(pattern)?);
        }
        if let Some(pattern) = &self.remove_matching {
            config = config.with_remove_values_matching(Regex::new(pattern)?);
        }
        if !self.key_mapping.is_empty() {
            let mut mapping = Vec::with_capacity(self.key_mapping.len());
            for entry in &self.key_mapping {
                let (from, to) = entry.split_once('=').ok_or_else(|| {
                    CsvError::IncorrectOption(format!("--map expects OLD=NEW, got {:?}", entry))
                })?;
                mapping.push((from, (!to.is_empty()).then_some(to)));
            }
            config = config.with_key_mapping(mapping);
        }
        if !self.only.is_empty() {
            config = config.with_numeric_filter(ColumnFilter::Only(self.columns(&self.only)));
        } else if !self.except.is_empty() {
            config = config.with_numeric_filter(ColumnFilter::Except(self.columns(&self.except)));
        }
        if let Some(size) = self.chunk_size {
            config = config.with_chunk_size(size);
        }
        Ok(config)
    }

    /// Column names, or indices when rows are positional.
    fn columns(&self, names: &[String]) -> Vec<Column> {
        names
            .iter()
            .map(|name| match name.parse::<usize>() {
                Ok(index) if self.arrays => Column::Index(index),
                _ => Column::Name(name.clone()),
            })
            .collect()
    }

    fn open(&self) -> Result<CsvReader<Cursor<Vec<u8>>>, CsvError> {
        let config = self.to_config()?;
        let capacity = input_buffer_size(self.low_memory);
        CsvReader::open(input(self.input.as_ref())?, config, capacity)
    }
}

/// Resolve the input argument; stdin is buffered so it can be rewound.
fn input(path: Option<&PathBuf>) -> Result<Input<Cursor<Vec<u8>>>, CsvError> {
    match path {
        Some(path) if path.to_string_lossy() != "-" => Ok(Input::Path(path.clone())),
        _ => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            Ok(Input::Handle(Cursor::new(buf)))
        }
    }
}

fn ascii_byte(name: &str, c: char) -> Result<u8, CsvError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| CsvError::IncorrectOption(format!("{} must be an ASCII character", name)))
}

fn unescape(s: &str) -> String {
    s.replace("\\r", "\r").replace("\\n", "\n").replace("\\t", "\t")
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,lazy_csv={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse { opts } => run_parse(&opts),
        Commands::Detect { input, quote } => run_detect(input, quote),
        Commands::Headers { opts } => run_headers(&opts),
        Commands::Count { opts } => run_count(&opts),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_parse(opts: &ParseOpts) -> Result<(), CsvError> {
    let reader = opts.open()?;
    let stdout = io::stdout();
    let mut output = RowWriter::new(stdout.lock());

    match reader.config().chunk_size {
        Some(size) => {
            for (i, chunk) in reader.chunks(size).enumerate() {
                if i > 0 {
                    output.write_line("")?;
                }
                for row in chunk? {
                    output.write_row(&row)?;
                }
            }
        }
        None => {
            for row in reader {
                output.write_row(&row?)?;
            }
        }
    }
    output.flush()
}

fn run_detect(input_path: Option<PathBuf>, quote: char) -> Result<(), CsvError> {
    let quote = ascii_byte("quote", quote)?;
    let counts = match input(input_path.as_ref())? {
        Input::Path(path) => count_line_endings(&mut BufReader::new(File::open(path)?), quote)?,
        Input::Handle(mut cursor) => count_line_endings(&mut cursor, quote)?,
    };

    let stdout = io::stdout();
    let mut output = RowWriter::new(stdout.lock());
    output.write_line(&format!("{}\t{}", counts.dominant(), counts))?;
    output.flush()
}

fn run_headers(opts: &ParseOpts) -> Result<(), CsvError> {
    let reader = opts.open()?;
    let stdout = io::stdout();
    let mut output = RowWriter::new(stdout.lock());
    output.write_keys(reader.header().keys())?;
    output.flush()
}

fn run_count(opts: &ParseOpts) -> Result<(), CsvError> {
    let reader = opts.open()?;
    let (rows, chunks) = match reader.config().chunk_size {
        Some(size) => {
            let mut rows = 0;
            let mut chunks = 0;
            for chunk in reader.chunks(size) {
                rows += chunk?.len();
                chunks += 1;
            }
            (rows, Some(chunks))
        }
        None => {
            let mut rows = 0;
            for row in reader {
                row?;
                rows += 1;
            }
            (rows, None)
        }
    };

    let stdout = io::stdout();
    let mut output = RowWriter::new(stdout.lock());
    match chunks {
        Some(chunks) => output.write_line(&format!("{}\t{}", rows, chunks))?,
        None => output.write_line(&rows.to_string())?,
    }
    output.flush()
}
