//! xml2csv - GAS INVOICE XML TO CSV CONVERTER
//!
//! Converts gas-utility invoice XML flows into flat, semicolon-delimited CSV.
//! Each document is flattened header → delivery point (PDR) → amount, with
//! the document fields repeated on every row.
//!
//! # Features
//!
//! - **Per-file or consolidated output**: one CSV per document, or one CSV for
//!   the whole batch, optionally split into numbered parts by row count
//! - **Row filter**: case-insensitive OR substring filter over whole rows
//! - **Recursive input**: single file, folder, or folder tree
//! - **Run log**: one CSV audit line per document, one log file per run
//! - **Failure isolation**: a broken document is logged and skipped
//!
//! # Examples
//!
//! ```bash
//! # Single file
//! xml2csv flow.xml
//!
//! # Folder tree into one file, split every 100000 rows
//! xml2csv -f flows/ -r -1 -s 100000
//!
//! # Only rows mentioning TAU1 or TAU2
//! xml2csv -f flows/ -g "TAU1,TAU2"
//! ```

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod filter;
pub mod flatten;
pub mod pattern;
pub mod processor;
pub mod record;
pub mod resolver;
pub mod runlog;
pub mod stats;
pub mod writer;

// Re-exports for convenient access
pub use cli::Args;
pub use config::{Settings, TagNames};
pub use driver::{convert, OutputMode, RunOptions, RunReport};
pub use error::{Result, Xml2CsvError};
pub use filter::RowFilter;
pub use flatten::{flatten_document, flatten_str};
pub use pattern::PatternMatcher;
pub use processor::{process_file, ProcessOptions, ProcessResult};
pub use record::{FlatRecord, COLUMNS};
pub use resolver::resolve_inputs;
pub use runlog::{LogEntry, RunLog};
pub use stats::{format_bytes, Statistics};
