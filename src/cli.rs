//! Command line arguments
//!
//! clap definitions plus the checks and conversions that turn them into run
//! settings.

use chrono::{DateTime, Local};
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Settings;
use crate::driver::OutputMode;
use crate::error::{Result, Xml2CsvError};
use crate::filter::RowFilter;
use crate::pattern::PatternMatcher;
use crate::resolver::{resolve_inputs, resolve_single_file};
use crate::runlog::LogEntry;

/// xml2csv command line
#[derive(Parser, Debug)]
#[command(
    name = "xml2csv",
    version,
    about = "GAS INVOICE XML TO CSV CONVERTER - flattens gas invoice XML flows into CSV",
    long_about = r#"
GAS INVOICE XML TO CSV CONVERTER
================================

Converts gas-utility invoice XML flows into semicolon-delimited CSV files,
one row per tariff component amount, with the flow header repeated on every
row. Every run writes an audit log with one line per document.

Examples:
  xml2csv file.xml                          # single file
  xml2csv file.xml -o output/               # custom output folder
  xml2csv -f xml_folder/                    # folder
  xml2csv -f xml_folder/ -r                 # recursive search
  xml2csv -f xml_folder/ -1                 # one consolidated file
  xml2csv -f xml_folder/ -1 -s 100000       # consolidated, split every 100000 rows
  xml2csv -f xml_folder/ -g "TAU1"          # keep rows mentioning TAU1
  xml2csv -f xml_folder/ -g "TAU1,TAU2" -r  # OR filter, recursive
"#
)]
#[command(group(ArgGroup::new("input").required(true).args(["file_xml", "folder"])))]
pub struct Args {
    /// Single XML file to convert
    pub file_xml: Option<PathBuf>,

    /// Folder containing the XML files to convert
    #[arg(short, long)]
    pub folder: Option<PathBuf>,

    /// Output folder (default: xml2csv_output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write one consolidated CSV with the rows of every document
    #[arg(short = '1', long)]
    pub onefile: bool,

    /// Split the consolidated CSV every ROWS rows (default: 500000, only with --onefile)
    #[arg(short = 's', long = "split-csv", value_name = "ROWS", value_parser = parse_row_count)]
    pub split_csv: Option<usize>,

    /// Keep rows containing FILTER (case-insensitive); comma separated terms are OR-ed
    #[arg(short, long, value_name = "FILTER")]
    pub grep: Option<String>,

    /// Search XML files in subfolders too
    #[arg(short, long)]
    pub recursive: bool,

    /// Accepted file name pattern (glob, default: *.xml)
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Folder for run logs (default: xml2csv_logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only list the documents that would be converted
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_row_count(value: &str) -> std::result::Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("row count must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Args {
    /// Reject invalid option combinations
    pub fn validate(&self) -> Result<()> {
        if self.split_csv.is_some() && !self.onefile {
            return Err(Xml2CsvError::InvalidOptions {
                reason: "--split-csv can only be used with --onefile".to_string(),
            });
        }
        Ok(())
    }

    /// The file or folder given on the command line
    pub fn input_path(&self) -> &Path {
        self.file_xml
            .as_deref()
            .or(self.folder.as_deref())
            .unwrap_or(Path::new("."))
    }

    /// Settings file (or defaults) with command line overrides applied
    pub fn settings(&self) -> Result<Settings> {
        let settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        Ok(settings
            .with_output_dir(self.output.clone())
            .with_log_dir(self.log_dir.clone())
            .with_input_pattern(self.pattern.clone()))
    }

    /// Output mode; `--onefile` without `--split-csv` uses the default threshold
    pub fn output_mode(&self, settings: &Settings) -> OutputMode {
        if self.onefile {
            OutputMode::Consolidated {
                split_rows: Some(self.split_csv.unwrap_or(settings.default_split_rows)),
            }
        } else {
            OutputMode::PerFile
        }
    }

    /// Row filter from `--grep`
    pub fn row_filter(&self) -> RowFilter {
        RowFilter::new(self.grep.as_deref())
    }

    /// Failed run log entry for an error raised before any document is read
    pub fn input_error_entry(&self, started: DateTime<Local>, error: &Xml2CsvError) -> LogEntry {
        LogEntry::failure(
            self.input_path().display().to_string(),
            String::new(),
            started,
            Duration::ZERO,
            error.to_string(),
        )
    }

    /// Resolve the documents to convert
    pub fn resolve_inputs(&self, matcher: &PatternMatcher) -> Result<Vec<PathBuf>> {
        // The positional argument always names one document, never a folder
        if let Some(file) = &self.file_xml {
            if !file.exists() {
                return Err(Xml2CsvError::InputNotFound { path: file.clone() });
            }
            return resolve_single_file(file, matcher).map(|path| vec![path]);
        }

        if let Some(folder) = &self.folder {
            if !folder.is_dir() {
                return Err(Xml2CsvError::NotADirectory {
                    path: folder.clone(),
                });
            }
        }
        resolve_inputs(self.input_path(), self.recursive, matcher)
    }
}
