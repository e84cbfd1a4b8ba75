//! Error type definitions
//!
//! Every error xml2csv can report, from input validation to per-document failures.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by xml2csv
#[derive(Error, Debug)]
pub enum Xml2CsvError {
    /// Input path does not exist
    #[error("input path not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input path exists but is neither a file nor a directory
    #[error("input path is neither a file nor a directory: {path}")]
    UnsupportedInput { path: PathBuf },

    /// `--folder` given something other than a directory
    #[error("folder not found: {path}")]
    NotADirectory { path: PathBuf },

    /// Input file name does not match the accepted pattern
    #[error("{path} is not a valid XML file (expected {expected})")]
    WrongExtension { path: PathBuf, expected: String },

    /// Invalid combination of command line options
    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },

    /// Invalid file name pattern
    #[error("invalid pattern: {pattern}")]
    InvalidPattern { pattern: String },

    /// No candidate documents found
    #[error("no XML files found in {path}")]
    NoFilesFound { path: PathBuf },

    /// Failed to open or read a document
    #[error("cannot open file ({file}): {reason}")]
    FileOpenError { file: PathBuf, reason: String },

    /// Malformed XML or non UTF-8 content
    #[error("XML parse failed ({file}): {reason}")]
    ParseError { file: PathBuf, reason: String },

    /// A field value cannot be written without quoting
    #[error("field {column} contains the delimiter or a line break: {value:?}")]
    UnsafeField { column: &'static str, value: String },

    /// Failed to write an output or log file
    #[error("write failed ({file}): {reason}")]
    WriteError { file: PathBuf, reason: String },

    /// Failed to create a directory
    #[error("cannot create directory ({path}): {reason}")]
    CreateDirError { path: PathBuf, reason: String },

    /// Failed to load the settings file
    #[error("cannot load settings ({file}): {reason}")]
    SettingsError { file: PathBuf, reason: String },
}

/// xml2csv result alias
pub type Result<T> = std::result::Result<T, Xml2CsvError>;
