//! Run settings
//!
//! Immutable configuration handed to every stage of a run. Defaults match the
//! gas invoice flow layout; a JSON settings file can override any subset.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Result, Xml2CsvError};

/// Default output folder, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "xml2csv_output";

/// Default log folder, relative to the working directory
pub const DEFAULT_LOG_DIR: &str = "xml2csv_logs";

/// Row threshold applied to `--onefile` when `--split-csv` is not given
pub const DEFAULT_SPLIT_ROWS: usize = 500_000;

/// Element names read from a source document
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TagNames {
    pub header: String,
    pub creation_date: String,
    pub sequence_number: String,
    pub sender: String,
    pub legal_name: String,
    pub vat_number: String,
    pub invoice: String,
    pub invoice_number: String,
    pub issue_date: String,
    pub delivery_points: String,
    pub delivery_point: String,
    pub pdr_code: String,
    pub remi_pool: String,
    pub amounts: String,
    pub amount: String,
    pub period_start: String,
    pub period_end: String,
    pub movement_type: String,
    pub tariff_component: String,
    pub quota: String,
    pub tier: String,
    pub quantity: String,
    pub taxable: String,
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            header: "TestataFlusso".into(),
            creation_date: "DataCreazione".into(),
            sequence_number: "NumeroSequenza".into(),
            sender: "Mittente".into(),
            legal_name: "RagioneSociale".into(),
            vat_number: "PartitaIVA".into(),
            invoice: "Fattura".into(),
            invoice_number: "Numero".into(),
            issue_date: "DataEmissione".into(),
            delivery_points: "DettagliPDR".into(),
            delivery_point: "DettaglioPDR".into(),
            pdr_code: "CodicePDR".into(),
            remi_pool: "REMIPool".into(),
            amounts: "Importi".into(),
            amount: "Importo".into(),
            period_start: "DataInizio".into(),
            period_end: "DataFine".into(),
            movement_type: "TipoMovimento".into(),
            tariff_component: "ComponenteTariffaria".into(),
            quota: "Quota".into(),
            tier: "Scaglione".into(),
            quantity: "Quantita".into(),
            taxable: "Imponibile".into(),
        }
    }
}

/// Settings shared by the resolver, flattener, writer and driver
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Destination folder for CSV files
    pub output_dir: PathBuf,
    /// Folder holding one log file per run
    pub log_dir: PathBuf,
    /// Consolidated row threshold used when none is given explicitly
    pub default_split_rows: usize,
    /// Accepted input file name pattern (case-insensitive glob)
    pub input_pattern: String,
    /// Field delimiter for CSV and log output
    pub delimiter: char,
    /// Files at or above this size are memory mapped
    pub mmap_threshold: u64,
    pub tags: TagNames,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            default_split_rows: DEFAULT_SPLIT_ROWS,
            input_pattern: "*.xml".into(),
            delimiter: ';',
            mmap_threshold: 10 * 1024 * 1024, // 10MB
            tags: TagNames::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Xml2CsvError::SettingsError {
            file: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| Xml2CsvError::SettingsError {
            file: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Output folder override
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self
    }

    /// Log folder override
    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = log_dir {
            self.log_dir = dir;
        }
        self
    }

    /// Input pattern override
    pub fn with_input_pattern(mut self, pattern: Option<String>) -> Self {
        if let Some(pattern) = pattern {
            self.input_pattern = pattern;
        }
        self
    }
}
