//! Document processing
//!
//! Reads one invoice document, flattens it and applies the row filter. The
//! outcome is returned as a value, never raised, so a batch always continues.

use encoding_rs::{Encoding, UTF_8};
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::{Settings, TagNames};
use crate::error::{Result, Xml2CsvError};
use crate::filter::RowFilter;
use crate::flatten::flatten_str;
use crate::record::FlatRecord;

/// Rows produced by one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentRows {
    /// Rows kept after filtering
    pub rows: Vec<FlatRecord>,
    /// Rows produced by the flattener before filtering
    pub extracted: usize,
}

/// Outcome of processing one document
#[derive(Debug)]
pub struct ProcessResult {
    /// Processed file path
    pub path: PathBuf,
    /// Source file size
    pub file_size: u64,
    /// Rows on success, the failure reason otherwise
    pub outcome: Result<DocumentRows>,
}

impl ProcessResult {
    /// File name shown in logs and in the `nome_file` column
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Failure text, empty on success
    pub fn error_message(&self) -> String {
        match &self.outcome {
            Ok(_) => String::new(),
            Err(e) => e.to_string(),
        }
    }
}

/// Document processing options
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Element names to read
    pub tags: TagNames,
    /// Row content filter
    pub filter: RowFilter,
    /// Output delimiter every value must be free of
    pub delimiter: char,
    /// Large file threshold (memory mapping at or above it)
    pub mmap_threshold: u64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl ProcessOptions {
    /// Options derived from run settings, with no filter
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tags: settings.tags.clone(),
            filter: RowFilter::default(),
            delimiter: settings.delimiter,
            mmap_threshold: settings.mmap_threshold,
        }
    }

    /// Set the row filter
    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the memory mapping threshold
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }
}

/// Process a single document
pub fn process_file(path: PathBuf, options: &ProcessOptions) -> ProcessResult {
    let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let outcome = process_file_internal(&path, file_size, options);

    if let Err(ref e) = outcome {
        debug!("{} failed: {e}", path.display());
    }

    ProcessResult {
        path,
        file_size,
        outcome,
    }
}

fn process_file_internal(path: &Path, file_size: u64, options: &ProcessOptions) -> Result<DocumentRows> {
    let text = if file_size >= options.mmap_threshold {
        read_with_mmap(path)?
    } else {
        read_with_buffer(path)?
    };

    let rows = flatten_str(&text, &display_name(path), &options.tags).map_err(|e| {
        Xml2CsvError::ParseError {
            file: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let extracted = rows.len();
    let rows = options.filter.apply(rows);

    for row in &rows {
        row.ensure_writable(options.delimiter)?;
    }

    debug!("{}: {}/{} rows kept", path.display(), rows.len(), extracted);
    Ok(DocumentRows { rows, extracted })
}

fn read_with_buffer(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Xml2CsvError::FileOpenError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    decode_document(&bytes, path)
}

/// Memory mapped read for large documents
fn read_with_mmap(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Xml2CsvError::FileOpenError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mmap = unsafe {
        Mmap::map(&file).map_err(|e| Xml2CsvError::FileOpenError {
            file: path.to_path_buf(),
            reason: format!("memory map failed: {}", e),
        })?
    };

    decode_document(&mmap, path)
}

/// Decode raw bytes using the BOM, then the XML declaration, then UTF-8.
pub fn decode_document(bytes: &[u8], path: &Path) -> Result<String> {
    let encoding = declared_encoding(bytes).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(bytes);

    if had_errors {
        return Err(Xml2CsvError::ParseError {
            file: path.to_path_buf(),
            reason: format!("invalid {} byte sequence", used.name()),
        });
    }

    Ok(text.into_owned())
}

/// Encoding named in the XML declaration, if any
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let declaration = head.split("?>").next()?;
    if !declaration.contains("<?xml") {
        return None;
    }

    let label = encoding_label(declaration)?;

    // A declaration readable as ASCII rules out UTF-16 without a BOM
    Encoding::for_label(label.trim().as_bytes()).map(|e| e.output_encoding())
}

/// Quoted value of the `encoding` pseudo-attribute, whitespace allowed around `=`
fn encoding_label(declaration: &str) -> Option<&str> {
    let (_, rest) = declaration.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|end| &value[..end])
}

/// File name component of a path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DOC: &str = "<F><DettagliPDR>\
        <DettaglioPDR><CodicePDR>P1</CodicePDR><Importi>\
        <Importo><ComponenteTariffaria>TAU1</ComponenteTariffaria></Importo>\
        <Importo><ComponenteTariffaria>UG2</ComponenteTariffaria></Importo>\
        </Importi></DettaglioPDR></DettagliPDR></F>";

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_process_valid_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "flow.xml", DOC.as_bytes());

        let result = process_file(path, &ProcessOptions::default());
        assert!(result.is_success());
        assert_eq!(result.file_name(), "flow.xml");
        assert_eq!(result.error_message(), "");

        let rows = result.outcome.unwrap();
        assert_eq!(rows.extracted, 2);
        assert_eq!(rows.rows.len(), 2);
        assert_eq!(rows.rows[0].context.file_name, "flow.xml");
    }

    #[test]
    fn test_process_applies_filter() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "flow.xml", DOC.as_bytes());

        let options = ProcessOptions::default().with_filter(RowFilter::new(Some("ug2")));
        let rows = process_file(path, &options).outcome.unwrap();
        assert_eq!(rows.extracted, 2);
        assert_eq!(rows.rows.len(), 1);
        assert_eq!(rows.rows[0].amount.tariff_component, "UG2");
    }

    #[test]
    fn test_process_malformed_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "bad.xml", b"<F><Fattura></F>");

        let result = process_file(path, &ProcessOptions::default());
        assert!(!result.is_success());
        assert!(matches!(result.outcome, Err(Xml2CsvError::ParseError { .. })));
    }

    #[test]
    fn test_process_missing_file() {
        let result = process_file(PathBuf::from("/nonexistent/flow.xml"), &ProcessOptions::default());
        assert!(matches!(result.outcome, Err(Xml2CsvError::FileOpenError { .. })));
        assert!(!result.error_message().is_empty());
    }

    #[test]
    fn test_process_rejects_delimiter_in_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            temp_dir.path(),
            "flow.xml",
            b"<F><Mittente><RagioneSociale>A;B</RagioneSociale></Mittente></F>",
        );

        let result = process_file(path, &ProcessOptions::default());
        assert!(matches!(result.outcome, Err(Xml2CsvError::UnsafeField { .. })));
    }

    #[test]
    fn test_process_with_mmap() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "flow.xml", DOC.as_bytes());

        let options = ProcessOptions::default().with_mmap_threshold(0);
        let rows = process_file(path, &options).outcome.unwrap();
        assert_eq!(rows.rows.len(), 2);
    }

    #[test]
    fn test_decode_latin1_declaration() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><F><Mittente><RagioneSociale>Societ".to_vec();
        bytes.push(0xE0);
        bytes.extend_from_slice(b"</RagioneSociale></Mittente></F>");

        let text = decode_document(&bytes, Path::new("latin.xml")).unwrap();
        assert!(text.contains("Società"));
    }

    #[test]
    fn test_decode_declaration_with_spaced_equals() {
        let mut bytes = b"<?xml version=\"1.0\" encoding = 'ISO-8859-1' ?><F><Mittente><RagioneSociale>Societ".to_vec();
        bytes.push(0xE0);
        bytes.extend_from_slice(b"</RagioneSociale></Mittente></F>");

        let text = decode_document(&bytes, Path::new("latin.xml")).unwrap();
        assert!(text.contains("Società"));
    }

    #[test]
    fn test_encoding_label() {
        assert_eq!(encoding_label("<?xml version=\"1.0\" encoding=\"UTF-8\""), Some("UTF-8"));
        assert_eq!(encoding_label("<?xml encoding =\t\"windows-1252\""), Some("windows-1252"));
        assert_eq!(encoding_label("<?xml version=\"1.0\""), None);
        assert_eq!(encoding_label("<?xml encoding=latin1"), None);
    }

    #[test]
    fn test_decode_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<F/>");
        assert_eq!(decode_document(&bytes, Path::new("bom.xml")).unwrap(), "<F/>");
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let result = decode_document(&[b'<', 0xFF, b'>'], Path::new("bad.xml"));
        assert!(matches!(result, Err(Xml2CsvError::ParseError { .. })));
    }
}
