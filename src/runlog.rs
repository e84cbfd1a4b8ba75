//! Run audit log
//!
//! One CSV log file per invocation, one row per processed document. The file
//! is created on the first entry and only ever appended to.

use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, Xml2CsvError};
use crate::writer::{BOM, LINE_END};

/// Log column names
pub const LOG_COLUMNS: [&str; 6] = [
    "file_xml",
    "file_csv",
    "job_ts",
    "conversion_time",
    "confirmation",
    "notes",
];

/// `job_ts` column format
pub const JOB_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One processed document
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub file_xml: String,
    pub file_csv: String,
    pub job_ts: DateTime<Local>,
    pub elapsed: Duration,
    pub success: bool,
    pub notes: String,
}

impl LogEntry {
    pub fn success(file_xml: String, file_csv: String, job_ts: DateTime<Local>, elapsed: Duration) -> Self {
        Self {
            file_xml,
            file_csv,
            job_ts,
            elapsed,
            success: true,
            notes: String::new(),
        }
    }

    pub fn failure(
        file_xml: String,
        file_csv: String,
        job_ts: DateTime<Local>,
        elapsed: Duration,
        notes: String,
    ) -> Self {
        Self {
            file_xml,
            file_csv,
            job_ts,
            elapsed,
            success: false,
            notes,
        }
    }

    fn to_line(&self, delimiter: char) -> String {
        let confirmation = if self.success { "1" } else { "0" };
        let fields = [
            quote_field(&self.file_xml, delimiter),
            quote_field(&self.file_csv, delimiter),
            self.job_ts.format(JOB_TS_FORMAT).to_string(),
            format_elapsed(self.elapsed),
            confirmation.to_string(),
            quote_field(&self.notes, delimiter),
        ];
        fields.join(delimiter.to_string().as_str())
    }
}

/// Append-only log for one run
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    delimiter: char,
}

impl RunLog {
    /// Prepare the log for a run started at `started`, creating `log_dir`.
    ///
    /// The file itself is not created until the first entry.
    pub fn create(log_dir: &Path, started: DateTime<Local>, delimiter: char) -> Result<Self> {
        fs::create_dir_all(log_dir).map_err(|e| Xml2CsvError::CreateDirError {
            path: log_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self::at(log_dir.join(log_file_name(started)), delimiter))
    }

    /// Log writing to an explicit path
    pub fn at(path: PathBuf, delimiter: char) -> Self {
        Self { path, delimiter }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, writing BOM and header first if the file is new
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let to_error = |e: std::io::Error| Xml2CsvError::WriteError {
            file: self.path.clone(),
            reason: e.to_string(),
        };

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_error)?;

        let mut buffer = String::new();
        if is_new {
            buffer.push_str(BOM);
            buffer.push_str(&LOG_COLUMNS.join(self.delimiter.to_string().as_str()));
            buffer.push_str(LINE_END);
        }
        buffer.push_str(&entry.to_line(self.delimiter));
        buffer.push_str(LINE_END);

        file.write_all(buffer.as_bytes()).map_err(to_error)
    }
}

/// Log file name for a run started at `started`
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("xml2csv_{}.log.csv", started.format("%Y%m%d_%H%M%S"))
}

/// Seconds with three decimals and a comma separator, e.g. `0,125`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}", elapsed.as_secs_f64()).replace('.', ",")
}

/// Quote a free-text field only when it would otherwise break the row
fn quote_field(value: &str, delimiter: char) -> String {
    if value.contains(|ch: char| ch == delimiter || ch == '"' || ch == '\n' || ch == '\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn ts() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 25, 16, 0, 5).unwrap()
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1250)), "1,250");
        assert_eq!(format_elapsed(Duration::ZERO), "0,000");
        assert_eq!(format_elapsed(Duration::from_micros(123_456)), "0,123");
    }

    #[test]
    fn test_log_file_name() {
        assert_eq!(log_file_name(ts()), "xml2csv_20250825_160005.log.csv");
    }

    #[test]
    fn test_create_is_lazy() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let log = RunLog::create(&log_dir, ts(), ';').unwrap();
        assert!(log_dir.is_dir());
        assert!(!log.path().exists());
    }

    #[test]
    fn test_header_written_once() {
        let temp_dir = TempDir::new().unwrap();
        let log = RunLog::create(temp_dir.path(), ts(), ';').unwrap();

        log.append(&LogEntry::success(
            "a.xml".into(),
            "a.csv".into(),
            ts(),
            Duration::from_millis(15),
        ))
        .unwrap();
        log.append(&LogEntry::failure(
            "b.xml".into(),
            String::new(),
            ts(),
            Duration::from_millis(2),
            "XML parse failed".into(),
        ))
        .unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "\u{feff}file_xml;file_csv;job_ts;conversion_time;confirmation;notes"
        );
        assert_eq!(lines[1], "a.xml;a.csv;2025-08-25 16:00:05;0,015;1;");
        assert_eq!(lines[2], "b.xml;;2025-08-25 16:00:05;0,002;0;XML parse failed");
        assert_eq!(content.matches('\u{feff}').count(), 1);
    }

    #[test]
    fn test_notes_with_delimiter_are_quoted() {
        let entry = LogEntry::failure(
            "b.xml".into(),
            String::new(),
            ts(),
            Duration::ZERO,
            "value \"A;B\"".into(),
        );
        assert!(entry.to_line(';').ends_with(";0;\"value \"\"A;B\"\"\""));
    }
}
