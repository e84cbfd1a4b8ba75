//! CSV output
//!
//! Writes flat records as BOM-prefixed, semicolon-delimited CSV without
//! quoting, and splits consolidated output into numbered parts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, Xml2CsvError};
use crate::record::{header_line, FlatRecord};

/// UTF-8 byte order mark written at the start of every CSV file
pub const BOM: &str = "\u{feff}";

/// Line terminator for CSV and log rows
pub const LINE_END: &str = "\r\n";

/// A CSV file that was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Write `rows` to `path` with a header row
pub fn write_csv(path: &Path, rows: &[FlatRecord], delimiter: char) -> Result<WrittenFile> {
    let to_error = |e: std::io::Error| Xml2CsvError::WriteError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    };

    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);

    write!(writer, "{BOM}{}{LINE_END}", header_line(delimiter)).map_err(to_error)?;
    for row in rows {
        write!(writer, "{}{LINE_END}", row.to_line(delimiter)).map_err(to_error)?;
    }
    writer.flush().map_err(to_error)?;

    Ok(WrittenFile {
        path: path.to_path_buf(),
        rows: rows.len(),
    })
}

/// Name of the `index`-th (1-based) part of a split consolidated file
pub fn part_name(base_name: &str, index: usize) -> String {
    format!("{base_name}_{index:03}.csv")
}

/// Write consolidated rows as `<base>.csv`, or as numbered parts of at most
/// `split_rows` rows when the total exceeds it.
pub fn write_consolidated(
    dir: &Path,
    base_name: &str,
    rows: &[FlatRecord],
    split_rows: Option<usize>,
    delimiter: char,
) -> Result<Vec<WrittenFile>> {
    match split_rows {
        Some(limit) if limit > 0 && rows.len() > limit => rows
            .chunks(limit)
            .enumerate()
            .map(|(i, chunk)| write_csv(&dir.join(part_name(base_name, i + 1)), chunk, delimiter))
            .collect(),
        _ => {
            let path = dir.join(format!("{base_name}.csv"));
            Ok(vec![write_csv(&path, rows, delimiter)?])
        }
    }
}
