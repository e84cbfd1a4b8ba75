//! Conversion driver
//!
//! Runs documents through parse → flatten → filter → write, one at a time,
//! in resolver order. A failing document is logged and skipped; it never
//! stops the batch.

use chrono::{DateTime, Local};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{Result, Xml2CsvError};
use crate::processor::{display_name, process_file, DocumentRows, ProcessOptions};
use crate::record::FlatRecord;
use crate::runlog::{LogEntry, RunLog};
use crate::stats::Statistics;
use crate::writer::{write_consolidated, write_csv, WrittenFile};

/// How output files are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One CSV per input document
    PerFile,
    /// All rows in one logical output, split when above `split_rows`
    Consolidated { split_rows: Option<usize> },
}

/// Options for one conversion run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: OutputMode,
    /// Destination folder, created if missing
    pub output_dir: PathBuf,
    pub process: ProcessOptions,
    /// Run start, used for consolidated file names
    pub started: DateTime<Local>,
    /// Draw a progress bar
    pub show_progress: bool,
}

/// Result of a conversion run
#[derive(Debug)]
pub struct RunReport {
    pub stats: Statistics,
    /// CSV files written, in creation order
    pub written: Vec<WrittenFile>,
}

/// Base name (no extension) of the consolidated output for a run
pub fn consolidated_base_name(started: DateTime<Local>) -> String {
    format!("xml_multi_{}", started.format("%Y%m%d-%H%M%S"))
}

/// Per-file output name: input name with a `csv` extension
pub fn output_name(input: &Path) -> String {
    Path::new(&display_name(input))
        .with_extension("csv")
        .to_string_lossy()
        .into_owned()
}

/// Convert `files` according to `options`, logging every document to `log`.
///
/// Only failing to create the output folder aborts the run.
pub fn convert(files: &[PathBuf], options: &RunOptions, log: &RunLog) -> Result<RunReport> {
    fs::create_dir_all(&options.output_dir).map_err(|e| Xml2CsvError::CreateDirError {
        path: options.output_dir.clone(),
        reason: e.to_string(),
    })?;

    let pb = create_progress_bar(files.len(), options.show_progress);
    let report = match options.mode {
        OutputMode::PerFile => convert_per_file(files, options, log, &pb),
        OutputMode::Consolidated { split_rows } => {
            convert_consolidated(files, options, split_rows, log, &pb)
        }
    };
    pb.finish_and_clear();

    Ok(report)
}

fn convert_per_file(files: &[PathBuf], options: &RunOptions, log: &RunLog, pb: &ProgressBar) -> RunReport {
    let mut stats = Statistics::new(files.len());
    let mut written = Vec::new();
    let delimiter = options.process.delimiter;

    for path in files {
        let job_ts = Local::now();
        let timer = Instant::now();
        let name = display_name(path);
        let csv_name = output_name(path);
        pb.set_message(name.clone());

        let result = process_file(path.clone(), &options.process);
        let file_size = result.file_size;
        let outcome = result.outcome.and_then(|rows| {
            let file = write_csv(&options.output_dir.join(&csv_name), &rows.rows, delimiter)?;
            Ok((rows, file))
        });
        let elapsed = timer.elapsed();

        let entry = match outcome {
            Ok((rows, file)) => {
                report_filter(pb, &options.process, &name, &rows);
                info!("created {} ({:.3}s)", file.path.display(), elapsed.as_secs_f64());
                stats.record_success(file_size, rows.extracted, rows.rows.len());
                stats.record_files(1);
                written.push(file);
                LogEntry::success(name, csv_name, job_ts, elapsed)
            }
            Err(e) => {
                pb.println(format!("{} {}: {}", "✗".red(), name, e.to_string().dimmed()));
                stats.record_failure();
                LogEntry::failure(name, String::new(), job_ts, elapsed, e.to_string())
            }
        };
        append_log(log, &entry);
        pb.inc(1);
    }

    RunReport { stats, written }
}

fn convert_consolidated(
    files: &[PathBuf],
    options: &RunOptions,
    split_rows: Option<usize>,
    log: &RunLog,
    pb: &ProgressBar,
) -> RunReport {
    let mut stats = Statistics::new(files.len());
    let run_timer = Instant::now();
    let base_name = consolidated_base_name(options.started);
    let csv_name = format!("{base_name}.csv");
    let mut all_rows: Vec<FlatRecord> = Vec::new();

    for path in files {
        let job_ts = Local::now();
        let timer = Instant::now();
        let name = display_name(path);
        pb.set_message(name.clone());

        let result = process_file(path.clone(), &options.process);
        let elapsed = timer.elapsed();

        let entry = match result.outcome {
            Ok(rows) => {
                report_filter(pb, &options.process, &name, &rows);
                stats.record_success(result.file_size, rows.extracted, rows.rows.len());
                all_rows.extend(rows.rows);
                LogEntry::success(name, csv_name.clone(), job_ts, elapsed)
            }
            Err(e) => {
                pb.println(format!("{} {}: {}", "✗".red(), name, e.to_string().dimmed()));
                stats.record_failure();
                let note = format!("Error in {name}: {e}");
                LogEntry::failure(name, csv_name.clone(), job_ts, elapsed, note)
            }
        };
        append_log(log, &entry);
        pb.inc(1);
    }

    let delimiter = options.process.delimiter;
    let written = match write_consolidated(&options.output_dir, &base_name, &all_rows, split_rows, delimiter) {
        Ok(written) => {
            for file in &written {
                pb.println(format!(
                    "{} created {} ({} rows)",
                    "✓".green(),
                    file.path.display(),
                    file.rows
                ));
            }
            stats.record_files(written.len());
            written
        }
        Err(e) => {
            pb.println(format!("{} consolidated output failed: {}", "✗".red(), e));
            let entry = LogEntry::failure(
                format!("{}_files", files.len()),
                String::new(),
                Local::now(),
                run_timer.elapsed(),
                format!("Error creating consolidated file: {e}"),
            );
            append_log(log, &entry);
            Vec::new()
        }
    };

    RunReport { stats, written }
}

fn report_filter(pb: &ProgressBar, options: &ProcessOptions, name: &str, rows: &DocumentRows) {
    if options.filter.is_active() {
        pb.println(format!(
            "  {} {}: {}/{} rows kept",
            "🔍".bright_magenta(),
            name,
            rows.rows.len(),
            rows.extracted
        ));
    }
}

fn append_log(log: &RunLog, entry: &LogEntry) {
    if let Err(e) = log.append(entry) {
        warn!("cannot write run log entry for {}: {e}", entry.file_xml);
    }
}

/// Progress bar over the documents of a run
fn create_progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░"));
    }
    pb
}
