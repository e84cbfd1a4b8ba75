//! Run statistics
//!
//! Counters collected while converting and the summary printed at the end.

use colored::Colorize;
use std::time::{Duration, Instant};

/// Conversion counters for one run
#[derive(Debug)]
pub struct Statistics {
    /// Documents resolved for this run
    pub total_documents: usize,
    /// Documents processed successfully
    pub succeeded: usize,
    /// Documents that failed
    pub failed: usize,
    /// Rows produced by the flattener
    pub rows_extracted: usize,
    /// Rows kept after filtering
    pub rows_kept: usize,
    /// CSV files written
    pub files_written: usize,
    /// Source bytes read
    pub bytes_read: u64,
    start_time: Instant,
}

impl Statistics {
    pub fn new(total_documents: usize) -> Self {
        Self {
            total_documents,
            succeeded: 0,
            failed: 0,
            rows_extracted: 0,
            rows_kept: 0,
            files_written: 0,
            bytes_read: 0,
            start_time: Instant::now(),
        }
    }

    /// Record a successful document
    pub fn record_success(&mut self, bytes: u64, extracted: usize, kept: usize) {
        self.succeeded += 1;
        self.bytes_read += bytes;
        self.rows_extracted += extracted;
        self.rows_kept += kept;
    }

    /// Record a failed document
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Record CSV files written
    pub fn record_files(&mut self, count: usize) {
        self.files_written += count;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Print the run summary
    pub fn print_summary(&self, filtered: bool) {
        println!("\n{}", "═".repeat(50).bright_blue());
        println!("{}", " 📊 Conversion summary".bright_white().bold());
        println!("{}", "═".repeat(50).bright_blue());

        println!("  {} Documents:    {}", "📁".bright_cyan(), self.total_documents);
        println!(
            "  {} Converted:    {}",
            "✅".bright_green(),
            self.succeeded.to_string().green()
        );

        if self.failed > 0 {
            println!(
                "  {} Failed:       {}",
                "❌".bright_red(),
                self.failed.to_string().red()
            );
        } else {
            println!("  {} Failed:       {}", "✅".bright_green(), "0".green());
        }

        if filtered {
            println!(
                "  {} Rows:         {}/{} kept",
                "🔍".bright_magenta(),
                self.rows_kept,
                self.rows_extracted
            );
        } else {
            println!("  {} Rows:         {}", "🧾".bright_magenta(), self.rows_kept);
        }

        println!("  {} CSV files:    {}", "📄".bright_yellow(), self.files_written);
        println!("  {} Input size:   {}", "📥".bright_yellow(), format_bytes(self.bytes_read));
        println!(
            "  {} Elapsed:      {}",
            "⏱️".bright_cyan(),
            format_duration(self.elapsed())
        );

        println!("{}", "═".repeat(50).bright_blue());
    }
}

/// Human readable byte count
///
/// # Examples
/// ```
/// use xml2csv::stats::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 B");
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1048576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Elapsed wall time: seconds with milliseconds below a minute, then
/// zero-padded minute and hour fields
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);

    match (hours, minutes) {
        (0, 0) => format!("{:.3}s", duration.as_secs_f64()),
        (0, _) => format!("{minutes}m {seconds:02}s"),
        _ => format!("{hours}h {minutes:02}m {seconds:02}s"),
    }
}
