//! xml2csv - GAS INVOICE XML TO CSV CONVERTER
//!
//! Main entry point

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::path::PathBuf;

use xml2csv::{
    cli::Args,
    driver::{convert, OutputMode, RunOptions},
    error::Xml2CsvError,
    pattern::PatternMatcher,
    processor::ProcessOptions,
    runlog::RunLog,
    Settings,
};

fn main() -> Result<()> {
    // No arguments: show usage and stop
    if std::env::args_os().len() <= 1 {
        Args::command().print_help()?;
        println!();
        return Ok(());
    }

    let args = Args::parse();
    init_logging(args.verbose);

    // Without settings there is no log folder to write to
    let settings = match args.settings() {
        Ok(settings) => settings,
        Err(e) => {
            print_error(&e);
            return Ok(());
        }
    };

    let started = Local::now();
    let log = RunLog::create(&settings.log_dir, started, settings.delimiter)
        .context("cannot prepare the run log")?;

    if let Err(e) = args.validate() {
        print_error(&e);
        record_input_error(&log, &args, started, &e);
        print_log_location(&log);
        return Ok(());
    }

    let matcher = match PatternMatcher::new(&settings.input_pattern) {
        Ok(matcher) => matcher,
        Err(e) => {
            print_error(&e);
            record_input_error(&log, &args, started, &e);
            print_log_location(&log);
            return Ok(());
        }
    };

    print_header(&args, &settings);

    // Resolve input documents
    let files = match args.resolve_inputs(&matcher) {
        Ok(files) => files,
        Err(e @ Xml2CsvError::NoFilesFound { .. }) => {
            println!("{} {}", "⚠️".yellow(), e.to_string().yellow());
            return Ok(());
        }
        Err(e) => {
            print_error(&e);
            record_input_error(&log, &args, started, &e);
            print_log_location(&log);
            return Ok(());
        }
    };

    let search_info = if args.recursive { " (recursive search)" } else { "" };
    println!(
        "  {} XML files found: {}{}",
        "📋".bright_white(),
        files.len().to_string().bright_green(),
        search_info
    );

    if args.dry_run {
        print_dry_run(&files);
        return Ok(());
    }

    let filter = args.row_filter();
    let options = RunOptions {
        mode: args.output_mode(&settings),
        output_dir: settings.output_dir.clone(),
        process: ProcessOptions::from_settings(&settings).with_filter(filter.clone()),
        started,
        show_progress: files.len() > 1,
    };

    println!("\n{}", "⚡ Converting...".bright_cyan());
    let report = convert(&files, &options, &log).context("conversion failed")?;

    if args.verbose && options.mode == OutputMode::PerFile {
        for file in &report.written {
            println!("  {} {} ({} rows)", "✓".green(), file.path.display(), file.rows);
        }
    }

    report.stats.print_summary(filter.is_active());
    print_log_location(&log);
    println!("\n{} Conversion completed!\n", "✅".bright_green());

    Ok(())
}

/// Initialise diagnostic logging; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Print the run header
fn print_header(args: &Args, settings: &Settings) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!("{}", " 🚀 GAS INVOICE XML TO CSV CONVERTER".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());
    println!("  {} Input:        {}", "📂".bright_cyan(), args.input_path().display());
    println!(
        "  {} Output:       {}",
        "📄".bright_green(),
        settings.output_dir.display()
    );

    match args.output_mode(settings) {
        OutputMode::PerFile => println!("  {} Mode:         one CSV per file", "⚙️".bright_yellow()),
        OutputMode::Consolidated { split_rows } => println!(
            "  {} Mode:         consolidated (split every {} rows)",
            "⚙️".bright_yellow(),
            split_rows.unwrap_or(settings.default_split_rows)
        ),
    }

    if let Some(ref grep) = args.grep {
        println!("  {} Filter:       '{}'", "🔍".bright_magenta(), grep);
    }

    if args.dry_run {
        println!("  {} {}", "⚠️".bright_yellow(), "dry run (nothing is converted)".yellow());
    }

    println!("{}", "═".repeat(50).bright_blue());
    println!("\n{}", "📁 Searching files...".bright_cyan());
}

/// Dry run listing
fn print_dry_run(files: &[PathBuf]) {
    println!("\n{}", "📋 Files to convert:".bright_cyan());
    for (i, path) in files.iter().enumerate() {
        println!("  {}. {}", i + 1, path.display());
    }
    println!(
        "\n{} {} files would be converted.",
        "ℹ️".bright_blue(),
        files.len().to_string().bright_green()
    );
}

fn print_error(error: &Xml2CsvError) {
    eprintln!("{} {}", "ERROR:".bright_red().bold(), error.to_string().red());
}

fn print_log_location(log: &RunLog) {
    if log.path().exists() {
        println!("\n{} Log created: {}", "📝".bright_cyan(), log.path().display());
    }
}

/// Record an input validation failure so the run still leaves a log
fn record_input_error(run_log: &RunLog, args: &Args, started: DateTime<Local>, error: &Xml2CsvError) {
    if let Err(e) = run_log.append(&args.input_error_entry(started, error)) {
        log::warn!("cannot write run log entry: {e}");
    }
}
