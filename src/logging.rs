//! Diagnostics on stderr and the JSON run manifest.

use crate::report::ReportSummary;
use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Quiet,
    Warn,
    Info,
    Debug,
}

#[derive(Debug, clap::Args)]
pub struct LogLevelOpt {
    /// Report each generated plot and a summary at the end
    #[arg(short, long)]
    verbose: bool,

    /// Also report skipped groups and axis values (implies `--verbose`)
    #[arg(short, long)]
    debug: bool,

    /// Disable warnings. Conflicts with `--verbose` and `--debug`.
    #[arg(short, long)]
    quiet: bool,
}

impl TryFrom<LogLevelOpt> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(value: LogLevelOpt) -> Result<Self> {
        match (value.verbose, value.debug, value.quiet) {
            (false, false, false) => Ok(LogLevel::Warn),
            (true, false, false) => Ok(LogLevel::Info),
            (_, true, false) => Ok(LogLevel::Debug),
            (false, false, true) => Ok(LogLevel::Quiet),
            (_, _, true) => {
                bail!("option `--quiet` conflicts with the options `--verbose` and `--debug`")
            }
        }
    }
}

/// Writes timestamped lines to stderr at or below the configured level.
/// Stdout is never used.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Quiet && level <= self.level
    }

    pub fn warn(&self, msg: impl Display) {
        self.log(LogLevel::Warn, "warning", msg);
    }

    pub fn info(&self, msg: impl Display) {
        self.log(LogLevel::Info, "info", msg);
    }

    pub fn debug(&self, msg: impl Display) {
        self.log(LogLevel::Debug, "debug", msg);
    }

    fn log(&self, level: LogLevel, tag: &str, msg: impl Display) {
        if self.enabled(level) {
            eprintln!("{} {}: {}", Local::now().format("%H:%M:%S%.3f"), tag, msg);
        }
    }
}

/// Write the run summary as pretty-printed JSON
pub fn write_manifest<P: AsRef<Path>>(path: P, summary: &ReportSummary) -> Result<()> {
    let file: File = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path.as_ref())
        .with_context(|| format!("Failed to create manifest: {}", path.as_ref().display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
