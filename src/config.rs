//! Run configuration shared by the loader, the grouping step and the plotter.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of measurement in the log, used for titles and file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Latency,
    Throughput,
}

impl Mode {
    /// Guess the mode from the input path: any path containing "lat" is a latency log
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        if path.as_ref().to_string_lossy().contains("lat") {
            Mode::Latency
        } else {
            Mode::Throughput
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Latency => "latency",
            Mode::Throughput => "throughput",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How data rows whose token count differs from the header are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Zip tokens against the header; missing trailing fields stay unset, extra tokens are dropped
    #[default]
    Tolerant,
    /// Any length mismatch is an error
    Strict,
}

/// What to do with a cross-product group that matches no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EmptyGroupPolicy {
    /// Produce no image, log at debug level
    #[default]
    Skip,
    /// Produce no image, log a warning
    Warn,
    /// Abort with an error
    Fail,
}

/// Image encoding of the generated plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

pub const DEFAULT_BINS: usize = 100;

/// Everything the report generator needs besides the data itself
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub mode: Mode,
    pub output_dir: PathBuf,
    pub create_output_dir: bool,
    pub format: ImageFormat,
    pub bins: usize,
    /// Primary group axis; `None` means the first header field
    pub primary_field: Option<String>,
    pub row_policy: RowPolicy,
    pub empty_groups: EmptyGroupPolicy,
    pub keep_going: bool,
}

impl ReportConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            output_dir: PathBuf::from("plots"),
            create_output_dir: false,
            format: ImageFormat::default(),
            bins: DEFAULT_BINS,
            primary_field: None,
            row_policy: RowPolicy::default(),
            empty_groups: EmptyGroupPolicy::default(),
            keep_going: false,
        }
    }
}
