//! Benchmark Histograms - plots the distribution of latency or throughput
//! samples in a NUMA memory benchmark log.
//!
//! Reads a comma-separated log whose rows are tagged with a CPU (or CPU
//! node), a NUMA node and a memory region, and writes one histogram image
//! per combination of those three values.

mod config;
mod error;
mod groups;
mod histogram;
mod logging;
mod plot;
mod records;
mod report;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{EmptyGroupPolicy, ImageFormat, Mode, ReportConfig, RowPolicy, DEFAULT_BINS};
use logging::{LogLevel, LogLevelOpt, Logger};
use report::ReportGenerator;
use std::path::PathBuf;

/// Histogram plots of benchmark measurements, one per (cpu, numa_node, region) group
#[derive(Parser, Debug)]
#[command(name = "benchhist")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Benchmark log (CSV with a header line)
    input_file: PathBuf,

    /// Measurement kind used in titles and file names
    /// (default: latency if the input path contains "lat", else throughput)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Directory for generated plots (must exist unless --mkdir is given)
    #[arg(short = 'o', long, default_value = "plots")]
    output_dir: PathBuf,

    /// Create the output directory if it is missing
    #[arg(long)]
    mkdir: bool,

    /// Image format of the plots
    #[arg(long, value_enum, default_value_t = ImageFormat::default())]
    format: ImageFormat,

    /// Number of histogram bins
    #[arg(long, default_value_t = DEFAULT_BINS)]
    bins: usize,

    /// Column used as the CPU axis (default: the first header field)
    #[arg(long)]
    primary_field: Option<String>,

    /// Reject rows whose field count differs from the header
    #[arg(long)]
    strict_rows: bool,

    /// What to do with axis combinations that have no records
    #[arg(long, value_enum, default_value_t = EmptyGroupPolicy::default())]
    empty_groups: EmptyGroupPolicy,

    /// Continue with the remaining groups when one fails
    #[arg(long)]
    keep_going: bool,

    /// Write a JSON manifest of the run to this file
    #[arg(long)]
    manifest: Option<PathBuf>,

    #[command(flatten)]
    log_level: LogLevelOpt,
}

impl Args {
    fn report_config(&self) -> ReportConfig {
        // Sniffing the path is only a fallback for a missing --mode
        let mode = self.mode.unwrap_or_else(|| Mode::from_path(&self.input_file));

        let mut config = ReportConfig::new(mode);
        config.output_dir = self.output_dir.clone();
        config.create_output_dir = self.mkdir;
        config.format = self.format;
        config.bins = self.bins;
        config.primary_field = self.primary_field.clone();
        if self.strict_rows {
            config.row_policy = RowPolicy::Strict;
        }
        config.empty_groups = self.empty_groups;
        config.keep_going = self.keep_going;
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.report_config();
    let logger = Logger::new(LogLevel::try_from(args.log_level)?);

    logger.info(format!(
        "Loading {} measurements from: {}",
        config.mode,
        args.input_file.display()
    ));
    let dataset = records::load_records(&args.input_file, config.row_policy)
        .with_context(|| format!("Failed to load benchmark log: {}", args.input_file.display()))?;

    let summary = ReportGenerator::new(&config, logger)
        .run(&dataset, &args.input_file)
        .context("Failed to generate histograms")?;

    if let Some(ref manifest) = args.manifest {
        logging::write_manifest(manifest, &summary)?;
        logger.info(format!("Manifest written to: {}", manifest.display()));
    }
    summary.log_summary(&logger);

    let failed = summary.failed_count();
    if failed > 0 {
        bail!("{} of {} groups failed", failed, summary.groups.len());
    }

    Ok(())
}
