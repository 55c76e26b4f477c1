//! One histogram per (cpu, numa node, region) group of a benchmark log.

use crate::config::{EmptyGroupPolicy, ImageFormat, Mode, ReportConfig};
use crate::error::{ReportError, Result};
use crate::groups::{
    extract_axes, filter_group, GroupKey, METRIC_FIELD, NUMA_FIELD, REGION_FIELD, UNITS_FIELD,
};
use crate::histogram::Histogram;
use crate::logging::Logger;
use crate::plot::{render_histogram, PlotLabels};
use crate::records::{Dataset, MeasurementRecord};
use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupOutcome {
    Plotted {
        path: PathBuf,
        units: String,
        samples: usize,
        lower: f64,
        upper: f64,
    },
    /// No record carries this combination of axis values
    Empty,
    /// Only recorded with `keep_going`
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub key: GroupKey,
    pub outcome: GroupOutcome,
}

/// Result of a whole run, also the manifest contents
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub input: PathBuf,
    pub mode: Mode,
    pub format: ImageFormat,
    pub primary_field: String,
    pub records: usize,
    pub generated_at: DateTime<Utc>,
    pub groups: Vec<GroupReport>,
}

impl ReportSummary {
    pub fn plotted(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups
            .iter()
            .filter(|g| matches!(g.outcome, GroupOutcome::Plotted { .. }))
    }

    pub fn empty_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.outcome == GroupOutcome::Empty)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.outcome, GroupOutcome::Failed { .. }))
            .count()
    }

    /// Human-readable summary at info level
    pub fn log_summary(&self, logger: &Logger) {
        let samples: usize = self
            .plotted()
            .map(|g| match g.outcome {
                GroupOutcome::Plotted { samples, .. } => samples,
                _ => 0,
            })
            .sum();
        logger.info(format!(
            "{} records, {} {} samples in {} plots ({} empty groups, {} failed)",
            self.records.to_formatted_string(&Locale::en),
            samples.to_formatted_string(&Locale::en),
            self.mode,
            self.plotted().count(),
            self.empty_count(),
            self.failed_count(),
        ));
    }
}

pub struct ReportGenerator<'a> {
    config: &'a ReportConfig,
    logger: Logger,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(config: &'a ReportConfig, logger: Logger) -> Self {
        Self { config, logger }
    }

    /// Plot every group of `dataset`.
    ///
    /// Groups are visited over the full cross-product of axis values, so
    /// combinations that never occur together are handled by the empty-group
    /// policy. The first error aborts the run unless `keep_going` is set.
    pub fn run(&self, dataset: &Dataset, input: &Path) -> Result<ReportSummary> {
        if self.config.bins == 0 {
            return Err(ReportError::InvalidBins);
        }
        let primary_field = match &self.config.primary_field {
            Some(field) => field.clone(),
            None => dataset.first_field().to_string(),
        };
        dataset.require_columns(&[
            primary_field.as_str(),
            NUMA_FIELD,
            REGION_FIELD,
            METRIC_FIELD,
            UNITS_FIELD,
        ])?;

        if self.config.create_output_dir {
            fs::create_dir_all(&self.config.output_dir).map_err(|e| ReportError::OutputWrite {
                path: self.config.output_dir.clone(),
                reason: e.to_string(),
            })?;
        }

        let axes = extract_axes(&dataset.records, &primary_field)?;
        self.logger.debug(format!(
            "{} {:?} x numa_node {:?} x region {:?}: {} groups",
            primary_field,
            axes.primary,
            axes.numa_nodes,
            axes.regions,
            axes.combinations()
        ));

        let mut summary = ReportSummary {
            input: input.to_path_buf(),
            mode: self.config.mode,
            format: self.config.format,
            primary_field: primary_field.clone(),
            records: dataset.records.len(),
            generated_at: Utc::now(),
            groups: Vec::with_capacity(axes.combinations()),
        };

        for key in axes.keys() {
            let group = filter_group(&dataset.records, &primary_field, &key);
            let outcome = match self.process_group(&key, &group, &primary_field) {
                Ok(outcome) => outcome,
                Err(err) if self.config.keep_going => {
                    self.logger.warn(format!("group {key} failed: {err}"));
                    GroupOutcome::Failed {
                        error: err.to_string(),
                    }
                }
                Err(err) => return Err(err),
            };
            summary.groups.push(GroupReport { key, outcome });
        }

        Ok(summary)
    }

    fn process_group(
        &self,
        key: &GroupKey,
        group: &[&MeasurementRecord],
        primary_field: &str,
    ) -> Result<GroupOutcome> {
        let Some(first) = group.first() else {
            match self.config.empty_groups {
                EmptyGroupPolicy::Skip => self.logger.debug(format!("no records for {key}")),
                EmptyGroupPolicy::Warn => self.logger.warn(format!("no records for {key}")),
                EmptyGroupPolicy::Fail => return Err(ReportError::EmptyGroup(key.clone())),
            }
            return Ok(GroupOutcome::Empty);
        };

        let units = first.require(UNITS_FIELD)?.to_string();
        let samples = metric_samples(group)?;
        let hist = Histogram::from_samples(&samples, self.config.bins)?
            .ok_or_else(|| ReportError::EmptyGroup(key.clone()))?;

        let path = self.config.output_dir.join(output_file_name(
            self.config.mode,
            primary_field,
            key,
            self.config.format,
        ));
        let labels = PlotLabels {
            title: format!("Histogram of {} measurements", self.config.mode),
            subtitle: format!(
                "{}: {}, numa_node: {}, region: {}",
                primary_field, key.primary, key.numa_node, key.region
            ),
            x_desc: units.clone(),
        };
        render_histogram(&hist, &labels, &path, self.config.format)?;
        self.logger.info(format!(
            "wrote {} ({} samples, {} bins)",
            path.display(),
            hist.total(),
            hist.bin_count()
        ));

        Ok(GroupOutcome::Plotted {
            path,
            units,
            samples: samples.len(),
            lower: hist.lower,
            upper: hist.upper,
        })
    }
}

/// The metric of each record as a finite float
pub fn metric_samples(group: &[&MeasurementRecord]) -> Result<Vec<f64>> {
    group
        .iter()
        .map(|record| {
            let raw = record.require(METRIC_FIELD)?;
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(ReportError::NumericParse {
                    line: record.line,
                    value: raw.to_string(),
                }),
            }
        })
        .collect()
}

/// `hist_{mode}_{primary field}_{cpu}_numa_node_{numa}_region_{region}.{ext}`
pub fn output_file_name(
    mode: Mode,
    primary_field: &str,
    key: &GroupKey,
    format: ImageFormat,
) -> String {
    format!(
        "hist_{}_{}_{}_numa_node_{}_region_{}.{}",
        mode,
        primary_field,
        key.primary,
        key.numa_node,
        key.region,
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowPolicy;
    use crate::logging::LogLevel;
    use crate::records::parse_records;

    const LOG: &str = "cpu_node,numa_node,region,metric,units\n\
                       A,0,R1,1.5,ns\n\
                       A,0,R1,2.5,ns\n\
                       B,1,R2,3.0,ns\n";

    fn config(dir: &Path, format: ImageFormat) -> ReportConfig {
        let mut config = ReportConfig::new(Mode::Latency);
        config.output_dir = dir.to_path_buf();
        config.format = format;
        config
    }

    fn run(text: &str, config: &ReportConfig) -> Result<ReportSummary> {
        let dataset = parse_records(text, RowPolicy::Tolerant)?;
        ReportGenerator::new(config, Logger::new(LogLevel::Quiet))
            .run(&dataset, Path::new("x_lat.csv"))
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn one_png_per_nonempty_group() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run(LOG, &config(dir.path(), ImageFormat::Png)).unwrap();

        assert_eq!(
            files_in(dir.path()),
            vec![
                "hist_latency_cpu_node_A_numa_node_0_region_R1.png",
                "hist_latency_cpu_node_B_numa_node_1_region_R2.png",
            ]
        );
        // A/B x 0/1 x R1/R2, six of which are empty
        assert_eq!(summary.groups.len(), 8);
        assert_eq!(summary.empty_count(), 6);
        assert_eq!(summary.failed_count(), 0);

        let samples: Vec<usize> = summary
            .plotted()
            .map(|g| match g.outcome {
                GroupOutcome::Plotted { samples, .. } => samples,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(samples, vec![2, 1]);
    }

    #[test]
    fn group_metrics_are_parsed_in_order() {
        let dataset = parse_records(LOG, RowPolicy::Strict).unwrap();
        let first = filter_group(&dataset.records, "cpu_node", &GroupKey::new("A", "0", "R1"));
        let second = filter_group(&dataset.records, "cpu_node", &GroupKey::new("B", "1", "R2"));
        assert_eq!(metric_samples(&first).unwrap(), vec![1.5, 2.5]);
        assert_eq!(metric_samples(&second).unwrap(), vec![3.0]);
    }

    #[test]
    fn svg_output_uses_svg_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), ImageFormat::Svg);
        config.mode = Mode::Throughput;
        run(LOG, &config).unwrap();

        let files = files_in(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.contains(&"hist_throughput_cpu_node_B_numa_node_1_region_R2.svg".to_string()));
    }

    #[test]
    fn empty_group_can_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), ImageFormat::Svg);
        config.empty_groups = EmptyGroupPolicy::Fail;

        match run(LOG, &config) {
            Err(ReportError::EmptyGroup(key)) => assert_eq!(key, GroupKey::new("A", "0", "R2")),
            other => panic!("unexpected result: {other:?}"),
        }
        // the first group was already written
        assert_eq!(files_in(dir.path()).len(), 1);
    }

    #[test]
    fn keep_going_records_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), ImageFormat::Svg);
        config.empty_groups = EmptyGroupPolicy::Fail;
        config.keep_going = true;

        let summary = run(LOG, &config).unwrap();
        assert_eq!(summary.failed_count(), 6);
        assert_eq!(summary.plotted().count(), 2);
        assert_eq!(files_in(dir.path()).len(), 2);
    }

    #[test]
    fn bad_metric_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let text = "cpu_node,numa_node,region,metric,units\n0,0,R1,1.0,ns\n0,0,R1,fast,ns\n";

        match run(text, &config(dir.path(), ImageFormat::Svg)) {
            Err(ReportError::NumericParse { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn non_finite_metric_is_rejected() {
        let dataset = parse_records(
            "cpu_node,numa_node,region,metric,units\n0,0,R1,NaN,ns\n",
            RowPolicy::Strict,
        )
        .unwrap();
        let group: Vec<&MeasurementRecord> = dataset.records.iter().collect();
        assert!(matches!(
            metric_samples(&group),
            Err(ReportError::NumericParse { line: 2, .. })
        ));
    }

    #[test]
    fn missing_column_is_reported_before_plotting() {
        let dir = tempfile::tempdir().unwrap();
        let text = "cpu_node,numa_node,metric,units\n0,0,1.0,ns\n";
        assert!(matches!(
            run(text, &config(dir.path(), ImageFormat::Svg)),
            Err(ReportError::MissingColumn(column)) if column == "region"
        ));
    }

    #[test]
    fn primary_field_override_changes_names() {
        let dir = tempfile::tempdir().unwrap();
        let text = "run,cpu,numa_node,region,metric,units\n1,4,0,R1,7.0,MB/s\n";
        let mut config = config(dir.path(), ImageFormat::Svg);
        config.mode = Mode::Throughput;
        config.primary_field = Some("cpu".to_string());

        let summary = run(text, &config).unwrap();
        assert_eq!(summary.primary_field, "cpu");
        assert_eq!(
            files_in(dir.path()),
            vec!["hist_throughput_cpu_4_numa_node_0_region_R1.svg"]
        );
    }

    #[test]
    fn missing_output_dir_is_created_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let plots = dir.path().join("plots");

        let err = run(LOG, &config(&plots, ImageFormat::Svg)).unwrap_err();
        assert!(matches!(err, ReportError::OutputWrite { .. }));

        let mut config = config(&plots, ImageFormat::Svg);
        config.create_output_dir = true;
        run(LOG, &config).unwrap();
        assert_eq!(files_in(&plots).len(), 2);
    }

    #[test]
    fn zero_bins_is_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), ImageFormat::Svg);
        config.bins = 0;
        assert!(matches!(run(LOG, &config), Err(ReportError::InvalidBins)));
    }

    #[test]
    fn file_name_encodes_mode_and_group() {
        let key = GroupKey::new("3", "1", "local");
        assert_eq!(
            output_file_name(Mode::Latency, "cpu_node", &key, ImageFormat::Png),
            "hist_latency_cpu_node_3_numa_node_1_region_local.png"
        );
    }

    #[test]
    fn manifest_lists_every_group() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run(LOG, &config(dir.path(), ImageFormat::Svg)).unwrap();
        let manifest = dir.path().join("manifest.json");
        crate::logging::write_manifest(&manifest, &summary).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
        assert_eq!(json["mode"], "latency");
        assert_eq!(json["records"], 3);
        assert_eq!(json["groups"].as_array().unwrap().len(), 8);
        assert_eq!(json["groups"][0]["outcome"]["status"], "plotted");
        assert_eq!(json["groups"][0]["outcome"]["samples"], 2);
        assert_eq!(json["groups"][1]["outcome"]["status"], "empty");
    }
}
