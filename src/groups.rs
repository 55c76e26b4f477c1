//! Partitioning of records into (cpu, numa node, region) groups.

use crate::error::Result;
use crate::records::MeasurementRecord;
use serde::Serialize;
use std::fmt;

pub const NUMA_FIELD: &str = "numa_node";
pub const REGION_FIELD: &str = "region";
pub const METRIC_FIELD: &str = "metric";
pub const UNITS_FIELD: &str = "units";

/// One histogram's worth of records is selected by this triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    pub primary: String,
    pub numa_node: String,
    pub region: String,
}

impl GroupKey {
    pub fn new(primary: &str, numa_node: &str, region: &str) -> Self {
        Self {
            primary: primary.to_string(),
            numa_node: numa_node.to_string(),
            region: region.to_string(),
        }
    }

    /// Exact string match on all three axes
    pub fn matches(&self, record: &MeasurementRecord, primary_field: &str) -> bool {
        record.get(primary_field) == Some(self.primary.as_str())
            && record.get(NUMA_FIELD) == Some(self.numa_node.as_str())
            && record.get(REGION_FIELD) == Some(self.region.as_str())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, numa_node {}, region {})",
            self.primary, self.numa_node, self.region
        )
    }
}

/// Distinct values of each axis, in the order they first appear
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAxes {
    pub primary: Vec<String>,
    pub numa_nodes: Vec<String>,
    pub regions: Vec<String>,
}

impl GroupAxes {
    /// Every combination of axis values: primary outermost, region innermost.
    /// Combinations that never occur together in the data are included.
    pub fn keys(&self) -> impl Iterator<Item = GroupKey> + '_ {
        self.primary.iter().flat_map(move |primary| {
            self.numa_nodes.iter().flat_map(move |numa_node| {
                self.regions
                    .iter()
                    .map(move |region| GroupKey::new(primary, numa_node, region))
            })
        })
    }

    /// Size of the cross-product
    pub fn combinations(&self) -> usize {
        self.primary.len() * self.numa_nodes.len() * self.regions.len()
    }
}

/// Scan the records once and collect the distinct values of each axis
pub fn extract_axes(records: &[MeasurementRecord], primary_field: &str) -> Result<GroupAxes> {
    let mut axes = GroupAxes {
        primary: Vec::new(),
        numa_nodes: Vec::new(),
        regions: Vec::new(),
    };

    for record in records {
        push_unique(&mut axes.primary, record.require(primary_field)?);
        push_unique(&mut axes.numa_nodes, record.require(NUMA_FIELD)?);
        push_unique(&mut axes.regions, record.require(REGION_FIELD)?);
    }

    Ok(axes)
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Records belonging to `key`, in input order
pub fn filter_group<'a, I>(records: I, primary_field: &str, key: &GroupKey) -> Vec<&'a MeasurementRecord>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    records
        .into_iter()
        .filter(|record| key.matches(record, primary_field))
        .collect()
}
