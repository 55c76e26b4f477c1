//! Loading of benchmark CSV logs.
//!
//! The format is the plain comma-separated output of the benchmark runner:
//! a header line naming the fields, then one measurement per line. There is
//! no quoting or escaping, so a comma always separates two fields.

use crate::config::RowPolicy;
use crate::error::{ReportError, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// One data row, keyed by header field name
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    /// 1-based line number in the source file
    pub line: usize,
    values: HashMap<String, String>,
}

impl MeasurementRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Like [`get`](Self::get), but a missing field is an error
    pub fn require(&self, field: &str) -> Result<&str> {
        self.get(field).ok_or_else(|| ReportError::MissingField {
            line: self.line,
            field: field.to_string(),
        })
    }
}

/// Header field names plus every record of a log
#[derive(Debug, Clone)]
pub struct Dataset {
    pub field_names: Vec<String>,
    pub records: Vec<MeasurementRecord>,
}

impl Dataset {
    /// The first header field, conventionally the CPU or CPU node column
    pub fn first_field(&self) -> &str {
        self.field_names.first().map(String::as_str).unwrap_or_default()
    }

    /// Fail unless every named column appears in the header
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        for column in columns {
            if !self.field_names.iter().any(|name| name == column) {
                return Err(ReportError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }
}

/// Read and parse a log file
pub fn load_records<P: AsRef<Path>>(path: P, policy: RowPolicy) -> Result<Dataset> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ReportError::FileNotFound(path.to_path_buf()),
        _ => ReportError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ReportError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&text, policy)
}

/// Parse log text that is already in memory
pub fn parse_records(text: &str, policy: RowPolicy) -> Result<Dataset> {
    let mut lines = text.lines().enumerate();

    let header = match lines.next() {
        Some((_, header)) if !header.trim().is_empty() => header,
        _ => return Err(ReportError::EmptyInput),
    };
    let field_names: Vec<String> = split_line(header).into_iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let tokens = split_line(line);
        if policy == RowPolicy::Strict && tokens.len() != field_names.len() {
            return Err(ReportError::MalformedRow {
                line: index + 1,
                expected: field_names.len(),
                found: tokens.len(),
            });
        }
        let values = field_names
            .iter()
            .zip(tokens)
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        records.push(MeasurementRecord {
            line: index + 1,
            values,
        });
    }

    Ok(Dataset {
        field_names,
        records,
    })
}

/// Split on commas; only the last token loses its trailing whitespace
fn split_line(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = line.split(',').collect();
    if let Some(last) = tokens.last_mut() {
        *last = last.trim_end();
    }
    tokens
}
