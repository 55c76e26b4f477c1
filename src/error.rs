//! Error types for loading, grouping and plotting benchmark logs.

use std::path::PathBuf;
use thiserror::Error;

use crate::groups::GroupKey;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a UTF-8 text file: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("input has no header line")]
    EmptyInput,

    #[error("header has no column named '{0}'")]
    MissingColumn(String),

    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: no value for field '{field}'")]
    MissingField { line: usize, field: String },

    #[error("line {line}: metric value '{value}' is not a finite number")]
    NumericParse { line: usize, value: String },

    #[error("no records for group {0}")]
    EmptyGroup(GroupKey),

    #[error("bin count must be at least 1")]
    InvalidBins,

    #[error("failed to render {}: {reason}", path.display())]
    Render { path: PathBuf, reason: String },

    #[error("failed to write {}: {reason}", path.display())]
    OutputWrite { path: PathBuf, reason: String },
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
