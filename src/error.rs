use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{dataset} dataset has no column named {column:?} (columns: {available})")]
    MissingColumn {
        dataset: &'static str,
        column: String,
        available: String,
    },
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to allocate shared key segment in {dir}: {source}")]
    Allocate {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to attach shared key segment {name}: {source}")]
    Attach {
        name: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shared key segment {name} holds {actual} bytes, expected {expected}")]
    ShapeMismatch {
        name: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("key {index} is {len} bytes wide but the segment width is {width}")]
    KeyTooWide {
        index: usize,
        len: usize,
        width: usize,
    },
    #[error("failed to release shared key segment {name}: {source}")]
    Release {
        name: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("worker could not attach key segment {name}: {reason}")]
    Attach { name: PathBuf, reason: String },
    #[error("best match index {index} is outside the reference table ({len} records)")]
    ReferenceOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
}
