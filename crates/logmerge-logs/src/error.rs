use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the log pipeline.
///
/// Only `ConfigLoad`, `InvalidPattern`, `RootUnreadable` and `Cancelled`
/// reach the caller of a run; the rest are contained at the line or file
/// they occur in.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to load pattern config {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid {field} pattern for {component} `{pattern}`: {source}")]
    InvalidPattern {
        component: String,
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("line format for {component} has no `timestamp` group")]
    MissingTimestampGroup { component: String },

    #[error("unparseable timestamp: {0}")]
    UnparseableTimestamp(String),

    #[error("cannot read log root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LogError>;
