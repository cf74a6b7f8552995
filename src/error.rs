use std::path::PathBuf;

use thiserror::Error;

/// Every way a timesheet run can fail. All of them are fatal.
#[derive(Debug, Error)]
pub enum TimesheetError {
    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value for `{key}`: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("cannot write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl TimesheetError {
    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TimesheetError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimesheetError>;
