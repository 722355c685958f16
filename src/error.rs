//! Error types for loading and normalizing headline data.
//!
//! Only conditions that make the whole batch meaningless surface here. Row-level
//! problems (unparseable dates, malformed CSV lines) are absorbed by the
//! pipeline and reported through [`crate::loader::LoadReport`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while configuring or running a load.
#[derive(Debug, Error)]
pub enum NewsError {
    /// A file could not be opened, read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV header row could not be decoded, or a writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A column required by the pipeline, or requested through `usecols`, is missing.
    #[error("input is missing column `{0}`")]
    MissingColumn(String),

    /// The configured civil timezone is not a known IANA name.
    #[error("unknown timezone `{name}`: {reason}")]
    InvalidTimezone { name: String, reason: String },

    /// The YAML settings file could not be parsed.
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A cached snapshot is present but inconsistent.
    #[error("snapshot is invalid: {0}")]
    Snapshot(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking CSV task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl NewsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NewsError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message() {
        let err = NewsError::MissingColumn("publisher".to_string());
        assert_eq!(err.to_string(), "input is missing column `publisher`");
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = NewsError::io(
            "data/raw.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("data/raw.csv"));
        assert!(msg.contains("gone"));
    }
}
