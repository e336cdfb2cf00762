//! Errors that abort an analysis run.
//!
//! Only failures to obtain input text live here. Missing schemas, unknown
//! tables and statements without filters are reported as
//! [`MatchResult::Warning`](crate::advisor::MatchResult) records instead.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is not valid UTF-8")]
    Decode { name: String },

    #[error("failed to expand archive {name}: {message}")]
    Archive { name: String, message: String },

    #[error("invalid input pattern: {0}")]
    InvalidPattern(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AdvisorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AdvisorError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that happened while reading or decoding an input blob.
    pub fn is_input_failure(&self) -> bool {
        matches!(
            self,
            AdvisorError::Io { .. } | AdvisorError::Decode { .. } | AdvisorError::Archive { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = AdvisorError::io(
            "progs/order.p",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("progs/order.p"));
        assert!(msg.contains("gone"));
        assert!(err.is_input_failure());
    }

    #[test]
    fn test_config_error_is_not_input_failure() {
        let err = AdvisorError::Config("max_index_fields must be positive".to_string());
        assert!(!err.is_input_failure());
        assert_eq!(
            err.to_string(),
            "configuration error: max_index_fields must be positive"
        );
    }
}
