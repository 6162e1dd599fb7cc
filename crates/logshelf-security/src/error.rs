//! Error types for logshelf-security

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedactError>;

#[derive(Error, Debug)]
pub enum RedactError {
    #[error("Invalid pattern {tag}: {source}")]
    InvalidPattern {
        tag: String,
        #[source]
        source: regex::Error,
    },

    #[error("Line {line} exceeds the maximum line length of {limit} bytes")]
    LineTooLong { line: u64, limit: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redacted stream was dropped before the producer finished")]
    ConsumerClosed,

    #[error("Redaction stats were never delivered")]
    StatsUnavailable,
}
