//! Error types for the proficiency scanner

use thiserror::Error;

/// Result type for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can abort a scan
///
/// Everything else (unreadable files, git timeouts, malformed config) is
/// absorbed by the scanner and shows up as zeroed fields in the result.
#[derive(Error, Debug)]
pub enum ScanError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository root is missing or not a directory
    #[error("Invalid repository path: {0}")]
    InvalidRepositoryPath(String),

    /// A glob in the level rule set failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A custom rule set is not a contiguous 1-8 ladder
    #[error("Invalid rule set: {0}")]
    InvalidRuleSet(String),

    /// Failed to parse a configuration file
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// Failed to serialize or parse JSON
    #[error("Failed to process JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}
