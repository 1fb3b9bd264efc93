//! Custom error types for fsort operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fsort operations
pub type Result<T> = std::result::Result<T, FsortError>;

/// Error type for fsort operations
#[derive(Error, Debug)]
pub enum FsortError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// Input file missing or not usable
    #[error("Invalid {description} '{path}': {reason}")]
    InvalidInput {
        /// Human-readable description of the file (e.g. "Input file")
        description: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// A line is longer than the configured maximum line length
    #[error("Line {line_number} of '{source_name}' exceeds the maximum line length of {max_len} bytes")]
    LineTooLong {
        /// Name of the input the line came from
        source_name: String,
        /// 1-based line number of the offending line
        line_number: u64,
        /// The configured bound
        max_len: usize,
    },

    /// A spilled run could not be decoded during the merge
    #[error("Corrupt run file '{}': {reason}", path.display())]
    CorruptRun {
        /// Path to the run file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
