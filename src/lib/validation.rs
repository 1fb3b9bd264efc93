//! Input validation utilities
//!
//! Validation for command-line parameters and input paths with consistent error messages.
//! All functions report failures through [`crate::errors::FsortError`].

use crate::errors::{FsortError, Result};
use std::fmt::Display;
use std::path::Path;

/// Validate that an input file exists and is a regular file (or something readable
/// like a FIFO, i.e. not a directory).
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Input file")
///
/// # Errors
/// Returns an error if the path does not exist or is a directory
///
/// # Example
/// ```
/// use fsort_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/words.txt", "Input file");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    let reason = if !path_ref.exists() {
        "File does not exist"
    } else if path_ref.is_dir() {
        "Path is a directory"
    } else {
        return Ok(());
    };
    Err(FsortError::InvalidInput {
        description: description.to_string(),
        path: path_ref.display().to_string(),
        reason: reason.to_string(),
    })
}

/// Validate that every input file exists, failing on the first one that does not.
///
/// # Example
/// ```no_run
/// use fsort_lib::validation::validate_files_exist;
/// use std::path::PathBuf;
///
/// let inputs = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
/// validate_files_exist(&inputs, "Input file").unwrap();
/// ```
pub fn validate_files_exist<P: AsRef<Path>>(files: &[P], description: &str) -> Result<()> {
    for path in files {
        validate_file_exists(path, description)?;
    }
    Ok(())
}

/// Validate that a value is at least `min`.
///
/// # Example
/// ```
/// use fsort_lib::validation::validate_at_least;
///
/// validate_at_least(4, 2, "max-open-runs").unwrap();
/// assert!(validate_at_least(1, 2, "max-open-runs").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_at_least<T: Ord + Display>(value: T, min: T, name: &str) -> Result<()> {
    if value < min {
        return Err(FsortError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be >= {min}, got: {value}"),
        });
    }
    Ok(())
}

/// Validate that a value is positive (> 0)
///
/// # Example
/// ```
/// use fsort_lib::validation::validate_positive;
///
/// validate_positive(10, "threads").unwrap();
/// assert!(validate_positive(0, "threads").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(FsortError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}
