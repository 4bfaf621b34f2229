//! Input validation utilities
//!
//! Checks for command-line parameters and input paths, all reporting through
//! [`crate::errors::QueueError`] so callers get the parameter name and reason.

use crate::errors::{QueueError, Result};
use crate::queue::Watermarks;
use std::path::Path;

/// Validate that a file exists
///
/// # Errors
/// Returns [`QueueError::MissingFile`] if the path does not exist
///
/// # Example
/// ```
/// use seqpipe_lib::validation::validate_file_exists;
///
/// assert!(validate_file_exists("/nonexistent/lines.txt", "Input file").is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(QueueError::MissingFile {
            description: description.to_string(),
            path: path_ref.display().to_string(),
        });
    }
    Ok(())
}

/// Validate that a count parameter is at least one
///
/// # Errors
/// Returns [`QueueError::InvalidParameter`] if `value` is zero
pub fn validate_positive(value: u64, parameter: &str) -> Result<u64> {
    if value == 0 {
        return Err(QueueError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

/// Turn an optional pair of watermarks into throttling bounds
///
/// Both absent means an unbounded queue. Supplying only one of the two is an
/// error rather than a guess at the other.
///
/// # Errors
/// Returns [`QueueError::InvalidParameter`] if only one watermark is given, or
/// [`QueueError::InvalidWatermarks`] if `low >= high`
///
/// # Example
/// ```
/// use seqpipe_lib::validation::validate_watermarks;
///
/// assert!(validate_watermarks(None, None).unwrap().is_none());
/// assert!(validate_watermarks(Some(10), Some(100)).unwrap().is_some());
/// assert!(validate_watermarks(Some(10), None).is_err());
/// assert!(validate_watermarks(Some(100), Some(10)).is_err());
/// ```
pub fn validate_watermarks(low: Option<usize>, high: Option<usize>) -> Result<Option<Watermarks>> {
    match (low, high) {
        (None, None) => Ok(None),
        (Some(low), Some(high)) => Watermarks::new(low, high).map(Some),
        (Some(_), None) => Err(QueueError::InvalidParameter {
            parameter: "high-watermark".to_string(),
            reason: "required when --low-watermark is given".to_string(),
        }),
        (None, Some(_)) => Err(QueueError::InvalidParameter {
            parameter: "low-watermark".to_string(),
            reason: "required when --high-watermark is given".to_string(),
        }),
    }
}
