//! Custom error types for seqpipe operations.
//!
//! Only recoverable conditions live here: bad configuration and stage failures
//! detected while joining a pipeline. Misusing a queue handle (pushing after
//! close, popping without a successful `is_alive`) is a panic, see
//! [`crate::queue`].

use thiserror::Error;

/// Result type alias for seqpipe operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Error type for seqpipe operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// Throttling bounds that cannot work: the low watermark must sit strictly below the high one
    #[error("Invalid watermarks: low ({low}) must be less than high ({high})")]
    InvalidWatermarks {
        /// The requested low watermark
        low: usize,
        /// The requested high watermark
        high: usize,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// A required input file is missing
    #[error("{description} '{path}' does not exist")]
    MissingFile {
        /// Human-readable description of the file (e.g., "Input file")
        description: String,
        /// Path to the file
        path: String,
    },

    /// A pipeline stage thread panicked
    #[error("Stage '{stage}' panicked: {message}")]
    StagePanicked {
        /// The stage name
        stage: String,
        /// The panic message, if one could be recovered
        message: String,
    },

    /// The operating system refused to start a stage thread
    #[error("Failed to spawn stage '{stage}'")]
    StageSpawn {
        /// The stage name
        stage: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
