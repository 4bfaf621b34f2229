//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;

use seqpipe_lib::queue::{DEFAULT_BATCH_SIZE, QueueConfig};
use seqpipe_lib::validation::{validate_file_exists, validate_watermarks};

/// Queue tuning options applied to every queue a command creates.
#[derive(Debug, Clone, Args)]
pub struct QueueOptions {
    /// Items moved per lock acquisition; 1 disables batching
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Queue depth at or below which a throttled producer resumes
    #[arg(long = "low-watermark", requires = "high_watermark")]
    pub low_watermark: Option<usize>,

    /// Queue depth at or above which the producer blocks
    #[arg(long = "high-watermark", requires = "low_watermark")]
    pub high_watermark: Option<usize>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, low_watermark: None, high_watermark: None }
    }
}

impl QueueOptions {
    /// Builds the queue configuration these options describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch size is zero, only one watermark is
    /// given, or the low watermark is not below the high watermark.
    pub fn to_config(&self) -> Result<QueueConfig> {
        let mut config = QueueConfig::new().with_batch_size(self.batch_size);
        if let Some(watermarks) = validate_watermarks(self.low_watermark, self.high_watermark)? {
            config = config.with_watermarks(watermarks);
        }
        config.validate()?;
        Ok(config)
    }

    /// Logs the effective queue settings.
    pub fn log(&self) {
        info!("Batch size: {}", self.batch_size);
        match (self.low_watermark, self.high_watermark) {
            (Some(low), Some(high)) => info!("Watermarks: low {low}, high {high}"),
            _ => info!("Watermarks: none (unbounded queues)"),
        }
    }
}

/// Plain-text input and optional output.
#[derive(Debug, Clone, Args)]
pub struct TextIoOptions {
    /// Input text file, one item per line
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output text file
    #[arg(short = 'o', long = "output", required_unless_present = "dry_run")]
    pub output: Option<PathBuf>,

    /// Run every stage but write nothing
    #[arg(short = 'n', long = "dry-run", default_value = "false")]
    pub dry_run: bool,
}

impl TextIoOptions {
    /// Validates that the input file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the input file does not exist.
    pub fn validate(&self) -> Result<()> {
        validate_file_exists(&self.input, "Input file")?;
        Ok(())
    }

    /// The output path, unless this is a dry run.
    pub fn output_path(&self) -> Option<&PathBuf> {
        if self.dry_run { None } else { self.output.as_ref() }
    }
}
