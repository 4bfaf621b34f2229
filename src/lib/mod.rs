#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: Counters and lengths move between usize, u64 and f64
// - missing_*_doc: Documentation improvements tracked separately
// - needless_pass_by_value: Stage helpers take queue handles by value to own their lifetime
// - items_after_statements: Some test code uses late item declarations
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::items_after_statements,
    clippy::redundant_closure_for_method_calls,
    clippy::uninlined_format_args
)]

//! # seqpipe - bounded work queues for threaded pipelines
//!
//! This library provides a blocking single-producer/single-consumer queue and
//! the conventions for chaining such queues into a pipeline of stages, one OS
//! thread per stage.
//!
//! ## Overview
//!
//! ### Core Functionality
//!
//! - **[`queue`]** - The work queue: close/drain protocol, optional watermark
//!   throttling and batched transfers
//! - **[`pipeline`]** - Named stage threads, stage helpers and ordered joins
//!
//! ### Utilities
//!
//! - **[`validation`]** - Parameter and input file checks
//! - **[`progress`]** - Interval progress logging
//! - **[`logging`]** - Formatting helpers and summaries
//! - **[`metrics`]** - Length statistics for relayed items
//! - **[`errors`]** - Error types
//!
//! ## Quick Start
//!
//! ```
//! use seqpipe_lib::queue::{QueueConfig, Watermarks};
//! use std::thread;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = QueueConfig::new().with_batch_size(16).with_watermarks(Watermarks::new(64, 256)?);
//! let (mut tx, mut rx) = config.build::<u64>()?;
//!
//! let producer = thread::spawn(move || {
//!     for i in 0..1000 {
//!         tx.push(i);
//!     }
//!     tx.close();
//! });
//!
//! let mut expected = 0;
//! while rx.is_alive() {
//!     assert_eq!(rx.pop_front(), expected);
//!     expected += 1;
//! }
//! producer.join().unwrap();
//! assert_eq!(expected, 1000);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod validation;
