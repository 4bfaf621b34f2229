//! CLI command implementations for seqpipe.
//!
//! # Queue checks
//! - [`stress`] - Push numbered items through one queue and verify order
//! - [`fan_out`] - Feed several independent queues from one producer
//!
//! # Pipelines
//! - [`relay`] - Read, clean, measure and write text lines on four threads

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod fan_out;
pub mod relay;
pub mod stress;
