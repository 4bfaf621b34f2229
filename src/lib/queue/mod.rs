//! Bounded single-producer/single-consumer work queues.
//!
//! This module provides the hand-off primitive every pipeline stage is built
//! on: a FIFO queue with exactly one producing and one consuming thread,
//! graceful shutdown, and optional high/low watermark throttling.
//!
//! # Key Types
//!
//! - [`QueueConfig`] / [`Watermarks`]: construction-time options
//! - [`Producer`] / [`Consumer`]: the two ends of one queue
//! - [`QueueStats`]: counters for logging and tuning
//!
//! Internally each end keeps a staging buffer (see `staging`) so items cross
//! the shared lock in batches; this never changes the order or the number of
//! items the consumer sees.

mod config;
mod staging;
mod work_queue;

pub use config::{DEFAULT_BATCH_SIZE, DEFAULT_CAPACITY_HINT, QueueConfig, Watermarks};
pub use work_queue::{Consumer, Producer, QueueState, QueueStats, work_queue};
