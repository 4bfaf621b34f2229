//! Push a numbered sequence through a single queue and verify it arrives intact.
//!
//! The producer thread pushes `items` records, each carrying its sequence number
//! and a fixed marker, then closes the queue. The consumer thread checks that the
//! sequence numbers increase by exactly one, that every marker is intact, and that
//! nothing is missing once the queue drains.

use anyhow::{Result, bail};
use clap::Parser;
use log::info;

use seqpipe_lib::logging::{OperationTimer, log_queue_summary};
use seqpipe_lib::pipeline::{self, Pipeline};
use seqpipe_lib::progress::ProgressTracker;
use seqpipe_lib::queue::Consumer;
use seqpipe_lib::validation::validate_positive;

use crate::commands::command::Command;
use crate::commands::common::QueueOptions;

/// Marker carried by every record; a changed marker means a torn or mixed-up item.
const MARKER: u32 = 7;

/// One record of the stress sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressItem {
    /// Position in the sequence, starting at zero.
    pub i: u64,
    /// Always [`MARKER`].
    pub j: u32,
}

/// Stress a single work queue with a producer and a consumer thread.
#[derive(Debug, Parser)]
#[command(
    name = "stress",
    about = "\x1b[38;5;72m[QUEUE]\x1b[0m          \x1b[36mPush numbered items through one queue and verify order\x1b[0m",
    long_about = r#"
Push a numbered sequence through one work queue and verify it arrives in order.

A producer thread pushes --items records and closes the queue; a consumer thread
drains it and checks that every sequence number follows the previous one. The
command fails if any record is out of order, corrupted, or missing.

Example usage:
  seqpipe stress
  seqpipe stress --items 1000000 --batch-size 1
  seqpipe stress --low-watermark 10 --high-watermark 100
"#
)]
pub struct Stress {
    /// Number of items to push
    #[arg(long = "items", default_value_t = 150_000)]
    pub items: u64,

    /// Queue options
    #[command(flatten)]
    pub queue: QueueOptions,
}

impl Command for Stress {
    fn execute(&self) -> Result<()> {
        let items = validate_positive(self.items, "items")?;
        let config = self.queue.to_config()?;

        let timer = OperationTimer::new("Stressing work queue");
        info!("Starting Stress");
        info!("Items: {items}");
        self.queue.log();

        let (tx, rx) = config.build::<StressItem>()?;

        let mut pipeline = Pipeline::new("stress");
        pipeline.spawn("feeder", move || {
            pipeline::source((0..items).map(|i| StressItem { i, j: MARKER }), tx)
        })?;
        pipeline.spawn("checker", move || verify_sequence(rx, items))?;
        pipeline.join()?;

        timer.log_completion(items);
        Ok(())
    }
}

/// Drain `input`, failing on the first record that breaks the sequence.
///
/// Returns the number of records seen, which must equal `expected`.
pub fn verify_sequence(mut input: Consumer<StressItem>, expected: u64) -> Result<u64> {
    let progress = ProgressTracker::new("checker: verified items");
    let mut next = 0;

    while input.is_alive() {
        let item = input.pop_front();
        if item.i != next {
            bail!("Out of order item: expected {next}, got {}", item.i);
        }
        if item.j != MARKER {
            bail!("Corrupted item {}: marker {} instead of {MARKER}", item.i, item.j);
        }
        next += 1;
        progress.record(1);
    }
    progress.finish();
    log_queue_summary("feeder -> checker", &input.stats());

    if next != expected {
        bail!("Missing items: expected {expected}, received {next}");
    }
    Ok(next)
}
