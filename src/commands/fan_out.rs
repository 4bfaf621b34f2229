//! Feed several independent queues from one producer.
//!
//! A feeder pushes a numbered sequence into one queue; a fan-out stage copies
//! every item onto `outputs` queues, each drained by its own consumer. Consumer 0
//! can be slowed down to show that each output queue throttles on its own while
//! every consumer still receives the whole sequence in order.

use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use log::info;

use seqpipe_lib::logging::{OperationTimer, log_queue_summary};
use seqpipe_lib::pipeline::{self, Pipeline};
use seqpipe_lib::queue::Consumer;
use seqpipe_lib::validation::validate_positive;

use crate::commands::command::Command;
use crate::commands::common::QueueOptions;

/// Copy one stream onto several queues and verify every copy.
#[derive(Debug, Parser)]
#[command(
    name = "fan-out",
    about = "\x1b[38;5;72m[QUEUE]\x1b[0m          \x1b[36mFeed several independent queues from one producer\x1b[0m",
    long_about = r#"
Feed several independent work queues from one producer.

A feeder pushes --items numbered items to a fan-out stage, which copies each one
onto --outputs queues. Every output queue has its own consumer, and each consumer
must receive the full sequence in order. Use --slow-consumer-delay-us to slow the
first consumer down; with watermarks set, only that consumer's queue throttles.

Example usage:
  seqpipe fan-out --outputs 3
  seqpipe fan-out --outputs 2 --slow-consumer-delay-us 5 --low-watermark 64 --high-watermark 512
"#
)]
pub struct FanOut {
    /// Number of output queues
    #[arg(short = 'k', long = "outputs", default_value_t = 2)]
    pub outputs: u64,

    /// Number of items to push
    #[arg(long = "items", default_value_t = 100_000)]
    pub items: u64,

    /// Delay per item for the first consumer, in microseconds
    #[arg(long = "slow-consumer-delay-us", default_value_t = 0)]
    pub slow_consumer_delay_us: u64,

    /// Queue options
    #[command(flatten)]
    pub queue: QueueOptions,
}

impl Command for FanOut {
    fn execute(&self) -> Result<()> {
        let outputs = validate_positive(self.outputs, "outputs")?;
        let items = validate_positive(self.items, "items")?;
        let config = self.queue.to_config()?;

        let timer = OperationTimer::new("Fanning out items");
        info!("Starting FanOut");
        info!("Items: {items}");
        info!("Output queues: {outputs}");
        if self.slow_consumer_delay_us > 0 {
            info!("Consumer 0 delay: {}us per item", self.slow_consumer_delay_us);
        }
        self.queue.log();

        let (feed_tx, feed_rx) = config.build::<u64>()?;
        let mut producers = Vec::new();
        let mut consumers = Vec::new();
        for _ in 0..outputs {
            let (tx, rx) = config.build::<u64>()?;
            producers.push(tx);
            consumers.push(rx);
        }

        let mut pipeline = Pipeline::new("fan-out");
        pipeline.spawn("feeder", move || pipeline::source(0..items, feed_tx))?;
        pipeline.spawn("splitter", move || pipeline::fan_out(feed_rx, producers))?;
        for (index, rx) in consumers.into_iter().enumerate() {
            let delay = if index == 0 { self.slow_consumer_delay_us } else { 0 };
            let name = format!("consumer-{index}");
            let stage_name = name.clone();
            pipeline.spawn(&name, move || {
                consume_in_order(rx, items, Duration::from_micros(delay), &stage_name)
            })?;
        }
        let report = pipeline.join()?;

        for stage in report.stages.iter().filter(|s| s.name.starts_with("consumer-")) {
            info!("{} received {} items", stage.name, stage.items);
        }
        timer.log_completion(items * outputs);
        Ok(())
    }
}

/// Drain `input`, checking it yields `0..expected` in order.
fn consume_in_order(mut input: Consumer<u64>, expected: u64, delay: Duration, name: &str) -> Result<u64> {
    let mut next = 0;
    while input.is_alive() {
        let item = input.pop_front();
        if item != next {
            bail!("{name}: expected item {next}, got {item}");
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        next += 1;
    }
    log_queue_summary(&format!("splitter -> {name}"), &input.stats());

    if next != expected {
        bail!("{name}: expected {expected} items, received {next}");
    }
    Ok(next)
}
