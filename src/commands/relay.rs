//! Relay text lines through a five-stage pipeline.
//!
//! ```text
//! reader ──> cleaner ──> stripper ──> writer
//!               │
//!               └──────> stats
//! ```
//!
//! The reader pushes raw lines, the cleaner trims trailing whitespace (and drops
//! blank lines with `--skip-empty`), the stripper removes `--strip-prefix` from
//! the start of each line, the writer writes the result, and the stats stage
//! summarises the cleaned line lengths. Each arrow is its own work queue.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use seqpipe_lib::logging::{OperationTimer, log_length_summary, log_queue_summary};
use seqpipe_lib::metrics::LengthStats;
use seqpipe_lib::pipeline::{self, Pipeline};
use seqpipe_lib::progress::ProgressTracker;
use seqpipe_lib::queue::{Consumer, Producer};

use crate::commands::command::Command;
use crate::commands::common::{QueueOptions, TextIoOptions};

/// Relay lines from one text file to another through separate threads.
#[derive(Debug, Parser)]
#[command(
    name = "relay",
    about = "\x1b[38;5;30m[PIPELINE]\x1b[0m       \x1b[36mClean text lines through a threaded pipeline\x1b[0m",
    long_about = r#"
Relay the lines of a text file through a five-stage threaded pipeline.

The reader, cleaner, stripper, writer and statistics stages each run on their own
thread, connected by work queues. The cleaner removes trailing whitespace and, with
--skip-empty, drops lines that are blank after trimming. The stripper removes
--strip-prefix from the start of every line that carries it. At the end the number
of cleaned lines and their median, mean and standard deviation of length are logged.

Example usage:
  seqpipe relay -i input.txt -o output.txt
  seqpipe relay -i input.txt -n --skip-empty
  seqpipe relay -i input.txt -o output.txt --strip-prefix '>'
  seqpipe relay -i input.txt -o output.txt --low-watermark 1000 --high-watermark 10000
"#
)]
pub struct Relay {
    /// Input/output options
    #[command(flatten)]
    pub io: TextIoOptions,

    /// Drop lines that are empty after trimming
    #[arg(long = "skip-empty", default_value = "false")]
    pub skip_empty: bool,

    /// Remove this prefix from the start of each line that has it
    #[arg(long = "strip-prefix")]
    pub strip_prefix: Option<String>,

    /// Queue options
    #[command(flatten)]
    pub queue: QueueOptions,
}

impl Command for Relay {
    fn execute(&self) -> Result<()> {
        self.io.validate()?;
        let config = self.queue.to_config()?;

        let timer = OperationTimer::new("Relaying lines");
        info!("Starting Relay");
        info!("Input: {}", self.io.input.display());
        match self.io.output_path() {
            Some(output) => info!("Output: {}", output.display()),
            None => info!("Dry run: no output will be written"),
        }
        self.queue.log();

        let reader = BufReader::new(
            File::open(&self.io.input)
                .with_context(|| format!("Failed to open {}", self.io.input.display()))?,
        );
        let writer = self.io.output_path().map(|path| open_writer(path)).transpose()?;

        let (raw_tx, raw_rx) = config.build::<String>()?;
        let (clean_tx, clean_rx) = config.build::<String>()?;
        let (stripped_tx, stripped_rx) = config.build::<String>()?;
        let (length_tx, length_rx) = config.build::<usize>()?;
        let skip_empty = self.skip_empty;
        let prefix = self.strip_prefix.clone().unwrap_or_default();

        let mut pipeline = Pipeline::new("relay");
        pipeline.spawn("reader", move || {
            let progress = ProgressTracker::new("reader: read lines");
            let lines = reader.lines().inspect(|_| {
                progress.record(1);
            });
            let count = pipeline::try_source(lines, raw_tx).context("Failed to read input")?;
            progress.finish();
            Ok(count)
        })?;
        pipeline.spawn("cleaner", move || clean_lines(raw_rx, clean_tx, length_tx, skip_empty))?;
        pipeline.spawn("stripper", move || {
            pipeline::transform(clean_rx, stripped_tx, |line| Ok(strip_prefix(line, &prefix)))
        })?;
        pipeline.spawn("stats", move || collect_lengths(length_rx))?;
        pipeline.spawn("writer", move || write_lines(stripped_rx, writer))?;
        let report = pipeline.join()?;

        let written = report.items("writer").unwrap_or_default();
        let read = report.items("reader").unwrap_or_default();
        if written < read {
            info!("Dropped {} empty lines", read - written);
        }
        timer.log_completion(read);
        Ok(())
    }
}

fn open_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Trim each line and send it to the writer, and its length to the stats stage.
///
/// Returns the number of input lines consumed.
fn clean_lines(
    mut input: Consumer<String>,
    mut lines: Producer<String>,
    mut lengths: Producer<usize>,
    skip_empty: bool,
) -> Result<u64> {
    let mut count = 0;
    while input.is_alive() {
        let mut line = input.pop_front();
        count += 1;

        line.truncate(line.trim_end().len());
        if skip_empty && line.is_empty() {
            continue;
        }
        lengths.push(line.len());
        lines.push(line);
    }
    log_queue_summary("reader -> cleaner", &input.stats());
    lines.close();
    lengths.close();
    Ok(count)
}

/// Remove `prefix` from the start of `line`; an empty prefix leaves it unchanged.
fn strip_prefix(mut line: String, prefix: &str) -> String {
    if !prefix.is_empty() && line.starts_with(prefix) {
        line.drain(..prefix.len());
    }
    line
}

fn collect_lengths(mut input: Consumer<usize>) -> Result<u64> {
    let mut stats = LengthStats::new();
    while input.is_alive() {
        stats.record(input.pop_front());
    }
    log_queue_summary("cleaner -> stats", &input.stats());
    log_length_summary("lines", &stats);
    Ok(stats.count())
}

fn write_lines(input: Consumer<String>, writer: Option<BufWriter<File>>) -> Result<u64> {
    match writer {
        Some(mut writer) => {
            let count = pipeline::sink(input, |line| {
                writeln!(writer, "{line}").context("Failed to write line")
            })?;
            writer.flush().context("Failed to flush output")?;
            Ok(count)
        }
        None => pipeline::sink(input, |_| Ok(())),
    }
}
