//! Thread-per-stage pipelines connected by work queues.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  A  ┌──────────┐  B  ┌──────────┐
//! │  reader  │────>│ cleaner  │────>│  writer  │
//! └──────────┘     └──────────┘     └──────────┘
//!                        │  C  ┌──────────┐
//!                        └────>│  stats   │
//!                              └──────────┘
//! ```
//!
//! Every box is a stage running on its own OS thread; every arrow is one
//! [`crate::queue`] SPSC queue. Each stage owns the `Consumer` of its input and
//! the `Producer` of each of its outputs, so ownership alone guarantees one
//! thread per side.
//!
//! # Shutdown protocol
//!
//! A stage loops while its input `is_alive`, then closes every output and
//! returns. Closing cascades downstream until the last stage drains. A stage
//! that fails drops its handles instead: its outputs close and its input
//! disconnects, so neither neighbour can block forever on it.
//!
//! [`Pipeline::join`] joins stages in the order they were spawned, which is
//! the pipeline direction, and always waits for all of them before reporting
//! the first failure.

pub mod stages;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use std::any::Any;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::errors::QueueError;
use crate::logging::{format_count, format_duration};

pub use stages::{fan_out, filter_map, sink, source, transform, try_source};

/// Outcome of one successfully completed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Stage name as given to [`Pipeline::spawn`].
    pub name: String,
    /// Items the stage reported handling.
    pub items: u64,
    /// Wall time from spawn to completion.
    pub elapsed: Duration,
}

/// Reports for every stage of a completed pipeline, in join order.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// One entry per stage.
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Items handled by the named stage, if it exists.
    #[must_use]
    pub fn items(&self, stage: &str) -> Option<u64> {
        self.stages.iter().find(|report| report.name == stage).map(|report| report.items)
    }
}

struct RunningStage {
    name: String,
    started: Instant,
    handle: JoinHandle<Result<(u64, Instant)>>,
}

/// A set of named stage threads joined in spawn order.
///
/// # Example
///
/// ```
/// use seqpipe_lib::pipeline::{self, Pipeline};
/// use seqpipe_lib::queue::work_queue;
///
/// # fn main() -> anyhow::Result<()> {
/// let (numbers_tx, numbers_rx) = work_queue::<u32>();
/// let (doubled_tx, doubled_rx) = work_queue::<u32>();
///
/// let mut pipeline = Pipeline::new("doubler");
/// pipeline.spawn("source", move || pipeline::source(1..=3, numbers_tx))?;
/// pipeline.spawn("double", move || pipeline::transform(numbers_rx, doubled_tx, |n| Ok(n * 2)))?;
/// let collected = pipeline.spawn_collect("collect", doubled_rx)?;
///
/// let report = pipeline.join()?;
/// assert_eq!(report.items("double"), Some(3));
/// assert_eq!(collected.recv()?, vec![2, 4, 6]);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    name: String,
    stages: Vec<RunningStage>,
}

impl Pipeline {
    /// Create an empty pipeline; `name` prefixes the stage thread names.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), stages: Vec::new() }
    }

    /// Start a stage on its own thread.
    ///
    /// The closure returns the number of items it handled. Stages must be
    /// spawned in pipeline order, upstream first, because that is the order
    /// [`join`](Self::join) waits in.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::StageSpawn`] if the thread cannot be created. The
    /// closure is dropped in that case, which closes and disconnects any
    /// queue handles it owned.
    pub fn spawn<F>(&mut self, name: &str, stage: F) -> crate::errors::Result<()>
    where
        F: FnOnce() -> Result<u64> + Send + 'static,
    {
        let thread_name = format!("{}-{}", self.name, name);
        debug!("Spawning stage thread '{thread_name}'");

        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || stage().map(|items| (items, Instant::now())))
            .map_err(|source| QueueError::StageSpawn { stage: name.to_string(), source })?;

        self.stages.push(RunningStage { name: name.to_string(), started: Instant::now(), handle });
        Ok(())
    }

    /// Start a terminal stage that collects everything from `input`.
    ///
    /// The stage is joined with the rest of the pipeline; the returned handle
    /// yields the collected items and never blocks once [`join`](Self::join)
    /// has returned.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::StageSpawn`] if the thread cannot be created.
    pub fn spawn_collect<T: Send + 'static>(
        &mut self,
        name: &str,
        input: crate::queue::Consumer<T>,
    ) -> crate::errors::Result<std::sync::mpsc::Receiver<Vec<T>>> {
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        self.spawn(name, move || {
            let collected: Vec<T> = input.collect();
            let items = collected.len() as u64;
            tx.send(collected).map_err(|_| anyhow!("collector output was dropped"))?;
            Ok(items)
        })?;
        Ok(rx)
    }

    /// Number of stages spawned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether no stage has been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Join every stage in spawn order.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure, in join order, after all stages have
    /// finished. A panic is reported as [`QueueError::StagePanicked`]; a stage
    /// error is wrapped with the stage name as context.
    pub fn join(self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        let mut first_error: Option<anyhow::Error> = None;

        for stage in self.stages {
            let outcome = match stage.handle.join() {
                Ok(Ok((items, finished))) => Ok(StageReport {
                    name: stage.name.clone(),
                    items,
                    elapsed: finished.saturating_duration_since(stage.started),
                }),
                Ok(Err(e)) => Err(e.context(format!("Stage '{}' failed", stage.name))),
                Err(payload) => Err(QueueError::StagePanicked {
                    stage: stage.name.clone(),
                    message: panic_message(payload.as_ref()),
                }
                .into()),
            };

            match outcome {
                Ok(stage_report) => {
                    info!(
                        "[{}] stage '{}' finished: {} items in {}",
                        self.name,
                        stage_report.name,
                        format_count(stage_report.items),
                        format_duration(stage_report.elapsed)
                    );
                    report.stages.push(stage_report);
                }
                Err(e) => {
                    log::error!("[{}] {e:#}", self.name);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e).with_context(|| format!("Pipeline '{}' failed", self.name)),
            None => Ok(report),
        }
    }
}

/// Recover the message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
