//! Construction-time configuration for work queues.

use crate::errors::{QueueError, Result};

use super::work_queue::{Consumer, Producer, WorkQueue};

/// Default number of items moved per lock acquisition.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default initial allocation of the shared buffer, in items.
pub const DEFAULT_CAPACITY_HINT: usize = 1024;

/// Throttling bounds for a work queue.
///
/// A producer that raises the queue to `high` items or more blocks until the
/// consumer has drained it back down to `low` or fewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermarks {
    low: usize,
    high: usize,
}

impl Watermarks {
    /// Create throttling bounds.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidWatermarks`] unless `low < high`.
    ///
    /// # Example
    ///
    /// ```
    /// use seqpipe_lib::queue::Watermarks;
    ///
    /// assert!(Watermarks::new(10, 100).is_ok());
    /// assert!(Watermarks::new(100, 100).is_err());
    /// ```
    pub fn new(low: usize, high: usize) -> Result<Self> {
        if low >= high {
            return Err(QueueError::InvalidWatermarks { low, high });
        }
        Ok(Self { low, high })
    }

    /// Size at or below which a throttled producer resumes.
    #[must_use]
    pub fn low(&self) -> usize {
        self.low
    }

    /// Size at or above which the producer is throttled.
    #[must_use]
    pub fn high(&self) -> usize {
        self.high
    }
}

/// Configuration for a single work queue.
///
/// Batching and throttling are independent: either, both or neither may be
/// enabled. Neither changes what the consumer observes, only when the
/// producer may block and how often the shared lock is taken.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Initial allocation of the shared buffer, in items.
    pub capacity_hint: usize,
    /// Optional throttling bounds; `None` lets the queue grow freely.
    pub watermarks: Option<Watermarks>,
    /// Items moved per lock acquisition on each side; 1 disables staging.
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity_hint: DEFAULT_CAPACITY_HINT,
            watermarks: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl QueueConfig {
    /// An unbounded queue with the default batch size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staging batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable throttling with the given bounds.
    #[must_use]
    pub fn with_watermarks(mut self, watermarks: Watermarks) -> Self {
        self.watermarks = Some(watermarks);
        self
    }

    /// Set the initial allocation of the shared buffer.
    #[must_use]
    pub fn with_capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }

    /// Check the configuration without building a queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidParameter`] if the batch size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(QueueError::InvalidParameter {
                parameter: "batch_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Build a queue and return its two ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, see [`QueueConfig::validate`].
    ///
    /// # Example
    ///
    /// ```
    /// use seqpipe_lib::queue::{QueueConfig, Watermarks};
    ///
    /// # fn main() -> seqpipe_lib::errors::Result<()> {
    /// let config = QueueConfig::new().with_batch_size(8).with_watermarks(Watermarks::new(16, 64)?);
    /// let (mut producer, mut consumer) = config.build::<u32>()?;
    ///
    /// producer.push(7);
    /// producer.close();
    ///
    /// assert!(consumer.is_alive());
    /// assert_eq!(consumer.pop_front(), 7);
    /// assert!(!consumer.is_alive());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build<T>(&self) -> Result<(Producer<T>, Consumer<T>)> {
        self.validate()?;
        Ok(WorkQueue::pair(self))
    }
}
