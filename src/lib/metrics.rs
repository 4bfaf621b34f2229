//! Running length statistics for items flowing through a stage.
//!
//! A statistics stage feeds one length per item into [`LengthStats`] and
//! asks for a [`LengthSummary`] once its input queue has drained.

/// Accumulates item lengths for mean, median and standard deviation.
#[derive(Debug, Clone, Default)]
pub struct LengthStats {
    lengths: Vec<usize>,
    sum: u128,
    sum_sq: u128,
}

/// Summary of a length distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthSummary {
    /// Number of lengths recorded.
    pub count: u64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Element at rank `count / 2` (the upper median for even counts).
    pub median: usize,
    /// Sample standard deviation; 0 for a single observation.
    pub std_dev: f64,
}

impl LengthStats {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one length.
    pub fn record(&mut self, length: usize) {
        let value = length as u128;
        self.lengths.push(length);
        self.sum += value;
        self.sum_sq += value * value;
    }

    /// Number of lengths recorded so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lengths.len() as u64
    }

    /// Summarise the lengths recorded so far, `None` if there are none.
    ///
    /// # Example
    ///
    /// ```
    /// use seqpipe_lib::metrics::LengthStats;
    ///
    /// let mut stats = LengthStats::new();
    /// for length in [2, 4, 4, 4, 5, 5, 7, 9] {
    ///     stats.record(length);
    /// }
    /// let summary = stats.summary().unwrap();
    /// assert_eq!(summary.count, 8);
    /// assert_eq!(summary.mean, 5.0);
    /// assert_eq!(summary.median, 5);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> Option<LengthSummary> {
        let n = self.lengths.len();
        if n == 0 {
            return None;
        }

        let mut sorted = self.lengths.clone();
        let (_, median, _) = sorted.select_nth_unstable(n / 2);
        let median = *median;

        let count = n as u128;
        let mean = self.sum as f64 / n as f64;
        let std_dev = if n > 1 {
            let numerator = (count * self.sum_sq - self.sum * self.sum) as f64;
            (numerator / (count * (count - 1)) as f64).sqrt()
        } else {
            0.0
        };

        Some(LengthSummary { count: n as u64, mean, median, std_dev })
    }
}
