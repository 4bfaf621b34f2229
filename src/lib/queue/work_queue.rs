//! Blocking single-producer/single-consumer work queue.
//!
//! A queue is created as a pair of handles, a [`Producer`] and a [`Consumer`],
//! that share ownership of the underlying buffer. Neither handle is `Clone`, so
//! there is exactly one thread on each side for the lifetime of the queue.
//!
//! # Protocol
//!
//! ```text
//! producer thread                      consumer thread
//! ───────────────                      ───────────────
//! push(a)                              while consumer.is_alive() {
//! push(b)                                  let item = consumer.pop_front();
//! ...                                      ...
//! close()                              }
//! ```
//!
//! `is_alive` blocks while the queue is empty and open. After `close`, the
//! consumer still receives every item pushed before it, and only then does
//! `is_alive` return `false` (permanently).
//!
//! # Throttling
//!
//! With [`Watermarks`] configured, a push that leaves `high` or more items in
//! the shared buffer blocks the producer until the consumer has taken it down
//! to `low` or fewer. Staged items are counted only once they reach the shared
//! buffer, so the shared size never exceeds `high + batch_size - 1`.
//!
//! # Misuse
//!
//! Pushing after `close` and popping without a preceding successful
//! `is_alive` are caller bugs and panic.
//!
//! # Disconnection
//!
//! Dropping the [`Consumer`] releases a producer blocked on the high watermark;
//! later pushes are discarded and [`Producer::is_disconnected`] reports it.
//! Dropping the [`Producer`] closes the queue, so a stage that fails or panics
//! never strands its downstream consumer.

use log::warn;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::config::{QueueConfig, Watermarks};
use super::staging::{DrainBuffer, FeedBuffer};

/// Observable lifecycle state of a queue, as seen by its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Open, nothing to consume.
    OpenEmpty,
    /// Open, items available.
    OpenNonEmpty,
    /// Closed, items still to drain.
    ClosedNonEmpty,
    /// Closed and drained. Terminal.
    ClosedEmpty,
}

/// Counters collected over the lifetime of a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Items that reached the shared buffer.
    pub pushed: u64,
    /// Items taken from the shared buffer by the consumer.
    pub popped: u64,
    /// Largest size the shared buffer reached.
    pub peak_len: usize,
    /// Number of times the producer blocked on the high watermark.
    pub throttle_stalls: u64,
    /// Total time the producer spent blocked on the high watermark (milliseconds).
    pub producer_blocked_ms: u64,
    /// Total time the consumer spent waiting for items (milliseconds).
    pub consumer_wait_ms: u64,
}

struct Shared<T> {
    items: VecDeque<T>,
    closed: bool,
    disconnected: bool,
}

#[derive(Default)]
struct Counters {
    pushed: AtomicU64,
    popped: AtomicU64,
    peak_len: AtomicUsize,
    throttle_stalls: AtomicU64,
    producer_blocked_ns: AtomicU64,
    consumer_wait_ns: AtomicU64,
}

/// State shared by the two handles of one queue.
pub(crate) struct WorkQueue<T> {
    shared: Mutex<Shared<T>>,
    /// Signalled when items arrive or the queue closes.
    not_empty: Condvar,
    /// Signalled when the shared size drops to the low watermark, or the consumer leaves.
    drained: Condvar,
    watermarks: Option<Watermarks>,
    /// Mirror of `shared.items.len()`, written under the lock.
    len: AtomicUsize,
    /// Mirror of `shared.closed`, written under the lock after the final transfer.
    closed: AtomicBool,
    /// Mirror of `shared.disconnected`, written under the lock.
    disconnected: AtomicBool,
    counters: Counters,
}

impl<T> WorkQueue<T> {
    /// Create a queue from an already validated configuration.
    pub(crate) fn pair(config: &QueueConfig) -> (Producer<T>, Consumer<T>) {
        let queue = Arc::new(Self {
            shared: Mutex::new(Shared {
                items: VecDeque::with_capacity(config.capacity_hint),
                closed: false,
                disconnected: false,
            }),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
            watermarks: config.watermarks,
            len: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            counters: Counters::default(),
        });

        let producer = Producer {
            queue: Arc::clone(&queue),
            staged: FeedBuffer::new(config.batch_size),
            closed: false,
            warned_disconnected: false,
        };
        let consumer =
            Consumer { queue, staged: DrainBuffer::new(config.batch_size), finished: false, armed: false };
        (producer, consumer)
    }

    /// Move staged items into the shared buffer.
    ///
    /// Returns the shared size afterwards and the number of items discarded
    /// because the consumer is gone.
    fn accept(&self, shared: &mut Shared<T>, staged: &mut FeedBuffer<T>) -> (usize, usize) {
        if shared.disconnected {
            return (shared.items.len(), staged.discard());
        }

        let moved = staged.drain_into(&mut shared.items);
        let len = shared.items.len();
        self.len.store(len, Ordering::Release);
        self.counters.pushed.fetch_add(moved as u64, Ordering::Relaxed);
        self.counters.peak_len.fetch_max(len, Ordering::Relaxed);
        if moved > 0 {
            self.not_empty.notify_one();
        }
        (len, 0)
    }

    /// Move up to one batch from the shared buffer to the consumer.
    fn hand_over(&self, shared: &mut Shared<T>, staged: &mut DrainBuffer<T>) {
        let taken = staged.refill_from(&mut shared.items);
        let len = shared.items.len();
        self.len.store(len, Ordering::Release);
        self.counters.popped.fetch_add(taken as u64, Ordering::Relaxed);

        if let Some(watermarks) = self.watermarks {
            if len <= watermarks.low() {
                self.drained.notify_one();
            }
        }
    }

    /// Block the producer until the shared size is at most `low`.
    fn wait_for_drain(&self, shared: &mut MutexGuard<'_, Shared<T>>, low: usize) {
        self.counters.throttle_stalls.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        while shared.items.len() > low && !shared.disconnected {
            self.drained.wait(shared);
        }
        self.counters.producer_blocked_ns.fetch_add(elapsed_ns(start), Ordering::Relaxed);
    }

    fn record_consumer_wait(&self, since: Option<Instant>) {
        if let Some(start) = since {
            self.counters.consumer_wait_ns.fetch_add(elapsed_ns(start), Ordering::Relaxed);
        }
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn stats(&self) -> QueueStats {
        let counters = &self.counters;
        QueueStats {
            pushed: counters.pushed.load(Ordering::Relaxed),
            popped: counters.popped.load(Ordering::Relaxed),
            peak_len: counters.peak_len.load(Ordering::Relaxed),
            throttle_stalls: counters.throttle_stalls.load(Ordering::Relaxed),
            producer_blocked_ms: counters.producer_blocked_ns.load(Ordering::Relaxed) / 1_000_000,
            consumer_wait_ms: counters.consumer_wait_ns.load(Ordering::Relaxed) / 1_000_000,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ns(start: Instant) -> u64 {
    start.elapsed().as_nanos() as u64
}

/// The sending end of a work queue.
///
/// Dropping the producer closes the queue.
pub struct Producer<T> {
    queue: Arc<WorkQueue<T>>,
    staged: FeedBuffer<T>,
    closed: bool,
    warned_disconnected: bool,
}

impl<T> Producer<T> {
    /// Append an item to the back of the queue.
    ///
    /// The item may sit in the producer's staging buffer until a full batch
    /// has accumulated, or until [`flush`](Self::flush) or
    /// [`close`](Self::close). With throttling enabled this blocks while the
    /// consumer drains the queue down to the low watermark.
    ///
    /// # Panics
    ///
    /// Panics if the queue has already been closed by this producer.
    pub fn push(&mut self, item: T) {
        assert!(!self.closed, "push called on a closed work queue");
        if self.staged.stage(item) {
            self.transfer(true);
        }
    }

    /// Hand every staged item to the consumer now.
    ///
    /// Needed only when the producer is about to wait on something other
    /// than this queue while items are still staged.
    pub fn flush(&mut self) {
        self.transfer(true);
    }

    /// Mark the queue closed after flushing staged items.
    ///
    /// Idempotent. The consumer keeps receiving already queued items and sees
    /// `is_alive() == false` only once they are drained. Closing never blocks
    /// on the high watermark.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut shared = self.queue.shared.lock();
        let (_, discarded) = self.queue.accept(&mut shared, &mut self.staged);
        shared.closed = true;
        self.queue.closed.store(true, Ordering::Release);
        drop(shared);
        self.queue.not_empty.notify_all();

        if discarded > 0 {
            self.warn_disconnected(discarded);
        }
    }

    /// Whether the consumer has been dropped; pushes are discarded from then on.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.queue.disconnected.load(Ordering::Acquire)
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Items in the shared buffer, excluding this producer's staged items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the shared buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items pushed but not yet transferred to the shared buffer.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Snapshot of the queue counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    fn transfer(&mut self, throttle: bool) {
        if self.staged.is_empty() {
            return;
        }

        let mut shared = self.queue.shared.lock();
        let (len, discarded) = self.queue.accept(&mut shared, &mut self.staged);
        if throttle && discarded == 0 {
            if let Some(watermarks) = self.queue.watermarks {
                if len >= watermarks.high() {
                    self.queue.wait_for_drain(&mut shared, watermarks.low());
                }
            }
        }
        drop(shared);

        if discarded > 0 {
            self.warn_disconnected(discarded);
        }
    }

    fn warn_disconnected(&mut self, discarded: usize) {
        if !self.warned_disconnected {
            self.warned_disconnected = true;
            warn!("Work queue consumer is gone; discarding {discarded} item(s) and any further pushes");
        }
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("len", &self.len())
            .field("staged", &self.staged.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// The receiving end of a work queue.
///
/// Dropping the consumer disconnects the queue and releases a throttled producer.
pub struct Consumer<T> {
    queue: Arc<WorkQueue<T>>,
    staged: DrainBuffer<T>,
    /// Set once the closed, empty state has been observed.
    finished: bool,
    /// Set by a successful `is_alive`, cleared by `pop_front`.
    armed: bool,
}

impl<T> Consumer<T> {
    /// Whether another item can be taken with [`pop_front`](Self::pop_front).
    ///
    /// Returns immediately when items are available or the queue is closed
    /// and drained; otherwise blocks until one of those becomes true. Never
    /// consumes an item. Once this returns `false` it always returns `false`.
    pub fn is_alive(&mut self) -> bool {
        self.wait_for_item(None) == Some(true)
    }

    /// Like [`is_alive`](Self::is_alive) but gives up after `timeout`.
    ///
    /// Returns `None` if neither an item nor closure arrived in time. A
    /// timeout too large to represent as a deadline waits without one.
    pub fn is_alive_timeout(&mut self, timeout: Duration) -> Option<bool> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_for_item(Some(deadline)),
            None => Some(self.is_alive()),
        }
    }

    /// Remove and return the oldest item.
    ///
    /// Each successful [`is_alive`](Self::is_alive) permits exactly one call.
    ///
    /// # Panics
    ///
    /// Panics unless the most recent `is_alive` (or `is_alive_timeout`)
    /// returned `true` and no item has been popped since.
    pub fn pop_front(&mut self) -> T {
        assert!(self.armed, "pop_front called without a preceding successful is_alive");
        self.armed = false;
        match self.staged.pop_front() {
            Some(item) => item,
            None => panic!("pop_front called without a preceding successful is_alive"),
        }
    }

    /// Wait for the next item and take it; `None` once the queue is closed and drained.
    pub fn front_and_pop(&mut self) -> Option<T> {
        if self.is_alive() { Some(self.pop_front()) } else { None }
    }

    /// Shared body of the `is_alive` variants; `None` only when `deadline` passes.
    fn wait_for_item(&mut self, deadline: Option<Instant>) -> Option<bool> {
        let alive = match self.poll_without_lock() {
            Some(alive) => Some(alive),
            None => self.wait_locked(deadline),
        };
        if alive == Some(true) {
            self.armed = true;
        }
        alive
    }

    fn wait_locked(&mut self, deadline: Option<Instant>) -> Option<bool> {
        let mut shared = self.queue.shared.lock();
        let mut waiting_since = None;
        loop {
            if !shared.items.is_empty() {
                self.queue.hand_over(&mut shared, &mut self.staged);
                self.queue.record_consumer_wait(waiting_since);
                return Some(true);
            }
            if shared.closed {
                self.finished = true;
                self.queue.record_consumer_wait(waiting_since);
                return Some(false);
            }
            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    self.queue.record_consumer_wait(waiting_since);
                    return None;
                }
                Some(deadline) => {
                    waiting_since.get_or_insert_with(Instant::now);
                    self.queue.not_empty.wait_until(&mut shared, deadline);
                }
                None => {
                    waiting_since.get_or_insert_with(Instant::now);
                    self.queue.not_empty.wait(&mut shared);
                }
            }
        }
    }

    /// Current lifecycle state, counting items staged on the consumer side.
    #[must_use]
    pub fn state(&self) -> QueueState {
        let closed = self.queue.is_closed();
        let empty = self.staged.is_empty() && self.queue.len() == 0;
        match (closed, empty) {
            (false, true) => QueueState::OpenEmpty,
            (false, false) => QueueState::OpenNonEmpty,
            (true, false) => QueueState::ClosedNonEmpty,
            (true, true) => QueueState::ClosedEmpty,
        }
    }

    /// Whether the producer has closed the queue.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Items in the shared buffer, excluding items already staged on this side.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the shared buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items taken from the shared buffer but not yet popped.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Snapshot of the queue counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Answer `is_alive` from local state or the atomic mirrors, if possible.
    fn poll_without_lock(&mut self) -> Option<bool> {
        if !self.staged.is_empty() {
            return Some(true);
        }
        if self.finished {
            return Some(false);
        }
        // `closed` is published after the final transfer, so load it first.
        if self.queue.is_closed() && self.queue.len() == 0 {
            self.finished = true;
            return Some(false);
        }
        None
    }
}

impl<T> Iterator for Consumer<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.front_and_pop()
    }
}

impl<T> std::iter::FusedIterator for Consumer<T> {}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        let mut shared = self.queue.shared.lock();
        shared.disconnected = true;
        self.queue.disconnected.store(true, Ordering::Release);
        let abandoned = shared.items.len() + self.staged.len();
        shared.items.clear();
        self.queue.len.store(0, Ordering::Release);
        drop(shared);
        self.queue.drained.notify_all();

        if abandoned > 0 {
            warn!("Work queue consumer dropped with {abandoned} undelivered item(s)");
        }
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("state", &self.state())
            .field("len", &self.len())
            .field("staged", &self.staged.len())
            .finish_non_exhaustive()
    }
}

/// Create an unbounded queue with the default batch size.
///
/// # Example
///
/// ```
/// use seqpipe_lib::queue::work_queue;
///
/// let (mut producer, consumer) = work_queue::<&str>();
/// let handle = std::thread::spawn(move || consumer.collect::<Vec<_>>());
///
/// producer.push("first");
/// producer.push("second");
/// producer.close();
///
/// assert_eq!(handle.join().unwrap(), vec!["first", "second"]);
/// ```
#[must_use]
pub fn work_queue<T>() -> (Producer<T>, Consumer<T>) {
    WorkQueue::pair(&QueueConfig::default())
}
