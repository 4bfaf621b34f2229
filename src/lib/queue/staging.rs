//! Producer- and consumer-side staging buffers.
//!
//! Each side of a work queue keeps a small private buffer so that items cross
//! the shared mutex several at a time instead of one by one. The buffers are
//! allocated once per handle and reused: a transfer drains them, it never
//! replaces them.
//!
//! ```text
//! producer ──push──> FeedBuffer ══batch══> shared VecDeque ══batch══> DrainBuffer ──pop──> consumer
//!                    (no lock)              (mutex held)               (no lock)
//! ```

use std::collections::VecDeque;

/// Producer-side buffer that accumulates pushed items until a batch is full.
#[derive(Debug)]
pub(crate) struct FeedBuffer<T> {
    items: Vec<T>,
    batch_size: usize,
}

impl<T> FeedBuffer<T> {
    pub(crate) fn new(batch_size: usize) -> Self {
        debug_assert!(batch_size > 0, "batch size must be at least 1");
        Self { items: Vec::with_capacity(batch_size), batch_size }
    }

    /// Stage an item, returning `true` once the buffer holds a full batch.
    #[inline]
    pub(crate) fn stage(&mut self, item: T) -> bool {
        self.items.push(item);
        self.items.len() >= self.batch_size
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Move every staged item, oldest first, onto the back of `dest`.
    ///
    /// Returns the number of items moved. The buffer keeps its allocation.
    pub(crate) fn drain_into(&mut self, dest: &mut VecDeque<T>) -> usize {
        let moved = self.items.len();
        dest.extend(self.items.drain(..));
        moved
    }

    /// Drop every staged item, returning how many were dropped.
    pub(crate) fn discard(&mut self) -> usize {
        let dropped = self.items.len();
        self.items.clear();
        dropped
    }
}

/// Consumer-side buffer refilled from the shared queue one batch at a time.
#[derive(Debug)]
pub(crate) struct DrainBuffer<T> {
    items: VecDeque<T>,
    batch_size: usize,
}

impl<T> DrainBuffer<T> {
    pub(crate) fn new(batch_size: usize) -> Self {
        debug_assert!(batch_size > 0, "batch size must be at least 1");
        Self { items: VecDeque::with_capacity(batch_size), batch_size }
    }

    /// Take up to one batch from the front of `src`, preserving order.
    ///
    /// Returns the number of items taken.
    pub(crate) fn refill_from(&mut self, src: &mut VecDeque<T>) -> usize {
        let take = self.batch_size.min(src.len());
        self.items.extend(src.drain(..take));
        take
    }

    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
