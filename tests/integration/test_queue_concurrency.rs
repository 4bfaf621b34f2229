//! Concurrency tests for the work queue.
//!
//! These tests run producer and consumer on separate threads and verify order,
//! completeness and the throttling bound under real contention.
//!
//! # Test categories
//!
//! - **Quick concurrency tests**: always run.
//! - **Property-based tests**: proptest over batch sizes, watermarks and lengths.
//! - **Stress tests**: behind `#[cfg(feature = "stress-tests")]`, run with
//!   `cargo test --features stress-tests`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use seqpipe_lib::queue::{QueueConfig, Watermarks, work_queue};

use crate::helpers::run_with_timeout;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Numbered {
    i: u32,
    j: u32,
}

/// Push `0..count` through a queue built from `config` and return what the
/// consumer saw, in order.
fn relay_sequence(config: &QueueConfig, count: u32) -> Vec<u32> {
    let (mut tx, rx) = config.build::<u32>().expect("valid config");
    let producer = thread::spawn(move || {
        for i in 0..count {
            tx.push(i);
        }
        tx.close();
    });
    let received: Vec<u32> = rx.collect();
    producer.join().expect("Producer panicked");
    received
}

// ============================================================================
// Quick Concurrency Tests
// ============================================================================

/// 150,000 numbered items through a small throttled, batched queue arrive
/// complete and in order.
#[test]
fn test_stress_150k_items_in_order() {
    let result = run_with_timeout(Duration::from_secs(60), || {
        let config =
            QueueConfig::new().with_batch_size(10).with_watermarks(Watermarks::new(10, 100).unwrap());
        let (mut tx, mut rx) = config.build::<Numbered>().unwrap();

        let producer = thread::spawn(move || {
            for i in 0..150_000 {
                tx.push(Numbered { i, j: 7 });
            }
            tx.close();
        });

        let mut next = 0;
        while rx.is_alive() {
            let item = rx.pop_front();
            assert_eq!(item.i, next, "out of order");
            assert_eq!(item.j, 7, "corrupted item");
            next += 1;
        }
        producer.join().expect("Producer panicked");
        next
    });
    assert_eq!(result.expect("stress test hung"), 150_000);
}

/// A producer that closes immediately lets a blocked consumer finish with
/// nothing consumed.
#[test]
fn test_empty_close_releases_waiting_consumer() {
    let result = run_with_timeout(Duration::from_secs(10), || {
        let (mut tx, mut rx) = work_queue::<u32>();
        let consumer = thread::spawn(move || {
            let mut seen = 0;
            while rx.is_alive() {
                rx.pop_front();
                seen += 1;
            }
            seen
        });
        thread::sleep(Duration::from_millis(20));
        tx.close();
        consumer.join().expect("Consumer panicked")
    });
    assert_eq!(result.expect("consumer never woke"), 0);
}

/// The unbatched, unthrottled configuration keeps exact order too.
#[test]
fn test_unbatched_unbounded_order() {
    let config = QueueConfig::new().with_batch_size(1);
    let expected: Vec<u32> = (0..50_000).collect();
    assert_eq!(relay_sequence(&config, 50_000), expected);
}

/// The shared buffer never grows past `high + batch_size - 1` while the
/// consumer is slow.
#[test]
fn test_throttled_peak_stays_bounded() {
    let (low, high, batch) = (16, 64, 8);
    let config =
        QueueConfig::new().with_batch_size(batch).with_watermarks(Watermarks::new(low, high).unwrap());
    let (mut tx, mut rx) = config.build::<u32>().unwrap();

    let producer = thread::spawn(move || {
        for i in 0..5_000 {
            tx.push(i);
        }
        tx.close();
    });

    let mut count = 0;
    while rx.is_alive() {
        rx.pop_front();
        count += 1;
        if count % 500 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    producer.join().unwrap();

    let stats = rx.stats();
    assert_eq!(count, 5_000);
    assert!(stats.peak_len < high + batch, "peak {} exceeded bound", stats.peak_len);
    assert!(stats.throttle_stalls > 0, "a slow consumer should have throttled the producer");
}

/// Two queues fed by one producer thread are drained independently; a slow
/// consumer on one never starves the other of items.
#[test]
fn test_independent_fan_out_queues() {
    let config =
        QueueConfig::new().with_batch_size(4).with_watermarks(Watermarks::new(8, 32).unwrap());
    let (mut fast_tx, fast_rx) = config.build::<u32>().unwrap();
    let (mut slow_tx, slow_rx) = config.build::<u32>().unwrap();
    let fast_done = Arc::new(AtomicUsize::new(0));

    let done = Arc::clone(&fast_done);
    let fast = thread::spawn(move || {
        let items: Vec<u32> = fast_rx.collect();
        done.store(items.len(), Ordering::SeqCst);
        items
    });
    let slow = thread::spawn(move || {
        slow_rx
            .inspect(|i| {
                if i % 50 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            })
            .collect::<Vec<u32>>()
    });

    for i in 0..1_000 {
        fast_tx.push(i);
        slow_tx.push(i);
    }
    fast_tx.close();
    slow_tx.close();

    let expected: Vec<u32> = (0..1_000).collect();
    assert_eq!(fast.join().unwrap(), expected);
    assert_eq!(fast_done.load(Ordering::SeqCst), 1_000);
    assert_eq!(slow.join().unwrap(), expected);
}

/// Dropping the consumer while the producer is blocked on the high watermark
/// releases the producer, and later pushes are discarded.
#[test]
fn test_consumer_drop_unblocks_throttled_producer() {
    let result = run_with_timeout(Duration::from_secs(10), || {
        let config =
            QueueConfig::new().with_batch_size(1).with_watermarks(Watermarks::new(1, 4).unwrap());
        let (mut tx, rx) = config.build::<u32>().unwrap();

        let producer = thread::spawn(move || {
            for i in 0..1_000 {
                tx.push(i);
            }
            tx.is_disconnected()
        });
        thread::sleep(Duration::from_millis(20));
        drop(rx);
        producer.join().expect("Producer panicked")
    });
    assert!(result.expect("throttled producer never released"));
}

/// A consumer waiting with a timeout sees items pushed from another thread.
#[test]
fn test_timeout_wait_sees_late_items() {
    let (mut tx, mut rx) = QueueConfig::new().with_batch_size(1).build::<u32>().unwrap();
    assert_eq!(rx.is_alive_timeout(Duration::from_millis(10)), None);

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        tx.push(42);
        tx.close();
    });
    assert_eq!(rx.is_alive_timeout(Duration::from_secs(5)), Some(true));
    assert_eq!(rx.pop_front(), 42);
    assert_eq!(rx.is_alive_timeout(Duration::from_secs(5)), Some(false));
    producer.join().unwrap();
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Property: every pushed item arrives exactly once, in order, for any
        // batch size (including ones that leave a partial final batch) and
        // any valid watermarks.
        #[test]
        fn proptest_no_loss_under_batching_and_throttling(
            count in 0u32..2_000,
            batch_size in 1usize..64,
            low in 0usize..50,
            gap in 1usize..200,
            throttled in any::<bool>(),
        ) {
            let mut config = QueueConfig::new().with_batch_size(batch_size);
            if throttled {
                config = config.with_watermarks(Watermarks::new(low, low + gap).unwrap());
            }
            let expected: Vec<u32> = (0..count).collect();
            prop_assert_eq!(relay_sequence(&config, count), expected);
        }
    }
}

// ============================================================================
// Stress Tests (opt-in)
// ============================================================================

#[cfg(feature = "stress-tests")]
mod stress_tests {
    use super::*;

    /// Adversarial watermark and batch combinations over a long run.
    #[test]
    fn test_adversarial_configurations() {
        for (low, high, batch) in [(0, 1, 1), (0, 1, 64), (1, 2, 3), (100, 101, 1), (10, 10_000, 512)] {
            let result = run_with_timeout(Duration::from_secs(60), move || {
                let config = QueueConfig::new()
                    .with_batch_size(batch)
                    .with_watermarks(Watermarks::new(low, high).unwrap());
                relay_sequence(&config, 1_000_000).len()
            });
            assert_eq!(
                result.unwrap_or_else(|e| panic!("low={low} high={high} batch={batch}: {e}")),
                1_000_000
            );
        }
    }

    /// Many short-lived queues, each closed right after a handful of pushes.
    #[test]
    fn test_many_short_queues() {
        let result = run_with_timeout(Duration::from_secs(60), || {
            let config = QueueConfig::new().with_batch_size(4);
            (0..10_000).map(|n| relay_sequence(&config, n % 7).len()).sum::<usize>()
        });
        let expected: usize = (0..10_000).map(|n| n % 7).sum();
        assert_eq!(result.unwrap(), expected);
    }
}
