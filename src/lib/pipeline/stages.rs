//! Stage bodies that follow the queue shutdown protocol.
//!
//! Each helper is meant to be the whole body of a stage closure handed to
//! [`super::Pipeline::spawn`]. They take the queue handles by value, so the
//! handles drop (closing outputs, disconnecting inputs) however the stage ends.
//! All of them return the number of input items handled.

use anyhow::Result;
use log::debug;

use crate::queue::{Consumer, Producer};

/// Initial stage: push every item, then close.
///
/// Stops early, without error, if the consumer of `output` goes away.
pub fn source<T, I>(items: I, mut output: Producer<T>) -> Result<u64>
where
    I: IntoIterator<Item = T>,
{
    let mut count = 0;
    for item in items {
        if output.is_disconnected() {
            debug!("source: downstream disconnected after {count} items");
            break;
        }
        output.push(item);
        count += 1;
    }
    output.close();
    Ok(count)
}

/// Initial stage over a fallible iterator, e.g. a file reader.
///
/// The first `Err` ends the stage with that error; items pushed before it
/// still reach the consumer, which then sees the queue closed.
pub fn try_source<T, I, E>(items: I, mut output: Producer<T>) -> Result<u64>
where
    I: IntoIterator<Item = std::result::Result<T, E>>,
    E: Into<anyhow::Error>,
{
    let mut count = 0;
    for item in items {
        if output.is_disconnected() {
            debug!("source: downstream disconnected after {count} items");
            break;
        }
        output.push(item.map_err(Into::into)?);
        count += 1;
    }
    output.close();
    Ok(count)
}

/// One-in, one-out stage.
pub fn transform<I, O, F>(mut input: Consumer<I>, mut output: Producer<O>, mut f: F) -> Result<u64>
where
    F: FnMut(I) -> Result<O>,
{
    let mut count = 0;
    while input.is_alive() {
        let item = input.pop_front();
        output.push(f(item)?);
        count += 1;
        if output.is_disconnected() {
            debug!("transform: downstream disconnected after {count} items");
            break;
        }
    }
    output.close();
    Ok(count)
}

/// Like [`transform`], but `f` may drop an item by returning `None`.
pub fn filter_map<I, O, F>(mut input: Consumer<I>, mut output: Producer<O>, mut f: F) -> Result<u64>
where
    F: FnMut(I) -> Result<Option<O>>,
{
    let mut count = 0;
    while input.is_alive() {
        let item = input.pop_front();
        if let Some(out) = f(item)? {
            output.push(out);
        }
        count += 1;
        if output.is_disconnected() {
            debug!("filter_map: downstream disconnected after {count} items");
            break;
        }
    }
    output.close();
    Ok(count)
}

/// Send every input item to each output, then close them all.
///
/// Outputs are independent: each sees the full input in order, and a slow
/// consumer on one output only holds the others back through throttling of
/// its own queue. The last output receives the item itself, the rest clones.
pub fn fan_out<T: Clone>(mut input: Consumer<T>, mut outputs: Vec<Producer<T>>) -> Result<u64> {
    let mut count = 0;
    while input.is_alive() {
        let item = input.pop_front();
        if let Some((last, rest)) = outputs.split_last_mut() {
            for output in rest {
                output.push(item.clone());
            }
            last.push(item);
        }
        count += 1;
        if !outputs.is_empty() && outputs.iter().all(Producer::is_disconnected) {
            debug!("fan_out: all {} outputs disconnected after {count} items", outputs.len());
            break;
        }
    }
    for output in &mut outputs {
        output.close();
    }
    Ok(count)
}

/// Terminal stage: drain `input`, handing each item to `f`.
pub fn sink<T, F>(mut input: Consumer<T>, mut f: F) -> Result<u64>
where
    F: FnMut(T) -> Result<()>,
{
    let mut count = 0;
    while input.is_alive() {
        f(input.pop_front())?;
        count += 1;
    }
    Ok(count)
}
