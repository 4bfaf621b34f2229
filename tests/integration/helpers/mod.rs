//! Helper utilities for integration tests.


pub use text_files::*;

use std::process::{Command, Output};
use std::time::Duration;

/// Run a closure with a timeout. Returns Err if the closure doesn't complete in time.
///
/// A hung queue shows up as a test failure instead of a stuck test binary.
pub fn run_with_timeout<F, T>(timeout: Duration, f: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let result = f();
        let _ = tx.send(result);
    });
    rx.recv_timeout(timeout).map_err(|_| format!("Operation timed out after {timeout:?}"))
}

/// Run the `seqpipe` binary with the given arguments and capture its output.
pub fn run_seqpipe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_seqpipe"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to run seqpipe")
}
