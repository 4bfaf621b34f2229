//! Integration tests for the relay command.

use tempfile::TempDir;

use crate::helpers::{generate_lines, read_lines, run_seqpipe, write_lines};

#[test]
fn test_relay_trims_trailing_whitespace() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    write_lines(&input, &["alpha  ", "beta\t", "", "  gamma"]);

    let result = run_seqpipe(&["relay", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(result.status.success(), "relay failed: {stderr}");

    assert_eq!(read_lines(&output), vec!["alpha", "beta", "", "  gamma"]);
    assert!(stderr.contains("There were 4 lines."), "{stderr}");
}

#[test]
fn test_relay_skip_empty() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    write_lines(&input, &["one", "   ", "", "two "]);

    let result = run_seqpipe(&[
        "relay",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--skip-empty",
    ]);
    assert!(result.status.success());
    assert_eq!(read_lines(&output), vec!["one", "two"]);
}

/// Many lines through tiny, throttled queues come out complete and in order.
#[test]
fn test_relay_large_input_throttled() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    let lines = generate_lines(50_000);
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_lines(&input, &refs);

    let result = run_seqpipe(&[
        "relay",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--batch-size",
        "4",
        "--low-watermark",
        "8",
        "--high-watermark",
        "32",
    ]);
    assert!(result.status.success(), "relay failed: {}", String::from_utf8_lossy(&result.stderr));

    let expected: Vec<String> = lines.iter().map(|l| l.trim_end().to_string()).collect();
    assert_eq!(read_lines(&output), expected);
}

#[test]
fn test_relay_dry_run() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    write_lines(&input, &["a", "b", "c"]);

    let result = run_seqpipe(&[
        "relay",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-n",
    ]);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(result.status.success(), "relay failed: {stderr}");
    assert!(!output.exists(), "dry run must not create the output file");
    assert!(stderr.contains("There were 3 lines."), "{stderr}");
}

#[test]
fn test_relay_missing_input_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let result = run_seqpipe(&[
        "relay",
        "-i",
        dir.path().join("missing.txt").to_str().unwrap(),
        "--dry-run",
    ]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("does not exist"));
}

#[test]
fn test_relay_requires_output_without_dry_run() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let input = dir.path().join("input.txt");
    write_lines(&input, &["a"]);
    assert!(!run_seqpipe(&["relay", "-i", input.to_str().unwrap()]).status.success());
}

/// The stripper stage removes the prefix after cleaning, and the reported
/// stage counts show every line passed through it.
#[test]
fn test_relay_strip_prefix() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    write_lines(&input, &[">read1  ", "ACGT", ">read2", "TTGA\t"]);

    let result = run_seqpipe(&[
        "relay",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--strip-prefix",
        ">",
    ]);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(result.status.success(), "relay failed: {stderr}");
    assert_eq!(read_lines(&output), vec!["read1", "ACGT", "read2", "TTGA"]);
    assert!(stderr.contains("stage 'stripper' finished: 4 items"), "{stderr}");
}
