//! Integration tests for the stress command.

use rstest::rstest;

use crate::helpers::run_seqpipe;

/// The default run pushes 150,000 items and succeeds.
#[test]
fn test_stress_default() {
    let output = run_seqpipe(&["stress"]);
    assert!(output.status.success(), "stress failed: {}", String::from_utf8_lossy(&output.stderr));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Running seqpipe version"));
    assert!(stderr.contains("150,000"), "summary should report the item count: {stderr}");
}

#[rstest]
#[case(&["--batch-size", "1"], true)]
#[case(&["--batch-size", "10", "--low-watermark", "10", "--high-watermark", "10"], false)]
#[case(&["--batch-size", "7", "--low-watermark", "0", "--high-watermark", "1"], true)]
#[case(&["--batch-size", "64", "--low-watermark", "100", "--high-watermark", "1000"], true)]
fn test_stress_queue_options(#[case] extra: &[&str], #[case] expect_success: bool) {
    let mut args = vec!["stress", "--items", "20000"];
    args.extend_from_slice(extra);
    let output = run_seqpipe(&args);

    assert_eq!(
        output.status.success(),
        expect_success,
        "args {args:?}: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_stress_rejects_bad_arguments() {
    assert!(!run_seqpipe(&["stress", "--items", "0"]).status.success());
    assert!(!run_seqpipe(&["stress", "--batch-size", "0"]).status.success());
    assert!(!run_seqpipe(&["stress", "--low-watermark", "5"]).status.success());
    assert!(!run_seqpipe(&["stress", "--low-watermark", "50", "--high-watermark", "5"]).status.success());
}
