//! Integration tests for the `fsort` binary.

use fgoxide::io::DelimFile;
use fsort_lib::metrics::SortMetrics;
use rstest::rstest;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

use crate::helpers::{assert_output_eq, random_lines, sorted_unique, write_inputs, write_text};

fn run_fsort(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fsort"))
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("Failed to run fsort")
}

#[test]
fn test_merges_two_files() {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", "pear\napple\npear\n");
    write_text(dir.path(), "b.txt", "fig\napple");

    let output = run_fsort(dir.path(), &["-f", "a.txt", "-f", "b.txt", "-o", "out.txt"]);
    assert!(output.status.success(), "fsort failed: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "apple\nfig\npear\n"
    );
}

#[test]
fn test_single_dash_long_flags() {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", "b\na\nb\n");

    let output = run_fsort(
        dir.path(),
        &["-file", "a.txt", "-method", "radix", "-maxlen", "10", "-out", "out.txt"],
    );
    assert!(output.status.success(), "fsort failed: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap(), "a\nb\n");
    assert!(!dir.path().join("ut").exists());
}

#[rstest]
#[case::extsort("extsort", "extsort_a_b")]
#[case::radix("radix", "radix_a_b")]
fn test_derived_output_name(#[case] method: &str, #[case] expected: &str) {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", "b\n");
    write_text(dir.path(), "b.txt", "a\na\n");

    let output = run_fsort(dir.path(), &["-f", "a.txt", "-f", "b.txt", "--method", method]);
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(dir.path().join(expected)).unwrap(), "a\nb\n");
}

#[test]
fn test_methods_produce_identical_output() {
    let dir = TempDir::new().unwrap();
    let corpus = random_lines(17, 3_000, 12);
    let inputs = write_inputs(dir.path(), &corpus, 3);
    let mut args: Vec<String> = Vec::new();
    for input in &inputs {
        args.push("-f".to_string());
        args.push(input.to_string_lossy().to_string());
    }

    for (method, extra) in [("radix", vec![]), ("extsort", vec!["-m", "4K", "-t", "3"])] {
        let out = format!("{method}.txt");
        let mut cmd: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd.extend(["--method", method, "-o", out.as_str()]);
        cmd.extend(extra);
        let output = run_fsort(dir.path(), &cmd);
        assert!(output.status.success(), "{method} failed");
    }

    let radix = std::fs::read(dir.path().join("radix.txt")).unwrap();
    let extsort = std::fs::read(dir.path().join("extsort.txt")).unwrap();
    assert_eq!(radix, extsort);
    assert_output_eq(&dir.path().join("extsort.txt"), &sorted_unique(&corpus));
}

#[test]
fn test_maxlen_violation_creates_no_output() {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", &format!("short\n{}\n", "x".repeat(500)));

    let output = run_fsort(dir.path(), &["-f", "a.txt", "--maxlen", "100", "-o", "out.txt"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("out.txt").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("maximum line length"), "unexpected error: {stderr}");
}

#[test]
fn test_missing_input_creates_no_output() {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", "a\n");

    let output = run_fsort(dir.path(), &["-f", "a.txt", "-f", "missing.txt", "-o", "out.txt"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("out.txt").exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.txt"));
}

#[rstest]
#[case::no_inputs(&[])]
#[case::unknown_method(&["-f", "a.txt", "--method", "quicksort"])]
#[case::bad_buffer_size(&["-f", "a.txt", "-m", "lots"])]
#[case::max_open_runs_too_small(&["-f", "a.txt", "--max-open-runs", "1"])]
#[case::zero_threads(&["-f", "a.txt", "-t", "0"])]
fn test_invalid_arguments_fail(#[case] args: &[&str]) {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", "a\n");

    let output = run_fsort(dir.path(), args);
    assert!(!output.status.success());
    assert!(!dir.path().join("extsort_a").exists());
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = run_fsort(dir.path(), &["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("fsort "), "unexpected version output: {stdout}");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_metrics_file() {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", "c\nb\na\nb\n");

    let output = run_fsort(
        dir.path(),
        &["-f", "a.txt", "-o", "out.txt", "-m", "1", "--max-open-runs", "2", "--metrics", "m.tsv"],
    );
    assert!(output.status.success());

    let metrics: Vec<SortMetrics> =
        DelimFile::default().read_tsv(&dir.path().join("m.tsv")).expect("Failed to read metrics");
    assert_eq!(metrics.len(), 1);
    let m = &metrics[0];
    assert_eq!(m.method, "extsort");
    assert_eq!(m.files, 1);
    assert_eq!(m.records_read, 4);
    assert_eq!(m.records_written, 3);
    assert_eq!(m.runs_written, 7);
    assert_eq!(m.compactions, 3);
    assert_eq!(m.write_failures, 0);
}

#[test]
fn test_verbose_logs_progress() {
    let dir = TempDir::new().unwrap();
    write_text(dir.path(), "a.txt", "c\nb\na\nb\n");

    let output = run_fsort(
        dir.path(),
        &["-f", "a.txt", "-o", "out.txt", "--verbose", "--progress-interval", "2"],
    );
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Read 4 lines from a.txt"), "missing per-file log: {stderr}");
    assert!(stderr.contains("Wrote lines 2/2"), "missing progress log: {stderr}");
    assert!(stderr.contains("=== Summary ==="));
}
