//! Integration tests for `fsort --verify`.

use std::process::Command;
use tempfile::TempDir;

use crate::helpers::write_text;

#[test]
fn test_verify_passes_on_sorted_unique_file() {
    let dir = TempDir::new().unwrap();
    let input = write_text(dir.path(), "sorted.txt", "\napple\nbanana\ncherry\n");

    let status = Command::new(env!("CARGO_BIN_EXE_fsort"))
        .args(["-f", input.to_str().unwrap(), "--verify"])
        .status()
        .expect("Failed to run fsort");
    assert!(status.success());
}

#[test]
fn test_verify_fails_on_duplicates() {
    let dir = TempDir::new().unwrap();
    let input = write_text(dir.path(), "dups.txt", "apple\napple\nbanana\n");

    let output = Command::new(env!("CARGO_BIN_EXE_fsort"))
        .args(["-f", input.to_str().unwrap(), "--verify"])
        .output()
        .expect("Failed to run fsort");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("First violation at line 2"));
}

#[test]
fn test_verify_checks_output_of_sort() {
    let dir = TempDir::new().unwrap();
    let input = write_text(dir.path(), "words.txt", "b\nc\na\nc\n");
    let out = dir.path().join("out.txt");

    let status = Command::new(env!("CARGO_BIN_EXE_fsort"))
        .args(["-f", input.to_str().unwrap(), "-o", out.to_str().unwrap()])
        .status()
        .expect("Failed to run fsort");
    assert!(status.success());

    let unsorted = Command::new(env!("CARGO_BIN_EXE_fsort"))
        .args(["-f", input.to_str().unwrap(), "--verify"])
        .status()
        .expect("Failed to run fsort");
    assert!(!unsorted.success());

    let sorted = Command::new(env!("CARGO_BIN_EXE_fsort"))
        .args(["-f", out.to_str().unwrap(), "--verify"])
        .status()
        .expect("Failed to run fsort");
    assert!(sorted.success());
}
